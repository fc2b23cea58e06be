//! The process-wide context (§9's "collect into a single context value"):
//! everything C1-C10 need beyond the consumed traits in `hal` — ring buffer,
//! test state machine, prompt registration, the 16-slot test registry, and the
//! ESTOP procedure bank — owned by one value the host's tick functions drive.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::Cell;

use crate::channel::Channel;
use crate::codec;
use crate::config::{Config, MAX_CUSTOM_PAYLOAD_LEN, MAX_ESTOP_PROCS, NUM_TEST_SLOTS};
use crate::device_class::DeviceClass;
use crate::error::RcpError;
use crate::estop::Halt;
use crate::frame::{DecodeOutcome, RingBuf};
use crate::hal::{AngledActuatorDriver, Clock, CustomDataHandler, SensorDriver, SerialIo, SimpleActuatorDriver, StepperDriver, SystemReset};
use crate::procedures::{ActiveEstopSlot, EstopProcId, Procedure};
use crate::prompt::{validate_prompt_text, PromptData, PromptDataType, PromptRegistration};
use crate::test_state::{TestStateMachine, TestStateTag};

pub(crate) type BoxProc = Box<dyn Procedure>;

/// Ties together every consumed interface (§6) and all of the protocol's owned
/// state. Generic over the host's concrete trait implementations so the hot
/// path has no dynamic dispatch beyond the procedure trees themselves, which
/// are heterogeneous by nature.
pub struct RcpContext<IO, CLK, SA, ST, AA, SN, CD, RS, H>
where
    IO: SerialIo,
    CLK: Clock,
    SA: SimpleActuatorDriver,
    ST: StepperDriver,
    AA: AngledActuatorDriver,
    SN: SensorDriver,
    CD: CustomDataHandler,
    RS: SystemReset,
    H: Halt,
{
    pub(crate) io: IO,
    pub(crate) clock: CLK,
    pub(crate) simple_actuator: SA,
    pub(crate) stepper: ST,
    pub(crate) angled_actuator: AA,
    pub(crate) sensor: SN,
    pub(crate) custom: CD,
    pub(crate) reset: RS,
    pub(crate) halt: H,
    pub(crate) config: Config,
    pub(crate) rb: RingBuf,
    pub(crate) test_state: TestStateMachine,
    pub(crate) prompt: PromptRegistration,
    pub(crate) registry: [Option<BoxProc>; NUM_TEST_SLOTS],
    pub(crate) estop_bank: [Option<BoxProc>; MAX_ESTOP_PROCS],
    pub(crate) active_estop_slot: ActiveEstopSlot,
    pub(crate) suppress_write_reports: bool,
}

#[allow(clippy::too_many_arguments)]
impl<IO, CLK, SA, ST, AA, SN, CD, RS, H> RcpContext<IO, CLK, SA, ST, AA, SN, CD, RS, H>
where
    IO: SerialIo,
    CLK: Clock,
    SA: SimpleActuatorDriver,
    ST: StepperDriver,
    AA: AngledActuatorDriver,
    SN: SensorDriver,
    CD: CustomDataHandler,
    RS: SystemReset,
    H: Halt,
{
    pub fn new(
        config: Config,
        io: IO,
        clock: CLK,
        simple_actuator: SA,
        stepper: ST,
        angled_actuator: AA,
        sensor: SN,
        custom: CD,
        reset: RS,
        halt: H,
    ) -> Self {
        let mut test_state = TestStateMachine::new();
        test_state.init();
        Self {
            io,
            clock,
            simple_actuator,
            stepper,
            angled_actuator,
            sensor,
            custom,
            reset,
            halt,
            config,
            rb: RingBuf::new(),
            test_state,
            prompt: PromptRegistration::new(),
            registry: core::array::from_fn(|_| None),
            estop_bank: core::array::from_fn(|_| None),
            active_estop_slot: Rc::new(Cell::new(None)),
            suppress_write_reports: false,
        }
    }

    pub fn channel(&self) -> Channel {
        self.config.channel
    }

    pub fn test_state(&self) -> &TestStateMachine {
        &self.test_state
    }

    /// The shared cell `EStopSetterWrapper` instances write into when built for
    /// this context's procedure trees.
    pub fn active_estop_slot(&self) -> ActiveEstopSlot {
        self.active_estop_slot.clone()
    }

    /// Installs the procedure tree run while `testNum == slot`. Out-of-range
    /// slots (`>= NUM_TEST_SLOTS`) are ignored.
    pub fn register_test(&mut self, slot: u8, procedure: BoxProc) {
        if let Some(entry) = self.registry.get_mut(slot as usize) {
            *entry = Some(procedure);
        }
    }

    /// Installs a procedure tree into the ESTOP bank at `id`, so an
    /// `EStopSetterWrapper` can later make it the active ESTOP sequence.
    pub fn register_estop(&mut self, id: EstopProcId, procedure: BoxProc) {
        if let Some(entry) = self.estop_bank.get_mut(id.0 as usize) {
            *entry = Some(procedure);
        }
    }

    pub fn set_suppress_write_reports(&mut self, suppress: bool) {
        self.suppress_write_reports = suppress;
    }

    /// `setReady` (§4.4): updates the ready flag and, only on an actual change,
    /// emits a `TestState` report reflecting it.
    pub fn set_ready(&mut self, ready: bool) {
        if self.test_state.set_ready(ready) {
            self.emit_test_state_report();
        }
    }

    /// `setPrompt` (§4.6): reject oversize text, register the acceptor, and
    /// emit the prompt frame.
    pub fn set_prompt(
        &mut self,
        text: &[u8],
        data_type: PromptDataType,
        acceptor: impl FnMut(PromptData) + 'static,
    ) -> Result<(), RcpError> {
        validate_prompt_text(text)?;
        self.prompt.register(data_type, acceptor);
        codec::encode_prompt_issue(&mut self.io, self.config.channel, data_type.into(), text);
        Ok(())
    }

    /// `resetPrompt` (§4.6): clear any registered acceptor and emit the reset frame.
    pub fn reset_prompt(&mut self) {
        self.prompt.clear();
        codec::encode_prompt_reset(&mut self.io, self.config.channel);
    }

    /// Outbound convenience wrapper emitting a raw `CUSTOM` frame of host data,
    /// rejecting payloads over the wire's 63-byte limit.
    pub fn write_custom_string(&mut self, data: &[u8]) -> Result<(), RcpError> {
        if data.len() > MAX_CUSTOM_PAYLOAD_LEN {
            return Err(RcpError::PayloadTooLong);
        }
        codec::encode_raw(&mut self.io, self.config.channel, DeviceClass::Custom.into(), data);
        Ok(())
    }

    pub(crate) fn now_ms(&mut self) -> u32 {
        self.clock.systime_ms()
    }

    pub(crate) fn millis(&mut self) -> u32 {
        let now = self.now_ms();
        self.test_state.millis(now)
    }

    pub(crate) fn emit_test_state_report(&mut self) {
        let ts = self.millis();
        let byte = self.test_state.status_byte();
        codec::encode_test_state_report(&mut self.io, self.config.channel, ts, byte);
    }

    /// Protocol tick (C1/C2/C3/C5 orchestration): pull up to
    /// `config.serial_bytes_per_loop` bytes, check the heartbeat, decode at most
    /// one frame, and dispatch it.
    pub fn tick_protocol(&mut self) {
        let mut pulled = 0usize;
        while pulled < self.config.serial_bytes_per_loop && self.io.read_avail() > 0 {
            let b = self.io.read();
            self.rb.push(b);
            pulled += 1;
        }

        let now = self.now_ms();
        if self.test_state.heartbeat_expired(now) {
            crate::log::debug!("heartbeat expired, escalating to ESTOP");
            self.estop_and_halt();
        }

        match codec::decode_one(&mut self.rb, self.config.channel) {
            DecodeOutcome::Incomplete => {}
            DecodeOutcome::ChannelMismatch => {
                crate::log::trace!("dropped frame: channel mismatch");
            }
            DecodeOutcome::EstopSentinel => self.estop_and_halt(),
            DecodeOutcome::Frame(frame) => self.dispatch(frame),
        }
    }

    /// Run-test tick (§4.4): advances the selected procedure while `Running`.
    pub fn tick_test(&mut self) {
        if self.test_state.state() != TestStateTag::Running {
            return;
        }
        let idx = self.test_state.test_num() as usize;
        let Some(procedure) = self.registry.get_mut(idx).and_then(|slot| slot.as_mut()) else {
            return;
        };

        if self.test_state.first_run() {
            procedure.initialize();
            self.test_state.clear_first_run();
        }
        procedure.execute();
        if procedure.is_finished() {
            procedure.end(false);
            self.test_state.finish();
            self.emit_test_state_report();
        }
    }
}
