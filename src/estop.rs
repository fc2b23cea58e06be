//! ESTOP engine (C9): the terminal shutdown sequence, triggered by the inbound
//! zero-length sentinel, a heartbeat timeout, or a direct call. Idempotent
//! (re-entering once already in `Estop` is a no-op) and non-recoverable: the
//! only way out is a full device reset.

use crate::context::RcpContext;
use crate::hal::{AngledActuatorDriver, Clock, CustomDataHandler, SensorDriver, SerialIo, SimpleActuatorDriver, StepperDriver, SystemReset};
use crate::procedures::Procedure;
use crate::test_state::TestStateTag;

/// The final halt primitive run once the ESTOP sequence completes. On a real
/// target this is an infinite loop (optionally kicking a watchdog or sitting in
/// a low-power state) ahead of a hardware reset; it never returns.
pub trait Halt {
    fn halt(&mut self) -> !;
}

/// A `Halt` that spins forever — the default fail-safe loop when a target has
/// nothing more specific to do after ESTOP.
#[derive(Default)]
pub struct SpinHalt;

impl Halt for SpinHalt {
    fn halt(&mut self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

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
    /// Direct `ESTOP()` call (§4.5c): runs the sequence and halts. Never returns.
    pub fn estop_now(&mut self) -> ! {
        self.estop_and_halt()
    }

    pub(crate) fn estop_and_halt(&mut self) -> ! {
        self.estop();
        self.halt.halt()
    }

    /// Runs the ESTOP sequence itself, without halting: end the active
    /// procedure if one is running or paused, enter the terminal state, emit a
    /// final `TestState` report, then run the registered ESTOP procedure (if
    /// any) to completion. The caller halts immediately afterward.
    pub(crate) fn estop(&mut self) {
        if self.test_state.state() == TestStateTag::Estop {
            return;
        }
        crate::log::debug!("entering ESTOP");

        if matches!(self.test_state.state(), TestStateTag::Running | TestStateTag::Paused) {
            let idx = self.test_state.test_num() as usize;
            if let Some(procedure) = self.registry.get_mut(idx).and_then(|slot| slot.as_mut()) {
                procedure.end(true);
            }
        }

        self.test_state.enter_estop();
        self.emit_test_state_report();

        if let Some(id) = self.active_estop_slot.get() {
            if let Some(procedure) = self.estop_bank.get_mut(id.0 as usize).and_then(|slot| slot.as_mut()) {
                procedure.initialize();
                while !procedure.is_finished() {
                    procedure.execute();
                }
                procedure.end(false);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::Halt;

    /// Panics instead of looping, so host tests can observe "ESTOP reached the
    /// halt" with `std::panic::catch_unwind` instead of hanging the test runner.
    #[derive(Default)]
    pub struct PanicHalt;

    impl Halt for PanicHalt {
        fn halt(&mut self) -> ! {
            panic!("halt() reached in test")
        }
    }
}
