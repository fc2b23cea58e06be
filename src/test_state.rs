//! Test state machine (C7): test number, run state, data-streaming flag, ready
//! flag, and heartbeat timer. Owns none of the procedures themselves — those live
//! in the test registry the host embedding `RcpContext` holds — only the state
//! that governs which one runs and whether the link is considered alive.

use num_enum::{IntoPrimitive, TryFromPrimitive};

const STATE_MASK: u8 = 0x60;
const DATA_STREAM_BIT: u8 = 0x80;
const READY_BIT: u8 = 0x10;
const HEARTBEAT_MASK: u8 = 0x0F;

/// Run state, carried in bits 5:6 of the `TestState` report byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum TestStateTag {
    Running = 0x00,
    Stopped = 0x20,
    Paused = 0x40,
    Estop = 0x60,
}

/// The protocol's run-state and liveness bookkeeping.
pub struct TestStateMachine {
    state: TestStateTag,
    test_num: u8,
    data_streaming: bool,
    ready: bool,
    /// 4-bit heartbeat period in milliseconds; 0 disables liveness checking.
    heartbeat_time: u8,
    last_heartbeat_received: u32,
    time_offset: u32,
    /// Set when a test has just been started (or just finished); cleared once
    /// the run-test tick has called `initialize` on the newly-selected procedure.
    first_run: bool,
    initialized: bool,
}

impl TestStateMachine {
    pub const fn new() -> Self {
        Self {
            state: TestStateTag::Stopped,
            test_num: 0,
            data_streaming: false,
            ready: false,
            heartbeat_time: 0,
            last_heartbeat_received: 0,
            time_offset: 0,
            first_run: true,
            initialized: false,
        }
    }

    /// Reset to the documented post-`init` state: `Stopped`, `testNum=0`,
    /// streaming off, heartbeat disabled, ready off, `timeOffset=0`.
    pub fn init(&mut self) {
        *self = Self::new();
        self.initialized = true;
    }

    pub fn state(&self) -> TestStateTag {
        self.state
    }

    pub fn test_num(&self) -> u8 {
        self.test_num
    }

    pub fn data_streaming(&self) -> bool {
        self.data_streaming
    }

    pub fn ready(&self) -> bool {
        self.ready
    }

    pub fn first_run(&self) -> bool {
        self.first_run
    }

    pub fn clear_first_run(&mut self) {
        self.first_run = false;
    }

    /// Single data byte of a `TestState` report: state bits, heartbeat period in
    /// the low nibble, data-streaming and ready flags. `testNum` is never encoded
    /// here — see the open question in the design notes.
    pub fn status_byte(&self) -> u8 {
        (self.state as u8 & STATE_MASK)
            | (self.heartbeat_time & HEARTBEAT_MASK)
            | if self.data_streaming { DATA_STREAM_BIT } else { 0 }
            | if self.ready { READY_BIT } else { 0 }
    }

    /// `start,n`: honored only from `Stopped`. Returns true if the transition
    /// happened.
    pub fn start(&mut self, test_num: u8) -> bool {
        if self.state != TestStateTag::Stopped {
            return false;
        }
        self.test_num = test_num & 0x0F;
        self.state = TestStateTag::Running;
        self.first_run = true;
        true
    }

    /// `stop`: honored from `Running` or `Paused`. Returns true if the transition
    /// happened; the caller is responsible for ending the active procedure with
    /// `interrupted=true` before (or as part of) acting on this.
    pub fn stop(&mut self) -> bool {
        if !matches!(self.state, TestStateTag::Running | TestStateTag::Paused) {
            return false;
        }
        self.state = TestStateTag::Stopped;
        true
    }

    /// Run-test tick finished the active procedure naturally: `Running -> Stopped`,
    /// `first_run` is re-armed for the next `start`.
    pub fn finish(&mut self) {
        self.state = TestStateTag::Stopped;
        self.first_run = true;
    }

    /// `pause`: toggles `Running <-> Paused`; ignored in any other state. Returns
    /// true if the toggle happened.
    pub fn toggle_pause(&mut self) -> bool {
        match self.state {
            TestStateTag::Running => {
                self.state = TestStateTag::Paused;
                true
            }
            TestStateTag::Paused => {
                self.state = TestStateTag::Running;
                true
            }
            _ => false,
        }
    }

    pub fn enter_estop(&mut self) {
        self.state = TestStateTag::Estop;
    }

    pub fn set_data_streaming(&mut self, on: bool) {
        self.data_streaming = on;
    }

    /// No-op unless initialized and the value actually changes. Returns true if a
    /// `TestState` report should be emitted as a result.
    pub fn set_ready(&mut self, new_ready: bool) -> bool {
        if !self.initialized || self.ready == new_ready {
            return false;
        }
        self.ready = new_ready;
        true
    }

    /// Low nibble of a heartbeat-control frame: `0x0F` acknowledges a beat, any
    /// other value sets the period (0 disables the check).
    pub fn handle_heartbeat_control(&mut self, low_nibble: u8, now_ms: u32) {
        if low_nibble == 0x0F {
            self.last_heartbeat_received = now_ms;
        } else {
            self.heartbeat_time = low_nibble & HEARTBEAT_MASK;
        }
    }

    pub fn heartbeat_expired(&self, now_ms: u32) -> bool {
        self.heartbeat_time != 0
            && now_ms.wrapping_sub(self.last_heartbeat_received) > self.heartbeat_time as u32
    }

    pub fn reset_time(&mut self, now_ms: u32) {
        self.time_offset = now_ms;
    }

    /// `millis() = systime() - timeOffset`.
    pub fn millis(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.time_offset)
    }
}

impl Default for TestStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_only_honored_from_stopped() {
        let mut ts = TestStateMachine::new();
        ts.init();
        assert!(ts.start(3));
        assert_eq!(ts.state(), TestStateTag::Running);
        assert_eq!(ts.test_num(), 3);
        // already running: a second start is ignored
        assert!(!ts.start(7));
        assert_eq!(ts.test_num(), 3);
    }

    #[test]
    fn pause_toggles_between_running_and_paused() {
        let mut ts = TestStateMachine::new();
        ts.init();
        ts.start(1);
        assert!(ts.toggle_pause());
        assert_eq!(ts.state(), TestStateTag::Paused);
        assert!(ts.toggle_pause());
        assert_eq!(ts.state(), TestStateTag::Running);
    }

    #[test]
    fn pause_ignored_when_stopped() {
        let mut ts = TestStateMachine::new();
        ts.init();
        assert!(!ts.toggle_pause());
        assert_eq!(ts.state(), TestStateTag::Stopped);
    }

    #[test]
    fn status_byte_never_encodes_test_num() {
        let mut ts = TestStateMachine::new();
        ts.init();
        ts.start(9);
        let without_num = ts.status_byte();
        let mut other = TestStateMachine::new();
        other.init();
        other.start(2);
        assert_eq!(without_num, other.status_byte());
    }

    #[test]
    fn set_ready_is_noop_without_change() {
        let mut ts = TestStateMachine::new();
        ts.init();
        assert!(!ts.set_ready(false)); // already false
        assert!(ts.set_ready(true));
        assert!(!ts.set_ready(true)); // unchanged
    }

    #[test]
    fn heartbeat_zero_disables_check() {
        let ts = TestStateMachine::new();
        assert!(!ts.heartbeat_expired(1_000_000));
    }

    #[test]
    fn heartbeat_ack_resets_the_window() {
        let mut ts = TestStateMachine::new();
        ts.init();
        ts.handle_heartbeat_control(0x05, 0); // period = 5ms
        ts.handle_heartbeat_control(0x0F, 10); // ack at t=10
        assert!(!ts.heartbeat_expired(14));
        assert!(ts.heartbeat_expired(16));
    }

    #[test]
    fn reset_time_zeroes_millis() {
        let mut ts = TestStateMachine::new();
        ts.reset_time(5_000);
        assert_eq!(ts.millis(5_000), 0);
        assert_eq!(ts.millis(5_100), 100);
    }
}
