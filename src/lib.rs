//! Target-side implementation of RCP (Rocket Control Protocol): a compact binary
//! command-and-telemetry protocol between a ground host and an embedded device that
//! drives actuators, reads sensors, and runs test procedures.
//!
//! The core is split across the modules below, following the protocol's own
//! component breakdown: a ring buffer and frame codec decode inbound packets, a
//! dispatcher routes them to per-device-class handling, a test state machine tracks
//! run state and heartbeat liveness, a prompt subsystem services single-shot
//! operator questions, an ESTOP engine runs a terminal shutdown sequence, and a set
//! of procedure combinators express test and ESTOP sequences as trees.
//!
//! Everything that isn't protocol logic — the serial transport, the clock, the
//! hardware drivers, the custom-payload handler, the reset primitive — is consumed
//! through traits in [`hal`], so this crate has no opinion on what's plugged into a
//! given target and can be exercised against mocks on the host.

#![cfg_attr(not(test), no_std)]
#[cfg(test)]
extern crate std;

extern crate alloc;

pub mod channel;
pub mod codec;
pub mod config;
pub mod context;
pub mod device_class;
pub mod dispatcher;
pub mod error;
pub mod estop;
pub mod frame;
pub mod hal;
pub(crate) mod log;
pub mod prompt;
pub mod ring_buffer;
pub mod test_state;

pub use channel::Channel;
pub use config::Config;
pub use context::RcpContext;
pub use device_class::DeviceClass;
pub use error::RcpError;
pub use estop::{Halt, SpinHalt};
pub use test_state::{TestStateMachine, TestStateTag};

/// Combinators (`Sequential`, `Parallel`, `Selector`, ...) that compose test and
/// ESTOP procedures into trees.
pub mod procedures;
pub use procedures::Procedure;
