//! Tunable constants, per the table in the RCP wire spec's external-interfaces section.

/// Number of bytes pulled from the I/O adapter per protocol tick, at most.
pub const SERIAL_BYTES_PER_LOOP: usize = 20;

/// Capacity, in bytes, of the inbound ring buffer (C1).
pub const RCP_SERIAL_BUFFER_SIZE: usize = 128;

/// Number of procedure slots in the test registry.
pub const NUM_TEST_SLOTS: usize = 16;

/// Number of logical channels in the header's top two bits.
pub const NUM_CHANNELS: usize = 4;

/// Longest prompt text `set_prompt` will accept, in bytes.
pub const MAX_PROMPT_TEXT_LEN: usize = 62;

/// Longest custom payload a single CUSTOM frame can carry.
pub const MAX_CUSTOM_PAYLOAD_LEN: usize = 63;

/// Number of ESTOP procedure trees an [`crate::RcpContext`] can hold at once.
/// Not named by the wire spec (the original source holds a single raw pointer);
/// bounded here so `EStopSetterWrapper` can switch between a handful of
/// pre-registered trees without an allocator-backed map.
pub const MAX_ESTOP_PROCS: usize = 4;

/// Runtime-overridable configuration for an [`crate::RcpContext`].
///
/// The defaults match the values above; tests that want a smaller ring buffer (to
/// exercise overflow and partial-frame behavior cheaply) construct a [`Config`]
/// directly instead of touching the constants used on a real target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub serial_bytes_per_loop: usize,
    pub channel: crate::channel::Channel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial_bytes_per_loop: SERIAL_BYTES_PER_LOOP,
            channel: crate::channel::Channel::Zero,
        }
    }
}
