//! A decoded inbound frame: header byte, device-class byte, and payload, per
//! `[hdr, devclass, payload...]`.

use heapless::Vec as HVec;

use crate::channel::{Channel, LEN_MASK};
use crate::config::RCP_SERIAL_BUFFER_SIZE;

/// A fully-popped frame, ready for dispatch. Payload length is `header & 0x3F`,
/// bounded to [0, 63] by construction.
pub struct Frame {
    pub channel: Channel,
    /// Raw device-class byte. Unrecognized values are dispatched as "unknown" and
    /// ignored rather than rejected at decode time, per the spec's error model.
    pub device_class: u8,
    pub payload: HVec<u8, { LEN_MASK as usize }>,
}

impl Frame {
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// What one decode attempt against the ring buffer produced.
pub enum DecodeOutcome {
    /// No frame is ready yet; await more bytes.
    Incomplete,
    /// A zero-length header (the ESTOP sentinel) was observed and consumed.
    EstopSentinel,
    /// A frame was popped but its channel didn't match the bound channel.
    ChannelMismatch,
    /// A frame was popped, matched the bound channel, and is ready to dispatch.
    Frame(Frame),
}

/// Upper bound on total bytes in any frame (`2 + 63`), used for the scratch copy
/// in `decode_one`.
pub const MAX_FRAME_LEN: usize = 2 + LEN_MASK as usize;

pub(crate) type RingBuf = crate::ring_buffer::RingBuffer<RCP_SERIAL_BUFFER_SIZE>;
