//! Logical multiplex channel, carried in the top two bits of a frame header.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Mask isolating the channel bits of a header byte.
pub const CHANNEL_MASK: u8 = 0xC0;

/// Mask isolating the payload-length bits of a header byte.
pub const LEN_MASK: u8 = 0x3F;

/// One of four logical channels a frame's header can address. The device is bound
/// to a single channel at construction; frames on any other channel are discarded
/// after being popped off the wire (they still consume their bytes).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum Channel {
    Zero = 0x00,
    One = 0x40,
    Two = 0x80,
    Three = 0xC0,
}

impl Channel {
    /// Extract the channel bits from a header byte, ignoring the length bits.
    pub fn from_header(header: u8) -> Self {
        // infallible: masking leaves one of the four values named above.
        Self::try_from(header & CHANNEL_MASK).unwrap()
    }
}
