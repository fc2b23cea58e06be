//! Frame codec (C5): decodes one inbound frame per call from the ring buffer, and
//! encodes the outbound report/prompt frames named in the wire spec.

use heapless::Vec as HVec;

use crate::channel::{Channel, LEN_MASK};
use crate::frame::{DecodeOutcome, Frame, RingBuf, MAX_FRAME_LEN};
use crate::hal::SerialIo;

/// Attempt to decode exactly one frame from `buf`, per the protocol's per-tick rule
/// of decoding at most one frame. `channel` is the channel this device is bound to.
pub fn decode_one(buf: &mut RingBuf, channel: Channel) -> DecodeOutcome {
    if buf.is_empty() {
        return DecodeOutcome::Incomplete;
    }

    let header = buf.peek(0).expect("just checked non-empty");
    let len = (header & crate::channel::LEN_MASK) as usize;

    if len == 0 {
        buf.pop(); // consume the sentinel header byte
        return DecodeOutcome::EstopSentinel;
    }

    if buf.size() < len + 2 {
        return DecodeOutcome::Incomplete;
    }

    let mut raw: HVec<u8, MAX_FRAME_LEN> = HVec::new();
    for _ in 0..(len + 2) {
        let b = buf.pop().expect("size checked above");
        let _ = raw.push(b);
    }

    let frame_channel = Channel::from_header(raw[0]);
    if frame_channel != channel {
        return DecodeOutcome::ChannelMismatch;
    }

    let device_class = raw[1];
    let mut payload: HVec<u8, { LEN_MASK as usize }> = HVec::new();
    for &b in &raw[2..len + 2] {
        let _ = payload.push(b);
    }

    DecodeOutcome::Frame(Frame {
        channel: frame_channel,
        device_class,
        payload,
    })
}

/// Capacity of the outbound scratch buffer: header + devclass + longest payload
/// (a 62-byte prompt text plus its type byte).
const OUT_BUF_CAP: usize = 2 + 63;

type OutBuf = HVec<u8, OUT_BUF_CAP>;

fn header_byte(channel: Channel, payload_len: usize) -> u8 {
    channel as u8 | (payload_len as u8 & crate::channel::LEN_MASK)
}

fn write_frame(io: &mut impl SerialIo, channel: Channel, device_class: u8, body: &[u8]) {
    let mut buf: OutBuf = HVec::new();
    let _ = buf.push(header_byte(channel, body.len()));
    let _ = buf.push(device_class);
    let _ = buf.extend_from_slice(body);
    io.write(&buf);
}

/// `TestState` report: `TS(4) · state-byte(1)`.
pub fn encode_test_state_report(io: &mut impl SerialIo, channel: Channel, timestamp_ms: u32, state_byte: u8) {
    let mut body: HVec<u8, 5> = HVec::new();
    let _ = body.extend_from_slice(&timestamp_ms.to_be_bytes());
    let _ = body.push(state_byte);
    write_frame(io, channel, 0x00, &body);
}

/// Simple-actuator reply: `TS(4) · id(1) · state(1)`.
pub fn encode_simple_actuator_reply(io: &mut impl SerialIo, channel: Channel, timestamp_ms: u32, id: u8, state_byte: u8) {
    let mut body: HVec<u8, 6> = HVec::new();
    let _ = body.extend_from_slice(&timestamp_ms.to_be_bytes());
    let _ = body.push(id);
    let _ = body.push(state_byte);
    write_frame(io, channel, 0x01, &body);
}

/// Prompt issue: `type(1) · UTF-8 text`. Caller has already checked `text.len() <= 62`.
pub fn encode_prompt_issue(io: &mut impl SerialIo, channel: Channel, prompt_type: u8, text: &[u8]) {
    let mut body: HVec<u8, 63> = HVec::new();
    let _ = body.push(prompt_type);
    let _ = body.extend_from_slice(text);
    write_frame(io, channel, 0x03, &body);
}

/// Prompt reset: a single `0xFF` byte.
pub fn encode_prompt_reset(io: &mut impl SerialIo, channel: Channel) {
    write_frame(io, channel, 0x03, &[0xFF]);
}

/// Raw bytes on the `CUSTOM` class, or any other string-shaped reply: no
/// timestamp, no id, just the payload. Caller must ensure `data.len() <= 63`.
pub fn encode_raw(io: &mut impl SerialIo, channel: Channel, device_class: u8, data: &[u8]) {
    write_frame(io, channel, device_class, data);
}

/// One-float report: `TS(4) · id(1) · f32(4)`.
pub fn encode_one_float(io: &mut impl SerialIo, channel: Channel, device_class: u8, timestamp_ms: u32, id: u8, value: f32) {
    let mut body: HVec<u8, 9> = HVec::new();
    let _ = body.extend_from_slice(&timestamp_ms.to_be_bytes());
    let _ = body.push(id);
    let _ = body.extend_from_slice(&value.to_ne_bytes());
    write_frame(io, channel, device_class, &body);
}

/// Two-float report: `TS(4) · id(1) · 2·f32(8)`.
pub fn encode_two_float(io: &mut impl SerialIo, channel: Channel, device_class: u8, timestamp_ms: u32, id: u8, values: [f32; 2]) {
    let mut body: HVec<u8, 13> = HVec::new();
    let _ = body.extend_from_slice(&timestamp_ms.to_be_bytes());
    let _ = body.push(id);
    for v in values {
        let _ = body.extend_from_slice(&v.to_ne_bytes());
    }
    write_frame(io, channel, device_class, &body);
}

/// Three-float report: `TS(4) · id(1) · 3·f32(12)`.
pub fn encode_three_float(io: &mut impl SerialIo, channel: Channel, device_class: u8, timestamp_ms: u32, id: u8, values: [f32; 3]) {
    let mut body: HVec<u8, 17> = HVec::new();
    let _ = body.extend_from_slice(&timestamp_ms.to_be_bytes());
    let _ = body.push(id);
    for v in values {
        let _ = body.extend_from_slice(&v.to_ne_bytes());
    }
    write_frame(io, channel, device_class, &body);
}

/// Four-float report: `TS(4) · id(1) · 4·f32(16)`.
pub fn encode_four_float(io: &mut impl SerialIo, channel: Channel, device_class: u8, timestamp_ms: u32, id: u8, values: [f32; 4]) {
    let mut body: HVec<u8, 21> = HVec::new();
    let _ = body.extend_from_slice(&timestamp_ms.to_be_bytes());
    let _ = body.push(id);
    for v in values {
        let _ = body.extend_from_slice(&v.to_ne_bytes());
    }
    write_frame(io, channel, device_class, &body);
}

/// Bool-sensor report: `TS(4) · id(1) · (0x80 or 0x00)`.
pub fn encode_bool_sensor(io: &mut impl SerialIo, channel: Channel, device_class: u8, timestamp_ms: u32, id: u8, value: bool) {
    let mut body: HVec<u8, 6> = HVec::new();
    let _ = body.extend_from_slice(&timestamp_ms.to_be_bytes());
    let _ = body.push(id);
    let _ = body.push(if value { 0x80 } else { 0x00 });
    write_frame(io, channel, device_class, &body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockIo;
    use crate::ring_buffer::RingBuffer;

    #[test]
    fn decode_waits_for_full_frame() {
        let mut rb: RingBuffer<128> = RingBuffer::new();
        rb.push(0x03); // channel 0, len 3
        rb.push(0x00); // devclass
        rb.push(0xAA);
        // only 2 of the 3 payload bytes present
        match decode_one(&mut rb, Channel::Zero) {
            DecodeOutcome::Incomplete => {}
            _ => panic!("expected Incomplete"),
        }
        rb.push(0xBB);
        rb.push(0xCC);
        match decode_one(&mut rb, Channel::Zero) {
            DecodeOutcome::Frame(f) => {
                assert_eq!(f.device_class, 0x00);
                assert_eq!(&f.payload[..], &[0xAA, 0xBB, 0xCC]);
            }
            _ => panic!("expected Frame"),
        }
    }

    #[test]
    fn zero_length_header_is_estop_sentinel() {
        let mut rb: RingBuffer<128> = RingBuffer::new();
        rb.push(0x00);
        match decode_one(&mut rb, Channel::Zero) {
            DecodeOutcome::EstopSentinel => {}
            _ => panic!("expected EstopSentinel"),
        }
    }

    #[test]
    fn channel_mismatch_still_consumes_the_frame() {
        let mut rb: RingBuffer<128> = RingBuffer::new();
        rb.push(0x41); // channel One, len 1
        rb.push(0x00);
        rb.push(0x30);
        match decode_one(&mut rb, Channel::Zero) {
            DecodeOutcome::ChannelMismatch => {}
            _ => panic!("expected ChannelMismatch"),
        }
        assert!(rb.is_empty());
    }

    #[test]
    fn test_state_report_layout() {
        let mut io = MockIo::default();
        encode_test_state_report(&mut io, Channel::Zero, 0x01020304, 0x20);
        assert_eq!(io.outbound, [0x05, 0x00, 0x01, 0x02, 0x03, 0x04, 0x20]);
    }

    #[test]
    fn one_float_round_trips_bit_exact() {
        let mut io = MockIo::default();
        let value = 12345.678_f32;
        encode_one_float(&mut io, Channel::Zero, 0x04, 0, 7, value);
        // header, devclass, TS(4), id, then the 4 float bytes
        let float_bytes = &io.outbound[7..11];
        assert_eq!(f32::from_ne_bytes(float_bytes.try_into().unwrap()), value);
    }
}
