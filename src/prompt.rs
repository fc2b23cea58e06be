//! Prompt subsystem (C8): a single-shot operator question, answered by the host
//! with a 1- or 4-byte payload delivered to a one-shot acceptor.

use alloc::boxed::Box;

use crate::config::MAX_PROMPT_TEXT_LEN;
use crate::error::RcpError;

/// `PROMPT` payload interpretation: boolean GO/NO-GO, or an IEEE-754 float.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive)]
pub enum PromptDataType {
    GoNoGo = 0x00,
    Float = 0x01,
    Reset = 0xFF,
}

/// A delivered prompt response: either a GO/NO-GO boolean or a float, per the
/// last-declared [`PromptDataType`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PromptData {
    GoNoGo(bool),
    Float(f32),
}

type Acceptor = Box<dyn FnMut(PromptData)>;

/// Tracks at most one outstanding prompt acceptor. At any instant at most one is
/// registered; it is consumed on first response.
#[derive(Default)]
pub struct PromptRegistration {
    pending: Option<(PromptDataType, Acceptor)>,
}

impl PromptRegistration {
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Register interest in a response of the given type. The caller (`set_prompt`)
    /// is responsible for emitting the prompt frame; this only tracks the acceptor.
    pub fn register(&mut self, data_type: PromptDataType, acceptor: impl FnMut(PromptData) + 'static) {
        self.pending = Some((data_type, Box::new(acceptor)));
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_registered(&self) -> bool {
        self.pending.is_some()
    }

    /// Interpret an inbound `PROMPT` frame's payload according to the registered
    /// type, invoke the acceptor exactly once, and clear the registration. Returns
    /// false (leaving nothing to clear) if no acceptor was registered.
    pub fn deliver(&mut self, payload: &[u8]) -> bool {
        let Some((data_type, mut acceptor)) = self.pending.take() else {
            return false;
        };
        let data = match data_type {
            PromptDataType::GoNoGo | PromptDataType::Reset => {
                PromptData::GoNoGo(payload.first().copied().unwrap_or(0) != 0)
            }
            PromptDataType::Float => {
                let mut bytes = [0u8; 4];
                let n = payload.len().min(4);
                bytes[..n].copy_from_slice(&payload[..n]);
                PromptData::Float(f32::from_ne_bytes(bytes))
            }
        };
        acceptor(data);
        true
    }
}

/// Validate prompt text length per the 62-byte wire limit (`len+1 <= 63`).
pub fn validate_prompt_text(text: &[u8]) -> Result<(), RcpError> {
    if text.len() > MAX_PROMPT_TEXT_LEN {
        Err(RcpError::TextTooLong)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn delivers_go_nogo_once_then_is_idle() {
        let received = Rc::new(RefCell::new(None));
        let received2 = received.clone();
        let mut reg = PromptRegistration::new();
        reg.register(PromptDataType::GoNoGo, move |d| *received2.borrow_mut() = Some(d));
        assert!(reg.is_registered());
        assert!(reg.deliver(&[0x01, 0, 0, 0]));
        assert_eq!(*received.borrow(), Some(PromptData::GoNoGo(true)));
        assert!(!reg.is_registered());
        // second delivery with no acceptor registered: ignored
        assert!(!reg.deliver(&[0x01]));
    }

    #[test]
    fn delivers_float_as_native_bytes() {
        let received = Rc::new(RefCell::new(None));
        let received2 = received.clone();
        let mut reg = PromptRegistration::new();
        reg.register(PromptDataType::Float, move |d| *received2.borrow_mut() = Some(d));
        let bytes = 3.5_f32.to_ne_bytes();
        assert!(reg.deliver(&bytes));
        assert_eq!(*received.borrow(), Some(PromptData::Float(3.5)));
    }

    #[test]
    fn no_acceptor_registered_is_ignored() {
        let mut reg = PromptRegistration::new();
        assert!(!reg.deliver(&[1, 2, 3, 4]));
    }

    #[test]
    fn oversize_text_is_rejected() {
        let text = [b'x'; MAX_PROMPT_TEXT_LEN + 1];
        assert_eq!(validate_prompt_text(&text), Err(RcpError::TextTooLong));
        let text = [b'x'; MAX_PROMPT_TEXT_LEN];
        assert_eq!(validate_prompt_text(&text), Ok(()));
    }
}
