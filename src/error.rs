//! Typed errors at the protocol's two validating API boundaries.
//!
//! Everything on the wire path is either silently dropped or escalates to ESTOP —
//! see `dispatcher` and `estop` — and never surfaces a `Result`. These two calls
//! (`set_prompt`, `write_custom_string`) are direct host API calls rather than wire
//! input, so they reject oversize arguments up front instead of truncating.

/// Errors returned by the host-facing boundary calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RcpError {
    /// `set_prompt` text exceeded [`crate::config::MAX_PROMPT_TEXT_LEN`] bytes.
    TextTooLong,
    /// A custom payload exceeded [`crate::config::MAX_CUSTOM_PAYLOAD_LEN`] bytes.
    PayloadTooLong,
}
