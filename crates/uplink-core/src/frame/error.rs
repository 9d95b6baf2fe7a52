use thiserror::Error;

/// Errors returned by [`ByteCursor`](super::ByteCursor).
///
/// The parser converts every variant into a stop condition; callers of the
/// crate never see these directly.
///
/// # Examples
/// ```
/// use uplink_core::frame::error::CursorError;
///
/// let err = CursorError::Underrun { needed: 2, actual: 1 };
/// assert!(err.to_string().contains("underrun"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("frame underrun: need {needed} bytes, {actual} remaining")]
    Underrun { needed: usize, actual: usize },
}
