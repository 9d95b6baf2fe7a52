use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid base64 payload: {0}")]
    InvalidEncoding(String),
}
