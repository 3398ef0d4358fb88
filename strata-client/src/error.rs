/// Error types for the StrataDB client
use thiserror::Error;
use tonic::Status;

use crate::session::SearchOutcome;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Expression construction failed before any network interaction.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// The record's type was never registered with the schema registry.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// Envelope type identifier does not match the expected record type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Envelope bytes could not be decoded as the identified type.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The service rejected the submitted schema set; nothing was changed.
    #[error("schema set rejected: {0}")]
    SchemaRejected(String),

    /// A session method was called in a state that forbids it.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// The service violated the stream protocol (strict mode only).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The stream ended before every query index was marked finished.
    #[error("incomplete results for query indices {unfinished:?}")]
    IncompleteResults { unfinished: Vec<u32> },

    /// The stream failed mid-flight. Results accumulated before the failure
    /// are preserved in `partial`.
    #[error("stream failed: {source}")]
    StreamFailed {
        source: Box<ClientError>,
        partial: SearchOutcome,
    },

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("server unavailable: {0}")]
    Unavailable(String),

    #[error("request timeout: {0}")]
    Timeout(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("internal server error: {0}")]
    InternalError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Convert gRPC Status to ClientError
impl From<Status> for ClientError {
    fn from(status: Status) -> Self {
        let msg = status.message().to_string();

        match status.code() {
            tonic::Code::InvalidArgument => ClientError::InvalidArgument(msg),
            tonic::Code::PermissionDenied => ClientError::PermissionDenied(msg),
            tonic::Code::Unauthenticated => ClientError::PermissionDenied(msg),
            tonic::Code::Unavailable => ClientError::Unavailable(msg),
            tonic::Code::DeadlineExceeded => ClientError::Timeout(msg),
            tonic::Code::ResourceExhausted => ClientError::ResourceExhausted(msg),
            tonic::Code::Internal => ClientError::InternalError(msg),
            _ => ClientError::Unknown(msg),
        }
    }
}
