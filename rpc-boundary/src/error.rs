use std::collections::HashMap;

use http::StatusCode;
use thiserror::Error;

/// Application-level error classification, independent of the transport
/// code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Internal,
    Unavailable,
    Unauthorized,
    Conflict,
    NotImplemented,
    InvalidArgument,
}

impl ErrorKind {
    /// Stable name, used as the display form of remote errors.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotImplemented => "not_implemented",
            ErrorKind::InvalidArgument => "invalid_argument",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Structured failure detail: a machine-readable reason plus string
/// key/value metadata, attached to the outgoing status when present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorDetails {
    pub reason: String,
    pub metadata: HashMap<String, String>,
}

/// Contract between application error types and the boundary layer.
///
/// Handlers may fail with any error implementing this trait. The audit
/// interceptor reads the optional kind to pick a transport code and the
/// optional details to attach structured detail to the status.
pub trait AppError: std::error::Error + Send + Sync + 'static {
    /// Classification of this failure, if the error carries one.
    fn kind(&self) -> Option<ErrorKind> {
        None
    }

    /// Structured detail, if the error carries any.
    fn details(&self) -> Option<ErrorDetails> {
        None
    }
}

/// The remote side reported a failure of this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct RemoteError {
    kind: ErrorKind,
}

impl RemoteError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl AppError for RemoteError {
    fn kind(&self) -> Option<ErrorKind> {
        Some(self.kind)
    }
}

/// A handler paniced while serving a call.
///
/// Produced only by the panic-containment interceptor; always classified
/// internal.
#[derive(Debug, Clone, Error)]
#[error("{recover_info}")]
pub struct CallPanicedError {
    /// Printed value the handler paniced with.
    pub recover_info: String,
}

impl AppError for CallPanicedError {
    fn kind(&self) -> Option<ErrorKind> {
        Some(ErrorKind::Internal)
    }
}

/// The remote rejected the call arguments as invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("bad request")]
pub struct BadRequestError;

impl BadRequestError {
    /// Status for HTTP-facing adapters layered above the rpc boundary.
    pub const fn http_status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// The connection to the remote service could not be established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("service unreachable")]
pub struct ServiceUnreachableError;

impl ServiceUnreachableError {
    pub const fn http_status(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Errors surfaced by the boundary layer itself.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    CallPaniced(#[from] CallPanicedError),

    #[error(transparent)]
    BadRequest(#[from] BadRequestError),

    #[error(transparent)]
    ServiceUnreachable(#[from] ServiceUnreachableError),

    /// A failing transport status passed through to the caller unmodified.
    #[error(transparent)]
    Status(#[from] tonic::Status),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type BoundaryResult<T> = std::result::Result<T, BoundaryError>;
