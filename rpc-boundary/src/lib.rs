//! RPC boundary layer for tonic services: correlation metadata
//! propagation and validation, bidirectional error-taxonomy translation,
//! per-call audit logging and handler panic containment.

pub mod client;
pub mod config;
pub mod conversions;
pub mod error;
pub mod metadata;
pub mod server;

pub use client::{CallLayer, CallService, RpcClient};
pub use config::{ClientConfig, ServerConfig};
pub use conversions::{error_to_status, kind_from_code, kind_to_code};
pub use error::{
    AppError, BadRequestError, BoundaryError, BoundaryResult, CallPanicedError, ErrorDetails,
    ErrorKind, RemoteError, ServiceUnreachableError,
};
pub use metadata::{CorrelationContext, CorrelationId, CORRELATION_ID_KEY, REQUEST_ID_KEY};
pub use server::{interceptor_stack, CallSpan, RpcServer};
