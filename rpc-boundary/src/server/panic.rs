//! Panic containment around the application handler.
//!
//! The innermost interceptor. A handler defect must surface as a normal
//! error so the rest of the chain can finish unwinding, log the failure
//! and answer the caller; it must never take the server task down.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::FutureExt;
use tonic::{Request, Response};
use tower::{Layer, Service};

use crate::error::{AppError, CallPanicedError, ErrorDetails, ErrorKind};

/// Outcome of a supervised handler invocation: the handler's own error,
/// or a contained panic.
#[derive(Debug)]
pub enum HandlerFault<E> {
    App(E),
    Paniced(CallPanicedError),
}

impl<E: AppError> std::fmt::Display for HandlerFault<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerFault::App(err) => std::fmt::Display::fmt(err, f),
            HandlerFault::Paniced(err) => err.fmt(f),
        }
    }
}

impl<E: AppError> std::error::Error for HandlerFault<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerFault::App(err) => Some(err),
            HandlerFault::Paniced(err) => Some(err),
        }
    }
}

impl<E: AppError> AppError for HandlerFault<E> {
    fn kind(&self) -> Option<ErrorKind> {
        match self {
            HandlerFault::App(err) => err.kind(),
            HandlerFault::Paniced(err) => err.kind(),
        }
    }

    fn details(&self) -> Option<ErrorDetails> {
        match self {
            HandlerFault::App(err) => err.details(),
            HandlerFault::Paniced(_) => None,
        }
    }
}

/// Supervises the handler future and converts an unwind into a
/// `CallPanicedError`.
#[derive(Debug, Clone, Copy)]
pub struct CatchPanicLayer;

impl<S> Layer<S> for CatchPanicLayer {
    type Service = CatchPanicService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CatchPanicService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct CatchPanicService<S> {
    inner: S,
}

impl<S, Req, Res, E> Service<Request<Req>> for CatchPanicService<S>
where
    S: Service<Request<Req>, Response = Response<Res>, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    E: AppError,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = HandlerFault<E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(HandlerFault::App)
    }

    fn call(&mut self, req: Request<Req>) -> Self::Future {
        let mut inner = self.inner.clone();
        Box::pin(async move {
            match AssertUnwindSafe(async move { inner.call(req).await })
                .catch_unwind()
                .await
            {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(err)) => Err(HandlerFault::App(err)),
                Err(panic) => {
                    let recover_info = panic_message(panic);
                    tracing::info!(recover_info = %recover_info, "recovered from panic");
                    Err(HandlerFault::Paniced(CallPanicedError { recover_info }))
                }
            }
        })
    }
}

/// Render a panic payload the way `panic!` would print it.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unhandled panic".to_string()
    }
}
