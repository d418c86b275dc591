//! Audit logging and error translation around the handler.

use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tonic::{Request, Response, Status};
use tower::{Layer, Service};

use super::panic::HandlerFault;
use crate::conversions::error_to_status;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct AuditLayer;

impl<S> Layer<S> for AuditLayer {
    type Service = AuditService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditService { inner }
    }
}

/// Logs every call outcome and translates handler faults into transport
/// statuses. The caller only ever observes the translated status, never
/// the original error value.
#[derive(Debug, Clone)]
pub struct AuditService<S> {
    inner: S,
}

impl<S, Req, Res, E> Service<Request<Req>> for AuditService<S>
where
    S: Service<Request<Req>, Response = Response<Res>, Error = HandlerFault<E>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    E: AppError,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = Status;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(|fault| error_to_status(&fault))
    }

    fn call(&mut self, req: Request<Req>) -> Self::Future {
        let mut inner = self.inner.clone();
        Box::pin(async move {
            match inner.call(req).await {
                Ok(response) => {
                    tracing::info!("rpc call succeeded");
                    Ok(response)
                }
                Err(fault) => {
                    let status = error_to_status(&fault);
                    tracing::error!(
                        code = ?status.code(),
                        error = %status.message(),
                        "rpc call failed"
                    );
                    Err(status)
                }
            }
        })
    }
}
