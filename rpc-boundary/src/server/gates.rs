//! Pre-handler validation gates.
//!
//! Gates reject malformed calls with `InvalidArgument` before any handler
//! work happens. Rejections are client mistakes, not server faults, so
//! they are not logged as errors.

use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tonic::{Request, Response, Status};
use tower::{Layer, Service};
use uuid::Uuid;

use super::trace::CallSpan;
use crate::metadata::{CORRELATION_ID_KEY, REQUEST_ID_KEY};

/// Rejects calls carrying no metadata at all.
#[derive(Debug, Clone, Copy)]
pub struct RequireMetadataLayer;

impl<S> Layer<S> for RequireMetadataLayer {
    type Service = RequireMetadataService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireMetadataService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequireMetadataService<S> {
    inner: S,
}

impl<S, Req, Res> Service<Request<Req>> for RequireMetadataService<S>
where
    S: Service<Request<Req>, Response = Response<Res>, Error = Status> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Req>) -> Self::Future {
        if req.metadata().is_empty() {
            return Box::pin(futures::future::err(Status::invalid_argument(
                "metadata is not provided",
            )));
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

/// Requires one metadata key to hold a UUID value; records the value on
/// the call span before admitting the call.
#[derive(Debug, Clone, Copy)]
pub struct RequireUuidLayer {
    key: &'static str,
    span_field: &'static str,
}

impl RequireUuidLayer {
    /// Gate on the per-hop request id.
    pub fn request_id() -> Self {
        Self {
            key: REQUEST_ID_KEY,
            span_field: "request_id",
        }
    }

    /// Gate on the cross-service correlation id.
    pub fn correlation_id() -> Self {
        Self {
            key: CORRELATION_ID_KEY,
            span_field: "correlation_id",
        }
    }
}

impl<S> Layer<S> for RequireUuidLayer {
    type Service = RequireUuidService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireUuidService {
            inner,
            key: self.key,
            span_field: self.span_field,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequireUuidService<S> {
    inner: S,
    key: &'static str,
    span_field: &'static str,
}

impl<S, Req, Res> Service<Request<Req>> for RequireUuidService<S>
where
    S: Service<Request<Req>, Response = Response<Res>, Error = Status> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Req>) -> Self::Future {
        let value = match req.metadata().get(self.key).and_then(|v| v.to_str().ok()) {
            Some(value) => value.to_owned(),
            None => {
                return Box::pin(futures::future::err(Status::invalid_argument(format!(
                    "metadata {} is not provided",
                    self.key
                ))));
            }
        };

        let parsed = match Uuid::parse_str(&value) {
            Ok(parsed) => parsed,
            Err(_) => {
                return Box::pin(futures::future::err(Status::invalid_argument(format!(
                    "{} is not a valid uuid",
                    self.key
                ))));
            }
        };

        if let Some(CallSpan(span)) = req.extensions().get::<CallSpan>() {
            span.record(self.span_field, tracing::field::display(parsed));
            tracing::info!(parent: span, "found {}", self.key);
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}
