//! Per-call tracing setup.

use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tonic::{Request, Response, Status};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Handle to the call-scoped span, stored in the request extensions so
/// inner stages and the handler can attach fields and events to it.
#[derive(Clone)]
pub struct CallSpan(pub tracing::Span);

/// Outermost interceptor: creates the call-scoped span, tagged with a
/// fresh call id and the invoked method. Never fails.
#[derive(Debug, Clone)]
pub struct TraceLayer {
    method: &'static str,
}

impl TraceLayer {
    pub fn new(method: &'static str) -> Self {
        Self { method }
    }
}

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService {
            inner,
            method: self.method,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceService<S> {
    inner: S,
    method: &'static str,
}

impl<S, Req, Res> Service<Request<Req>> for TraceService<S>
where
    S: Service<Request<Req>, Response = Response<Res>, Error = Status> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Req>) -> Self::Future {
        let span = tracing::info_span!(
            "rpc_call",
            call_id = %Uuid::new_v4(),
            method = self.method,
            request_id = tracing::field::Empty,
            correlation_id = tracing::field::Empty,
        );
        req.extensions_mut().insert(CallSpan(span.clone()));

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await }.instrument(span))
    }
}
