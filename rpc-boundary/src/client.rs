//! Client-side call interceptor and connection wrapper.

use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Response, Status};
use tower::{Layer, Service};

use crate::config::ClientConfig;
use crate::error::{BadRequestError, BoundaryError, BoundaryResult, ServiceUnreachableError};
use crate::metadata::{CorrelationContext, CorrelationId};

/// Decorates every outbound call with a bounded deadline and correlation
/// metadata, and reclassifies argument rejections into the local taxonomy.
#[derive(Debug, Clone)]
pub struct CallLayer {
    timeout: Duration,
}

impl CallLayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for CallLayer {
    type Service = CallService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CallService {
            inner,
            timeout: self.timeout,
        }
    }
}

/// Per-call behavior: the deadline bounds both metadata preparation and
/// the call itself; a `request-id` is freshly generated per attempt and
/// the caller's [`CorrelationId`] extension (empty when absent) rides
/// along as metadata. An `InvalidArgument` response collapses to
/// [`BadRequestError`]; every other failure passes through unmodified.
#[derive(Debug, Clone)]
pub struct CallService<S> {
    inner: S,
    timeout: Duration,
}

impl<S, Req, Res> Service<Request<Req>> for CallService<S>
where
    S: Service<Request<Req>, Response = Response<Res>, Error = Status> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = BoundaryError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BoundaryError::from)
    }

    fn call(&mut self, mut req: Request<Req>) -> Self::Future {
        let mut inner = self.inner.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let outcome = tokio::time::timeout(timeout, async move {
                let correlation = req.extensions().get::<CorrelationId>().cloned();
                let context = CorrelationContext::new(correlation.as_ref());
                context.stamp(req.metadata_mut())?;

                tokio::time::timeout(timeout, inner.call(req))
                    .await
                    .unwrap_or_else(|_| {
                        Err(Status::deadline_exceeded("rpc call deadline exceeded"))
                    })
            })
            .await
            .unwrap_or_else(|_| Err(Status::deadline_exceeded("rpc call deadline exceeded")));

            match outcome {
                Ok(response) => Ok(response),
                Err(status) if status.code() == Code::InvalidArgument => {
                    Err(BoundaryError::BadRequest(BadRequestError))
                }
                Err(status) => Err(BoundaryError::Status(status)),
            }
        })
    }
}

/// Lazily connected rpc client endpoint.
///
/// The channel is cached after the first successful dial; tonic channels
/// reconnect internally, so a cached channel is reused as-is.
#[derive(Clone)]
pub struct RpcClient {
    url: String,
    call_timeout: Duration,
    channel: Option<Channel>,
}

impl RpcClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            url: config.url,
            call_timeout: config.call_timeout,
            channel: None,
        }
    }

    /// Establish the underlying channel, reusing one that already exists.
    ///
    /// A dial failure is logged and reported as
    /// [`ServiceUnreachableError`], distinct from any per-call failure.
    pub async fn connect(&mut self) -> BoundaryResult<Channel> {
        if let Some(channel) = &self.channel {
            return Ok(channel.clone());
        }

        let endpoint = Endpoint::from_shared(self.url.clone()).map_err(|err| {
            tracing::error!(url = %self.url, error = %err, "invalid rpc endpoint");
            BoundaryError::from(ServiceUnreachableError)
        })?;

        let channel = endpoint
            .connect_timeout(self.call_timeout)
            .connect()
            .await
            .map_err(|err| {
                tracing::error!(url = %self.url, error = %err, "rpc connect failed");
                BoundaryError::from(ServiceUnreachableError)
            })?;

        self.channel = Some(channel.clone());
        Ok(channel)
    }

    /// Per-call interceptor configured with this client's timeout.
    pub fn call_layer(&self) -> CallLayer {
        CallLayer::new(self.call_timeout)
    }
}
