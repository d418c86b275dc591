//! Server-side interceptor chain.
//!
//! Six independent stages compose around each unary handler, outermost
//! first: tracing setup, metadata presence, request-id validation,
//! correlation-id validation, audit/error translation, panic containment.
//! Failure at any stage short-circuits everything inside it; validation
//! runs before the handler, and a recovered panic is still logged and
//! translated like any other handler error.

mod audit;
mod gates;
mod panic;
mod trace;

pub use audit::{AuditLayer, AuditService};
pub use gates::{
    RequireMetadataLayer, RequireMetadataService, RequireUuidLayer, RequireUuidService,
};
pub use panic::{CatchPanicLayer, CatchPanicService, HandlerFault};
pub use trace::{CallSpan, TraceLayer, TraceService};

use std::net::SocketAddr;

use tonic::transport::server::Router;
use tower::Layer;

use crate::config::ServerConfig;
use crate::error::BoundaryResult;

/// The fully composed interceptor stack around a handler service.
pub type BoundaryStack<S> = TraceService<
    RequireMetadataService<
        RequireUuidService<RequireUuidService<AuditService<CatchPanicService<S>>>>,
    >,
>;

/// Compose the interceptor chain around a unary handler.
///
/// The handler is any `tower::Service` taking `tonic::Request<Req>` and
/// failing with an [`crate::error::AppError`]. Build the stack once per
/// method at startup and clone it per call; no stage shares mutable state
/// across calls.
pub fn interceptor_stack<S>(method: &'static str, handler: S) -> BoundaryStack<S> {
    let svc = CatchPanicLayer.layer(handler);
    let svc = AuditLayer.layer(svc);
    let svc = RequireUuidLayer::correlation_id().layer(svc);
    let svc = RequireUuidLayer::request_id().layer(svc);
    let svc = RequireMetadataLayer.layer(svc);
    TraceLayer::new(method).layer(svc)
}

/// Thin serve wrapper: binds the configured port and serves a
/// caller-assembled tonic router.
#[derive(Debug)]
pub struct RpcServer {
    config: ServerConfig,
}

impl RpcServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self, router: Router) -> BoundaryResult<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!(%addr, "starting rpc server");
        router.serve(addr).await?;
        Ok(())
    }
}
