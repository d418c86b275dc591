//! Wire metadata for call correlation.
//!
//! Two identifiers accompany every call: a correlation id threading a
//! multi-hop request across services, and a request id unique to one hop.

use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::Status;
use uuid::Uuid;

/// Metadata key threading a multi-hop request across services.
pub const CORRELATION_ID_KEY: &str = "correlation-id";

/// Metadata key identifying a single rpc hop.
pub const REQUEST_ID_KEY: &str = "request-id";

/// Caller-supplied correlation identifier.
///
/// Threaded through outgoing requests as a typed extension; absence means
/// the caller is the origin of the request chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

/// Identifier pair attached to every outbound call.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    /// Caller's correlation id, empty when the caller supplied none.
    pub correlation_id: String,
    /// Fresh identifier for this hop.
    pub request_id: Uuid,
}

impl CorrelationContext {
    /// Build the per-call context. The request id is always freshly
    /// generated.
    pub fn new(correlation: Option<&CorrelationId>) -> Self {
        Self {
            correlation_id: correlation.map(|c| c.0.clone()).unwrap_or_default(),
            request_id: Uuid::new_v4(),
        }
    }

    /// Stamp both identifiers onto outgoing call metadata.
    pub fn stamp(&self, metadata: &mut MetadataMap) -> Result<(), Status> {
        let correlation = MetadataValue::try_from(self.correlation_id.as_str())
            .map_err(|_| Status::invalid_argument("correlation-id is not a valid metadata value"))?;
        let request = MetadataValue::try_from(self.request_id.to_string())
            .map_err(|_| Status::invalid_argument("request-id is not a valid metadata value"))?;

        metadata.insert(CORRELATION_ID_KEY, correlation);
        metadata.insert(REQUEST_ID_KEY, request);
        Ok(())
    }
}
