//! Integration tests for the client-side call interceptor and the
//! connection wrapper.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tonic::metadata::MetadataMap;
use tonic::{Code, Request, Response, Status};
use tower::{service_fn, Layer, ServiceExt};
use uuid::Uuid;

use rpc_boundary::client::{CallLayer, RpcClient};
use rpc_boundary::config::ClientConfig;
use rpc_boundary::error::BoundaryError;
use rpc_boundary::metadata::{CorrelationId, CORRELATION_ID_KEY, REQUEST_ID_KEY};

/// Inner service that records the metadata it saw and answers with a
/// fixed outcome.
fn recording_service(
    seen: Arc<Mutex<Vec<MetadataMap>>>,
    outcome: Result<(), Status>,
) -> impl tower::Service<
    Request<()>,
    Response = Response<()>,
    Error = Status,
    Future = futures::future::BoxFuture<'static, Result<Response<()>, Status>>,
> + Clone {
    service_fn(move |req: Request<()>| {
        let seen = seen.clone();
        let outcome = outcome.clone();
        let fut: futures::future::BoxFuture<'static, Result<Response<()>, Status>> =
            Box::pin(async move {
                seen.lock().unwrap().push(req.metadata().clone());
                outcome.map(Response::new)
            });
        fut
    })
}

#[tokio::test]
async fn stamps_fresh_request_id_and_caller_correlation() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let service = CallLayer::new(Duration::from_secs(1))
        .layer(recording_service(seen.clone(), Ok(())));

    let correlation = Uuid::new_v4().to_string();
    let mut request = Request::new(());
    request
        .extensions_mut()
        .insert(CorrelationId(correlation.clone()));

    service.oneshot(request).await.unwrap();

    let seen = seen.lock().unwrap();
    let metadata = &seen[0];
    assert_eq!(
        metadata.get(CORRELATION_ID_KEY).unwrap().to_str().unwrap(),
        correlation
    );
    let request_id = metadata.get(REQUEST_ID_KEY).unwrap().to_str().unwrap();
    Uuid::parse_str(request_id).expect("request id is a uuid");
}

#[tokio::test]
async fn missing_correlation_is_stamped_empty() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let service = CallLayer::new(Duration::from_secs(1))
        .layer(recording_service(seen.clone(), Ok(())));

    service.oneshot(Request::new(())).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen[0].get(CORRELATION_ID_KEY).unwrap().to_str().unwrap(),
        ""
    );
}

#[tokio::test]
async fn request_ids_differ_between_calls() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let layer = CallLayer::new(Duration::from_secs(1));

    for _ in 0..2 {
        let service = layer.layer(recording_service(seen.clone(), Ok(())));
        service.oneshot(Request::new(())).await.unwrap();
    }

    let seen = seen.lock().unwrap();
    let first = seen[0].get(REQUEST_ID_KEY).unwrap().to_str().unwrap();
    let second = seen[1].get(REQUEST_ID_KEY).unwrap().to_str().unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn reclassifies_invalid_argument_as_bad_request() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let service = CallLayer::new(Duration::from_secs(1)).layer(recording_service(
        seen,
        Err(Status::invalid_argument("name must not be empty")),
    ));

    let err = service.oneshot(Request::new(())).await.unwrap_err();
    assert!(matches!(err, BoundaryError::BadRequest(_)));
}

#[tokio::test]
async fn passes_other_failures_through_unmodified() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let service = CallLayer::new(Duration::from_secs(1))
        .layer(recording_service(seen, Err(Status::unavailable("backend down"))));

    let err = service.oneshot(Request::new(())).await.unwrap_err();
    match err {
        BoundaryError::Status(status) => {
            assert_eq!(status.code(), Code::Unavailable);
            assert_eq!(status.message(), "backend down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn deadline_bounds_the_call() {
    let service = CallLayer::new(Duration::from_millis(20)).layer(service_fn(
        |_req: Request<()>| async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, Status>(Response::new(()))
        },
    ));

    let err = service.oneshot(Request::new(())).await.unwrap_err();
    match err {
        BoundaryError::Status(status) => assert_eq!(status.code(), Code::DeadlineExceeded),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_reports_service_unreachable() {
    let mut client = RpcClient::new(ClientConfig {
        url: "http://127.0.0.1:1".to_string(),
        call_timeout: Duration::from_millis(200),
    });

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, BoundaryError::ServiceUnreachable(_)));
}
