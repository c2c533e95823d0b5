use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::oneshot;
use typed_fetch::mock::{create_mock_session, expect_request, MockSession};
use typed_fetch::resource::{HttpMethod, NetworkJsonResource, NetworkResource, QueryItem, Resource};
use typed_fetch::service::{FetchService, ResourceService};
use typed_fetch::transport::{ResponseMeta, TransportError, TransportOutcome};
use typed_fetch::{FetchError, JsonParsingError, NetworkServiceError};

const TEST_URL: &str = "http://test.com";

type StringResource = NetworkJsonResource<String>;

fn string_service(mock: &MockSession) -> FetchService<StringResource> {
    FetchService::new(Arc::new(mock.clone()))
}

fn test_error() -> TransportError {
    TransportError::new("test", 999, "The operation couldn't be completed")
}

/// A resource that can never produce a request.
struct NilRequestResource;

impl Resource for NilRequestResource {
    type Model = String;
}

impl NetworkResource for NilRequestResource {
    fn url(&self) -> &str {
        TEST_URL
    }

    fn build_request(&self) -> Option<typed_fetch::resource::Request> {
        None
    }
}

#[tokio::test]
async fn test_fetch_sends_the_resource_request() {
    let mock = MockSession::new();
    mock.expect_request().return_json(200, serde_json::json!("success"));
    let resource = StringResource::new(TEST_URL)
        .with_method(HttpMethod::Post)
        .with_header("X-Api-Key", "secret")
        .with_query_items([QueryItem::new("a", "1"), QueryItem::new("b", "2")])
        .with_json_body(serde_json::json!({ "name": "Alice" }));

    string_service(&mock).fetch(&resource).await.unwrap();

    assert_eq!(mock.last_request(), resource.build_request());
    let request = mock.last_request().unwrap();
    assert_eq!(request.url.as_str(), "http://test.com/?a=1&b=2");
    assert_eq!(request.method, HttpMethod::Post);
    mock.verify();
}

#[tokio::test]
async fn test_invalid_request_fails_without_calling_transport() {
    let mock = MockSession::new();
    let service: FetchService<NilRequestResource> = FetchService::new(Arc::new(mock.clone()));

    let result = service.fetch(&NilRequestResource).await;

    assert_eq!(
        result,
        Err(FetchError::Network(NetworkServiceError::CouldNotCreateRequest))
    );
    assert!(mock.captured_requests().is_empty());
}

#[tokio::test]
async fn test_malformed_url_fails_without_calling_transport() {
    let mock = MockSession::new();
    let result = string_service(&mock)
        .fetch(&StringResource::new("www.test.com"))
        .await;

    assert_eq!(
        result,
        Err(FetchError::Network(NetworkServiceError::CouldNotCreateRequest))
    );
    assert!(mock.captured_requests().is_empty());
}

#[tokio::test]
async fn test_handled_status_codes_classify_as_status_errors() {
    for status_code in [400, 404, 499, 500, 599] {
        let mock = MockSession::new();
        mock.expect_request().return_outcome(TransportOutcome::new(
            None,
            Some(ResponseMeta::new(status_code)),
            Some(test_error()),
        ));

        let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

        assert_eq!(
            result,
            Err(FetchError::Network(NetworkServiceError::StatusCode(status_code))),
            "status {status_code}"
        );
    }
}

#[tokio::test]
async fn test_unhandled_status_codes_classify_as_networking_errors() {
    for status_code in [300, 399, 600, 601] {
        let mock = MockSession::new();
        mock.expect_request().return_outcome(TransportOutcome::new(
            None,
            Some(ResponseMeta::new(status_code)),
            Some(test_error()),
        ));

        let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

        match result {
            Err(FetchError::Network(NetworkServiceError::Networking(e))) => {
                assert_eq!(e.domain, "test", "status {status_code}");
            }
            other => panic!("status {status_code}: unexpected {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_networking_error_without_response() {
    let mock = MockSession::new();
    mock.expect_request().return_error(test_error());

    let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

    assert_eq!(
        result,
        Err(FetchError::Network(NetworkServiceError::Networking(test_error())))
    );
}

#[tokio::test]
async fn test_no_data() {
    let mock = MockSession::new();
    mock.expect_request().return_outcome(TransportOutcome::empty());

    let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

    assert_eq!(result, Err(FetchError::Network(NetworkServiceError::NoData)));
}

#[tokio::test]
async fn test_success_status_without_body_is_no_data() {
    for code in [200, 204, 304] {
        let mock = MockSession::new();
        mock.expect_request().return_status(code);

        let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

        assert_eq!(
            result,
            Err(FetchError::Network(NetworkServiceError::NoData)),
            "status {code}"
        );
    }
}

#[tokio::test]
async fn test_empty_data_is_invalid_json() {
    let mock = MockSession::new();
    mock.expect_request()
        .return_outcome(TransportOutcome::new(Some(Vec::new()), None, None));

    let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

    assert_eq!(result, Err(FetchError::Json(JsonParsingError::InvalidJsonData)));
}

#[tokio::test]
async fn test_non_json_body_is_invalid_json() {
    let mock = MockSession::new();
    mock.expect_request().return_body(200, "<html>oops</html>");

    let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

    assert_eq!(result, Err(FetchError::Json(JsonParsingError::InvalidJsonData)));
}

#[tokio::test]
async fn test_success_decodes_string_model() {
    let mock = MockSession::new();
    mock.expect_request().return_json(200, serde_json::json!("success"));

    let result = string_service(&mock).fetch(&StringResource::new(TEST_URL)).await;

    assert_eq!(result, Ok("success".to_string()));
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
    tags: Vec<String>,
    manager: Option<Box<User>>,
}

#[tokio::test]
async fn test_success_decodes_struct_field_for_field() {
    let mock = MockSession::new();
    mock.expect_request().return_json(
        200,
        serde_json::json!({
            "id": 7,
            "name": "Alice",
            "tags": ["admin", "ops"],
            "manager": { "id": 1, "name": "Bob", "tags": [], "manager": null }
        }),
    );
    let service: FetchService<NetworkJsonResource<User>> =
        FetchService::new(Arc::new(mock.clone()));

    let user = service
        .fetch(&NetworkJsonResource::new("https://test.com/users/7"))
        .await
        .unwrap();

    assert_eq!(
        user,
        User {
            id: 7,
            name: "Alice".into(),
            tags: vec!["admin".into(), "ops".into()],
            manager: Some(Box::new(User {
                id: 1,
                name: "Bob".into(),
                tags: vec![],
                manager: None,
            })),
        }
    );
}

#[tokio::test]
async fn test_schema_mismatch_is_invalid_json() {
    let mock = MockSession::new();
    mock.expect_request()
        .return_json(200, serde_json::json!({ "id": "not a number" }));
    let service: FetchService<NetworkJsonResource<User>> =
        FetchService::new(Arc::new(mock.clone()));

    let result = service
        .fetch(&NetworkJsonResource::new("https://test.com/users/7"))
        .await;

    assert_eq!(result, Err(FetchError::Json(JsonParsingError::InvalidJsonData)));
}

/// Unwraps `{ "data": ... }` before handing the payload to the model.
struct EnvelopeResource;

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

impl Resource for EnvelopeResource {
    type Model = Vec<u32>;

    fn decode(data: &[u8]) -> Result<Vec<u32>, JsonParsingError> {
        serde_json::from_slice::<Envelope<Vec<u32>>>(data)
            .map(|envelope| envelope.data)
            .map_err(|_| JsonParsingError::InvalidJsonData)
    }
}

impl NetworkResource for EnvelopeResource {
    fn url(&self) -> &str {
        "https://test.com/numbers"
    }
}

#[tokio::test]
async fn test_custom_decode_hook() {
    let mock = MockSession::new();
    mock.expect_request()
        .return_json(200, serde_json::json!({ "data": [1, 2, 3] }));
    let service: FetchService<EnvelopeResource> = FetchService::new(Arc::new(mock.clone()));

    assert_eq!(service.fetch(&EnvelopeResource).await, Ok(vec![1, 2, 3]));
}

#[tokio::test]
async fn test_fetch_with_delivers_exactly_once() {
    let (session, mut receiver) = create_mock_session(1);
    let service: FetchService<StringResource> = FetchService::new(Arc::new(session));
    let (tx, rx) = oneshot::channel();

    let handle = service.fetch_with(StringResource::new(TEST_URL), move |result| {
        let _ = tx.send(result);
    });

    // fetch_with returned before the transport answered.
    let (_request, responder) = expect_request(&mut receiver).await.unwrap();
    responder
        .send(TransportOutcome::with_status(404))
        .unwrap();

    assert_eq!(
        rx.await.unwrap(),
        Err(FetchError::Network(NetworkServiceError::StatusCode(404)))
    );
    handle.await.unwrap();
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_service() {
    let mock = MockSession::new();
    for _ in 0..8 {
        mock.expect_request().return_json(200, serde_json::json!("ok"));
    }
    let service = string_service(&mock);

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .fetch(&StringResource::new(format!("https://test.com/{i}")))
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok("ok".to_string()));
    }
    assert_eq!(mock.captured_requests().len(), 8);
    mock.verify();
}
