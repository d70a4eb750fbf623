//! # REST API Interface Layer
//!
//! HTTP endpoints for the payment resource. Handlers translate between HTTP
//! and the storage port; they hold no state of their own beyond the injected
//! `AppState`.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | [`health`] |
//! | `GET /v1/payments/` | [`list_payments`] |
//! | `POST /v1/payments/` | [`create_payment`] |
//! | `GET /v1/payments/{id}/` | [`get_payment`] |
//! | `PUT /v1/payments/{id}/` | [`update_payment`] |
//! | `DELETE /v1/payments/{id}/` | [`delete_payment`] |
//!
//! Every error response carries only the canonical status text. Storage
//! failures are logged here and never serialized to the client.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use shared::{PaymentResource, PaymentsPage};
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::Config;
use crate::db::{PaymentStore, StorageError};
use crate::domain::PaymentSummary;
use crate::id::{IdError, PaymentId};
use crate::mappers::{PaymentMapper, RequestBodyError};
use crate::pagination::{self, PageQuery};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PaymentStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn PaymentStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] IdError),
    #[error("unreadable path: {0}")]
    UnreadablePath(#[from] PathRejection),
    #[error("malformed request body: {0}")]
    MalformedRequestBody(#[from] RequestBodyError),
    #[error("payment not found")]
    RecordAbsent,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedIdentifier(_)
            | ApiError::UnreadablePath(_)
            | ApiError::RecordAbsent => StatusCode::NOT_FOUND,
            ApiError::MalformedRequestBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Storage(e) = &self {
            error!("Storage failure: {}", e);
        } else {
            info!("Rejected request: {}", self);
        }
        let text = status.canonical_reason().unwrap_or("Error");
        (status, text).into_response()
    }
}

/// Raw query pairs in request order. Repeated keys are kept, so a query
/// string never fails to extract.
type QueryPairs = Query<Vec<(String, String)>>;

fn first_param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// The payment id from the path. A segment axum cannot decode is as
/// unaddressable as one that is not an identifier.
fn payment_id(path: Result<Path<String>, PathRejection>) -> Result<PaymentId, ApiError> {
    let Path(id) = path?;
    Ok(PaymentId::parse(&id)?)
}

/// Create the Axum router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let timeout = TimeoutLayer::new(state.config.request_timeout());

    Router::new()
        .route("/", get(health))
        .route("/v1/payments", get(list_payments).post(create_payment))
        .route("/v1/payments/", get(list_payments).post(create_payment))
        .route(
            "/v1/payments/:id",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
        .route(
            "/v1/payments/:id/",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
        .layer(timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
pub async fn health() -> &'static str {
    "OK"
}

/// GET /v1/payments/
pub async fn list_payments(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Json<PaymentsPage>, ApiError> {
    info!("GET /v1/payments/ - query: {:?}", pairs);

    let page_query = PageQuery::new(first_param(&pairs, "count"), first_param(&pairs, "after"))?;
    let page = pagination::fetch_page(state.store.as_ref(), &state.config, &page_query).await?;

    Ok(Json(page))
}

/// POST /v1/payments/
pub async fn create_payment(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    info!("POST /v1/payments/");

    let (organisation_id, attributes) = PaymentMapper::from_request(&body)?;
    let id = state.store.insert(&organisation_id, &attributes).await?;
    info!("Created payment {}", id);

    let summary = PaymentMapper::to_summary_resource(&state.config, PaymentSummary { id });
    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

/// GET /v1/payments/{id}/
pub async fn get_payment(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<PaymentResource>, ApiError> {
    let id = payment_id(path)?;
    info!("GET /v1/payments/{}/", id);

    let payment = state.store.get_by_id(id).await?.ok_or(ApiError::RecordAbsent)?;

    Ok(Json(PaymentMapper::to_resource(&state.config, payment)))
}

/// PUT /v1/payments/{id}/
///
/// The id is checked before the body, so an unknown payment is a 404 even
/// when the body is malformed.
pub async fn update_payment(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = payment_id(path)?;
    info!("PUT /v1/payments/{}/", id);

    ensure_exists(state.store.as_ref(), id).await?;

    let (organisation_id, attributes) = PaymentMapper::from_request(&body)?;
    state.store.update(id, &organisation_id, &attributes).await?;
    info!("Updated payment {}", id);

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/payments/{id}/
pub async fn delete_payment(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = payment_id(path)?;
    info!("DELETE /v1/payments/{}/", id);

    ensure_exists(state.store.as_ref(), id).await?;

    state.store.delete(id).await?;
    info!("Deleted payment {}", id);

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_exists(store: &dyn PaymentStore, id: PaymentId) -> Result<(), ApiError> {
    match store.get_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::RecordAbsent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbConnection, StorageResult};
    use crate::domain::fixtures::sample_attributes;
    use crate::domain::{Payment, PaymentAttributes};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SAMPLE_ID: &str = "5cdd382e9549af35c3b94301";

    /// Store whose every operation fails like a dropped connection
    struct FailingStore;

    #[async_trait]
    impl PaymentStore for FailingStore {
        async fn list(&self, _: usize, _: Option<PaymentId>) -> StorageResult<Vec<PaymentSummary>> {
            Err(StorageError::Unavailable(sqlx::Error::Protocol("noooo".to_string())))
        }

        async fn get_by_id(&self, _: PaymentId) -> StorageResult<Option<Payment>> {
            Err(StorageError::Unavailable(sqlx::Error::Protocol("noooo".to_string())))
        }

        async fn insert(&self, _: &str, _: &PaymentAttributes) -> StorageResult<PaymentId> {
            Err(StorageError::Unavailable(sqlx::Error::Protocol("noooo".to_string())))
        }

        async fn update(&self, _: PaymentId, _: &str, _: &PaymentAttributes) -> StorageResult<()> {
            Err(StorageError::Unavailable(sqlx::Error::Protocol("noooo".to_string())))
        }

        async fn delete(&self, _: PaymentId) -> StorageResult<()> {
            Err(StorageError::Unavailable(sqlx::Error::Protocol("noooo".to_string())))
        }
    }

    /// Helper to create a router over a fresh in-memory database
    async fn setup_test_app() -> (Router, DbConnection) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let state = AppState::new(Arc::new(db.clone()), Config::default());
        (create_router(state), db)
    }

    fn failing_app() -> Router {
        create_router(AppState::new(Arc::new(FailingStore), Config::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn as_json(body: &str) -> Value {
        serde_json::from_str(body).expect("Response is not JSON")
    }

    async fn create(app: &Router, body: Value) -> String {
        let (status, response) = send(app, "POST", "/v1/payments/", Some(&body.to_string())).await;
        assert_eq!(status, StatusCode::CREATED);
        as_json(&response)["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = setup_test_app().await;

        let (status, body) = send(&app, "GET", "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_health_rejects_other_methods() {
        let (app, _) = setup_test_app().await;

        let (status, _) = send(&app, "POST", "/", None).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (app, _) = setup_test_app().await;

        for uri in ["/v1/payments/", "/v1/payments/?count=0", "/v1/payments/?count=-1"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                as_json(&body),
                json!({"data": [], "links": {"self": "http://example.com/v1/payments/?count=10", "next": null}})
            );
        }
    }

    #[tokio::test]
    async fn test_list_echoes_count_and_after() {
        let (app, _) = setup_test_app().await;

        let (status, body) = send(&app, "GET", &format!("/v1/payments/?count=20&after={}", SAMPLE_ID), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            as_json(&body),
            json!({"data": [], "links": {
                "self": format!("http://example.com/v1/payments/?count=20&after={}", SAMPLE_ID),
                "next": null
            }})
        );
    }

    #[tokio::test]
    async fn test_list_with_malformed_cursor_is_not_found() {
        let (app, _) = setup_test_app().await;

        let (status, body) = send(&app, "GET", "/v1/payments/?after=nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Not Found"));
    }

    #[tokio::test]
    async fn test_list_takes_first_of_repeated_params() {
        let (app, _) = setup_test_app().await;
        create(&app, json!({"organisation_id": "org"})).await;
        create(&app, json!({"organisation_id": "org"})).await;

        let (status, body) = send(&app, "GET", "/v1/payments/?count=1&count=2", None).await;

        assert_eq!(status, StatusCode::OK);
        let page = as_json(&body);
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
        assert_eq!(page["links"]["self"], "http://example.com/v1/payments/?count=1");
    }

    #[tokio::test]
    async fn test_list_tolerates_odd_query_strings() {
        let (app, _) = setup_test_app().await;

        for uri in ["/v1/payments/?count=%FF", "/v1/payments/?count", "/v1/payments/?&&=x"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(as_json(&body)["links"]["self"], "http://example.com/v1/payments/?count=10");
        }
    }

    #[tokio::test]
    async fn test_list_pages_through_payments() {
        let (app, _) = setup_test_app().await;
        let first = create(&app, json!({"organisation_id": "org"})).await;
        let second = create(&app, json!({"organisation_id": "org"})).await;

        let (status, body) = send(&app, "GET", "/v1/payments/?count=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            as_json(&body),
            json!({
                "data": [{"id": first, "links": {"self": format!("http://example.com/v1/payments/{}/", first)}}],
                "links": {
                    "self": "http://example.com/v1/payments/?count=1",
                    "next": format!("http://example.com/v1/payments/?count=1&after={}", first)
                }
            })
        );

        let (status, body) = send(&app, "GET", &format!("/v1/payments/?count=1&after={}", first), None).await;
        assert_eq!(status, StatusCode::OK);
        let page = as_json(&body);
        assert_eq!(page["data"], json!([{"id": second, "links": {"self": format!("http://example.com/v1/payments/{}/", second)}}]));
        assert_eq!(page["links"]["next"], Value::Null);
    }

    #[tokio::test]
    async fn test_get_unknown_payment() {
        let (app, _) = setup_test_app().await;

        let well_formed = format!("/v1/payments/{}/", SAMPLE_ID);
        for uri in ["/v1/payments/non-existing-id", well_formed.as_str()] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body.contains("Not Found"));
        }
    }

    #[tokio::test]
    async fn test_undecodable_path_id_is_not_found() {
        let (app, _) = setup_test_app().await;

        for method in ["GET", "PUT", "DELETE"] {
            let (status, body) = send(&app, method, "/v1/payments/%FF%FE/", Some("{}")).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", method);
            assert_eq!(body, "Not Found");
        }
    }

    #[tokio::test]
    async fn test_get_payment_resource() {
        let (app, db) = setup_test_app().await;
        let id = db.insert("743d5b63-8e6f-432e-a8fa-c5d8d2ee5fcb", &sample_attributes()).await.unwrap();

        let (status, body) = send(&app, "GET", &format!("/v1/payments/{}/", id), None).await;

        assert_eq!(status, StatusCode::OK);
        let expected = json!({
            "id": id.to_hex(),
            "organisation_id": "743d5b63-8e6f-432e-a8fa-c5d8d2ee5fcb",
            "version": 0,
            "type": "Payment",
            "links": {"self": format!("http://example.com/v1/payments/{}/", id)},
            "attributes": {
                "amount": "100.21",
                "beneficiary_party": {
                    "account_name": "W Owens",
                    "account_number": "31926819",
                    "account_number_code": "BBAN",
                    "account_type": 0,
                    "address": "1 The Beneficiary Localtown SE2",
                    "bank_id": "403000",
                    "bank_id_code": "GBDSC",
                    "name": "Wilfred Jeremiah Owens"
                },
                "charges_information": {
                    "bearer_code": "SHAR",
                    "receiver_charges_amount": "1.00",
                    "receiver_charges_currency": "USD",
                    "sender_charges": [
                        {"amount": "5.00", "currency": "GBP"},
                        {"amount": "10.00", "currency": "USD"}
                    ]
                },
                "currency": "GBP",
                "debtor_party": {
                    "account_name": "EJ Brown Black",
                    "account_number": "GB29XABC10161234567801",
                    "account_number_code": "IBAN",
                    "account_type": 0,
                    "address": "10 Debtor Crescent Sourcetown NE1",
                    "bank_id": "203301",
                    "bank_id_code": "GBDSC",
                    "name": "Emelia Jane Brown"
                },
                "end_to_end_reference": "Wil piano Jan",
                "fx": {
                    "contract_reference": "FX123",
                    "exchange_rate": "2.00000",
                    "original_amount": "200.42",
                    "original_currency": "USD"
                },
                "numeric_reference": "1002001",
                "payment_id": "123456789012345678",
                "payment_purpose": "Paying for goods/services",
                "payment_scheme": "FPS",
                "payment_type": "Credit",
                "processing_date": "2017-01-18",
                "reference": "Payment for Em's piano lessons",
                "scheme_payment_sub_type": "InternetBanking",
                "scheme_payment_type": "ImmediatePayment",
                "sponsor_party": {
                    "account_number": "56781234",
                    "bank_id": "123123",
                    "bank_id_code": "GBDSC"
                }
            }
        });
        assert_eq!(as_json(&body), expected);
    }

    #[tokio::test]
    async fn test_create_returns_summary() {
        let (app, db) = setup_test_app().await;

        let (status, body) = send(&app, "POST", "/v1/payments", Some("{}")).await;

        assert_eq!(status, StatusCode::CREATED);
        let created = as_json(&body);
        let id = PaymentId::parse(created["id"].as_str().unwrap()).unwrap();
        assert_eq!(created["links"]["self"], format!("http://example.com/v1/payments/{}/", id));
        assert!(db.get_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_body() {
        let (app, db) = setup_test_app().await;

        let (status, body) = send(&app, "POST", "/v1/payments/", Some("{")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Bad Request"));
        assert!(db.list(10, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_payment() {
        let (app, _) = setup_test_app().await;

        let (status, body) = send(&app, "PUT", "/v1/payments/non-existing-id", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Not Found"));

        let (status, _) = send(&app, "PUT", &format!("/v1/payments/{}/", SAMPLE_ID), Some("{")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_body() {
        let (app, db) = setup_test_app().await;
        let id = db.insert("org", &sample_attributes()).await.unwrap();

        let (status, _) = send(&app, "PUT", &format!("/v1/payments/{}", id), Some("{")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(db.get_by_id(id).await.unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_update_replaces_payment() {
        let (app, db) = setup_test_app().await;
        let id = db.insert("org", &sample_attributes()).await.unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/v1/payments/{}/", id),
            Some(r#"{"organisation_id": "org2", "attributes": {"amount": "1.00"}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        let payment = db.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(payment.version, 1);
        assert_eq!(payment.organisation_id, "org2");
        assert_eq!(
            payment.attributes,
            PaymentAttributes {
                amount: "1.00".to_string(),
                ..PaymentAttributes::default()
            }
        );
    }

    #[tokio::test]
    async fn test_delete_unknown_payment() {
        let (app, _) = setup_test_app().await;

        let (status, body) = send(&app, "DELETE", "/v1/payments/non-existing-id", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Not Found"));
    }

    #[tokio::test]
    async fn test_delete_payment() {
        let (app, db) = setup_test_app().await;
        let id = db.insert("org", &sample_attributes()).await.unwrap();

        let (status, body) = send(&app, "DELETE", &format!("/v1/payments/{}/", id), Some("{}")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = send(&app, "DELETE", &format!("/v1/payments/{}/", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payment_lifecycle() {
        let (app, _) = setup_test_app().await;
        let id = create(&app, json!({"organisation_id": "org", "attributes": {"currency": "GBP"}})).await;
        let uri = format!("/v1/payments/{}/", id);

        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let payment = as_json(&body);
        assert_eq!(payment["version"], 0);
        assert_eq!(payment["organisation_id"], "org");
        assert_eq!(payment["attributes"]["currency"], "GBP");

        let (status, _) = send(&app, "PUT", &uri, Some(r#"{"organisation_id": "org2"}"#)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let payment = as_json(&body);
        assert_eq!(payment["version"], 1);
        assert_eq!(payment["organisation_id"], "org2");
        assert_eq!(payment["attributes"]["currency"], "");

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_storage_failures_hide_details() {
        let app = failing_app();
        let item = format!("/v1/payments/{}/", SAMPLE_ID);
        let requests = [
            ("GET", "/v1/payments/", None),
            ("GET", item.as_str(), None),
            ("POST", "/v1/payments/", Some("{}")),
            ("PUT", item.as_str(), Some("{}")),
            ("DELETE", item.as_str(), None),
        ];

        for (method, uri, body) in requests {
            let (status, response) = send(&app, method, uri, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, uri);
            assert_eq!(response, "Internal Server Error");
            assert!(!response.contains("noooo"));
        }
    }
}
