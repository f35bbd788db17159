//! REST API handlers for the record service
//!
//! Thin mapping layer: each handler parses the request, delegates to the
//! coordinator, and converts the result into a status code and JSON
//! body. No storage logic lives here.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::Error;
use crate::models::{SearchFilter, StudentFields};

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Success message body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Error body with a machine-readable kind
///
/// `kind` distinguishes partial failures from plain persistence
/// failures, so an inconsistent outcome is never an anonymous 500.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::MalformedInput(_) | Error::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Persistence { .. } | Error::Partial { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(kind = err.kind(), "{err}");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind: err.kind(),
        }),
    )
        .into_response()
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/students", post(create_student))
        .route(
            "/students/{student_id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/class/{student_id}", get(get_class))
        .route("/grade-level/{student_id}", get(get_grade_level))
        .route("/search-students", get(search_students))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Create a student with its class and grade-level records
async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<StudentFields>, JsonRejection>,
) -> Response {
    let Json(fields) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(Error::malformed(rejection.body_text())),
    };

    match state.coordinator.create(fields).await {
        Ok(student) => (StatusCode::CREATED, Json(student)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Look up a student by identifier
async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Response {
    match state.coordinator.get(&student_id).await {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Update a student and propagate class/grade into the dependents
async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    payload: Result<Json<StudentFields>, JsonRejection>,
) -> Response {
    let Json(fields) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(Error::malformed(rejection.body_text())),
    };

    match state.coordinator.update(&student_id, fields).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Student updated successfully",
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Delete a student and its dependent records
async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Response {
    match state.coordinator.delete(&student_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Student deleted successfully",
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Class record for a student
async fn get_class(State(state): State<AppState>, Path(student_id): Path<String>) -> Response {
    match state.coordinator.class_for(&student_id).await {
        Ok(class) => (StatusCode::OK, Json(class)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Grade-level record for a student
async fn get_grade_level(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Response {
    match state.coordinator.grade_level_for(&student_id).await {
        Ok(grade) => (StatusCode::OK, Json(grade)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Search students by conjunctive substring filters
async fn search_students(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Response {
    match state.coordinator.search(filter).await {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::config::ServiceConfig;
    use crate::models::{Student, StudentId};
    use crate::store::MemoryStudentStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router() -> (Router, Arc<MemoryStudentStore>) {
        let store = Arc::new(MemoryStudentStore::new());
        let state = AppState::new(ServiceConfig::default(), store.clone());
        (create_router(state), store)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const ANN: &str = r#"{"first_name":"Ann","last_name":"Lee","address":"12 Elm St","class_name":"5A","grade_level":"5"}"#;

    #[tokio::test]
    async fn test_create_student_returns_201_with_identifier() {
        let (router, _) = test_router();

        let response = router
            .oneshot(json_request("POST", "/students", ANN))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["first_name"], "Ann");
        assert_eq!(body["class_name"], "5A");
        assert!(StudentId::parse(body["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_create_with_malformed_json_is_400() {
        let (router, _) = test_router();

        let response = router
            .oneshot(json_request("POST", "/students", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "malformed_input");
    }

    #[tokio::test]
    async fn test_get_with_bad_identifier_is_400() {
        let (router, _) = test_router();

        let response = router
            .oneshot(empty_request("GET", "/students/not-a-uuid"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "invalid_identifier");
    }

    #[tokio::test]
    async fn test_get_missing_student_is_404() {
        let (router, _) = test_router();
        let id = StudentId::generate();

        let response = router
            .oneshot(empty_request("GET", &format!("/students/{id}")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_missing_student_is_404() {
        let (router, _) = test_router();
        let id = StudentId::generate();

        let response = router
            .oneshot(json_request("PUT", &format!("/students/{id}"), ANN))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_class_lookup_after_create() {
        let (router, _) = test_router();

        let created = router
            .clone()
            .oneshot(json_request("POST", "/students", ANN))
            .await
            .unwrap();
        let student: Student = serde_json::from_value(body_json(created).await).unwrap();

        let response = router
            .oneshot(empty_request("GET", &format!("/class/{}", student.id)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["class_name"], "5A");
        assert_eq!(body["grade_level"], "5");
    }

    #[tokio::test]
    async fn test_search_empty_result_is_404() {
        let (router, _) = test_router();

        let response = router
            .oneshot(empty_request("GET", "/search-students?last_name=smith"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_search_filters_by_substring() {
        let (router, _) = test_router();

        router
            .clone()
            .oneshot(json_request("POST", "/students", ANN))
            .await
            .unwrap();

        let response = router
            .oneshot(empty_request("GET", "/search-students?last_name=lE"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_distinctly() {
        let (router, store) = test_router();
        store.fail_once("insert_class");

        let response = router
            .oneshot(json_request("POST", "/students", ANN))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "partial_failure");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (router, _) = test_router();

        let response = router
            .oneshot(empty_request("GET", "/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }
}
