//! End-to-end tests over the public router
//!
//! Drives the service the way a client would: build a server over the
//! in-memory store and speak HTTP to the router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use myeongbu::coordinator::{RecordServer, ServiceConfig};
use myeongbu::models::Student;
use myeongbu::store::MemoryStudentStore;

fn service() -> (Router, Arc<MemoryStudentStore>) {
    let store = Arc::new(MemoryStudentStore::new());
    let config = ServiceConfig::builder()
        .enable_request_logging(false)
        .build()
        .unwrap();
    let server = RecordServer::new(config, store.clone()).unwrap();
    (server.build_router(), store)
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

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const ANN: &str = r#"{"first_name":"Ann","last_name":"Lee","address":"12 Elm St","class_name":"5A","grade_level":"5"}"#;
const ANN_MOVED: &str = r#"{"first_name":"Ann","last_name":"Lee","address":"12 Elm St","class_name":"6B","grade_level":"6"}"#;

async fn create_ann(router: &Router) -> Student {
    let response = router
        .clone()
        .oneshot(json_request("POST", "/students", ANN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    serde_json::from_value(body_json(response).await).unwrap()
}

#[tokio::test]
async fn create_then_read_class_and_grade() {
    let (router, _) = service();
    let student = create_ann(&router).await;

    let response = router
        .clone()
        .oneshot(empty_request("GET", &format!("/class/{}", student.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let class = body_json(response).await;
    assert_eq!(class["class_name"], "5A");
    assert_eq!(class["grade_level"], "5");
    assert_eq!(class["student_id"], student.id.to_string());

    let response = router
        .oneshot(empty_request("GET", &format!("/grade-level/{}", student.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let grade = body_json(response).await;
    assert_eq!(grade["level"], "5");
}

#[tokio::test]
async fn full_lifecycle_create_update_delete() {
    let (router, store) = service();
    let student = create_ann(&router).await;
    let path = format!("/students/{}", student.id);

    let response = router
        .clone()
        .oneshot(json_request("PUT", &path, ANN_MOVED))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Read-your-write on all three collections.
    let response = router.clone().oneshot(empty_request("GET", &path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["class_name"], "6B");

    let response = router
        .clone()
        .oneshot(empty_request("GET", &format!("/class/{}", student.id)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["grade_level"], "6");

    let response = router
        .clone()
        .oneshot(empty_request("DELETE", &path))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(empty_request("GET", &path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.student_count(), 0);
    assert_eq!(store.grade_level_count(), 0);
    assert_eq!(store.class_count(), 0);
}

#[tokio::test]
async fn search_with_and_without_filters() {
    let (router, _) = service();
    create_ann(&router).await;

    let bob = r#"{"first_name":"Bob","last_name":"Kim","address":"3 Oak Ave","class_name":"6B","grade_level":"6"}"#;
    let response = router
        .clone()
        .oneshot(json_request("POST", "/students", bob))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/search-students"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/search-students?class_name=6b&last_name=KIM"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let hits = body_json(response).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["first_name"], "Bob");

    // Empty-valued parameters behave like omitted ones.
    let response = router
        .oneshot(empty_request("GET", "/search-students?class_name=&grade_level="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_nonexistent_alters_nothing() {
    let (router, store) = service();

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/students/{}", uuid::Uuid::new_v4()),
            ANN,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.student_count(), 0);
    assert_eq!(store.grade_level_count(), 0);
    assert_eq!(store.class_count(), 0);
}

#[tokio::test]
async fn dependent_write_failure_surfaces_partial_kind() {
    let (router, store) = service();
    let student = create_ann(&router).await;

    store.fail_once("update_grade_level");
    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/students/{}", student.id),
            ANN_MOVED,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "partial_failure");
    assert!(body["error"].as_str().unwrap().contains("grade level"));
}

#[tokio::test]
async fn concurrent_updates_both_succeed() {
    let (router, _) = service();
    let student = create_ann(&router).await;
    let path = format!("/students/{}", student.id);

    let (a, b) = tokio::join!(
        router.clone().oneshot(json_request("PUT", &path, ANN_MOVED)),
        router.clone().oneshot(json_request(
            "PUT",
            &path,
            r#"{"first_name":"Ann","last_name":"Lee","address":"12 Elm St","class_name":"7C","grade_level":"7"}"#,
        )),
    );
    assert_eq!(a.unwrap().status(), StatusCode::OK);
    assert_eq!(b.unwrap().status(), StatusCode::OK);

    // Winner is scheduling-dependent; the record must hold one of the
    // two submitted values.
    let response = router.oneshot(empty_request("GET", &path)).await.unwrap();
    let body = body_json(response).await;
    let class = body["class_name"].as_str().unwrap();
    assert!(class == "6B" || class == "7C");
}
