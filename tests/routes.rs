use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tortoise_docstore::{configure, AuditLog, DocumentStore, StoreOptions};

async fn store_in(dir: &TempDir) -> DocumentStore {
    let audit = AuditLog::open(dir.path().join("log.txt")).await.unwrap();
    DocumentStore::open(StoreOptions::new(dir.path()), Arc::new(audit))
        .await
        .unwrap()
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($store.clone()))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn banner_and_status() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir).await;
    let app = app!(store);

    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(&body[..], b"server");

    let req = test::TestRequest::get().uri("/status").to_request();
    let status: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status["up"], true);
    assert_eq!(status["documents"], 0);
    assert!(status["timestamp"].as_u64().unwrap() > 0);
}

#[actix_web::test]
async fn key_lifecycle() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir).await;
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/createFile?file=u.json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::patch()
        .uri("/set?file=u.json&key=email&value=a%40b.com")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/get?file=u.json&key=email")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["value"], "a@b.com");

    let req = test::TestRequest::patch()
        .uri("/remove?file=u.json&key=email")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["removed"], "a@b.com");

    let req = test::TestRequest::get()
        .uri("/get?file=u.json&key=email")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "key email invalid on u.json");

    let messages: Vec<_> = store
        .audit()
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            "CreateFile u.json",
            "Set email on u.json -> a@b.com",
            "Get email on u.json -> a@b.com",
            "Remove email on u.json",
            "Error Get: key email invalid on u.json",
        ]
    );
}

#[actix_web::test]
async fn file_operations_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir).await;
    let app = app!(store);

    let create = || test::TestRequest::post().uri("/createFile?file=d.json").to_request();
    let resp = test::call_service(&app, create()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::call_and_read_body_json(&app, create()).await;
    assert_eq!(body, json!({"file": "d.json", "created": false}));

    let delete = || test::TestRequest::delete().uri("/deleteFile?file=d.json").to_request();
    let body: Value = test::call_and_read_body_json(&app, delete()).await;
    assert_eq!(body["deleted"], true);
    let body: Value = test::call_and_read_body_json(&app, delete()).await;
    assert_eq!(body["deleted"], false);
}

#[actix_web::test]
async fn key_set_routes() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("scott.json"),
        r#"{"firstname":"Scott","email":"s@x.com"}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("andrew.json"),
        r#"{"firstname":"Andrew","username":"a"}"#,
    )
    .unwrap();
    let store = store_in(&dir).await;
    let app = app!(store);

    for (route, expected) in [
        ("union", json!(["firstname", "email", "username"])),
        ("intersect", json!(["firstname"])),
        ("difference", json!(["email", "username"])),
    ] {
        let req = test::TestRequest::get()
            .uri(&format!("/{}?fileA=scott.json&fileB=andrew.json", route))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["keys"], expected, "{}", route);
    }
}

#[actix_web::test]
async fn merge_data_route() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("user.json"), r#"{"username":"scoot"}"#).unwrap();
    let store = store_in(&dir).await;
    store.register("user.json").await.unwrap();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/createFile?file=post.json")
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/mergeData").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"user": {"username": "scoot"}, "post": {}}));
}

#[actix_web::test]
async fn error_statuses() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bad.json"), "[1, 2, 3]").unwrap();
    let store = store_in(&dir).await;
    let app = app!(store);

    let cases = [
        (test::TestRequest::get().uri("/get?file=bad.json&key=a"), StatusCode::UNPROCESSABLE_ENTITY),
        (test::TestRequest::get().uri("/get?file=none.json&key=a"), StatusCode::NOT_FOUND),
        (test::TestRequest::post().uri("/createFile?file=../up.json"), StatusCode::BAD_REQUEST),
        (test::TestRequest::patch().uri("/set?file=bad.json&key=a"), StatusCode::BAD_REQUEST),
        (test::TestRequest::delete().uri("/deleteFile?file=log.txt"), StatusCode::BAD_REQUEST),
    ];
    for (req, expected) in cases {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), expected);
    }
    assert!(!dir.path().parent().unwrap().join("up.json").exists());
    assert!(dir.path().join("log.txt").exists());
}
