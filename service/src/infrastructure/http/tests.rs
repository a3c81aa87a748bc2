use std::io::Write;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use doctrack_common::test_utils::{
    DocumentSeed, TEST_PASSWORD, TEST_PASSWORD_ROUNDS, insert_document, insert_user,
    memory_database,
};
use doctrack_common::{Database, Role};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use super::router;
use crate::infrastructure::AppStateImpl;
use crate::infrastructure::persistence::documents::SqliteDocumentRepository;
use crate::infrastructure::persistence::users::SqliteUserRepository;
use crate::infrastructure::storage::UploadStorage;

const BOUNDARY: &str = "doctrack-test-boundary";

struct TestApp {
    router: Router,
    database: Database,
    admin_id: i64,
    staff_id: i64,
    _uploads: TempDir,
}

async fn app() -> TestApp {
    let database = memory_database().await;
    let uploads = tempfile::tempdir().unwrap();
    let admin_id = insert_user(&database, "admin", "Quản trị viên", Role::Admin).await;
    let staff_id = insert_user(&database, "staff", "Nhân viên", Role::Staff).await;

    let state = AppStateImpl::new(
        SqliteDocumentRepository::new(database.clone()),
        SqliteUserRepository::new(database.clone()),
        UploadStorage::new(uploads.path()).await.unwrap(),
        TEST_PASSWORD_ROUNDS,
    );

    TestApp {
        router: router(state, 10 * 1024 * 1024),
        database,
        admin_id,
        staff_id,
        _uploads: uploads,
    }
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn request(method: &str, uri: &str, username: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, basic(username, TEST_PASSWORD))
}

fn get(uri: &str, username: &str) -> Request<Body> {
    request("GET", uri, username).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, username: &str, body: Value) -> Request<Body> {
    request(method, uri, username)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(
    method: &str,
    uri: &str,
    username: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .unwrap();
    }
    for (name, file_name, bytes) in files {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .unwrap();
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    write!(body, "--{BOUNDARY}--\r\n").unwrap();

    request(method, uri, username)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn docx(text: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    write!(
        writer,
        "<w:document><w:body><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:body></w:document>"
    )
    .unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn api_requires_valid_credentials() {
    let app = app().await;

    let request = Request::builder()
        .uri("/api/documents")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(WWW_AUTHENTICATE));

    let request = Request::builder()
        .uri("/api/documents")
        .header(AUTHORIZATION, basic("admin", "wrong"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status_code"], 401);
}

#[tokio::test]
async fn staff_cannot_use_admin_routes() {
    let app = app().await;
    let (status, body) = send(&app, get("/api/users", "staff")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status_code"], 403);

    let (status, body) = send(&app, get("/api/users", "admin")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_applies_filters_and_echoes_them() {
    let app = app().await;
    insert_document(&app.database, DocumentSeed::titled("Draft MOU on Cooperation")).await;
    insert_document(&app.database, DocumentSeed::titled("Annual report")).await;

    let (status, body) = send(
        &app,
        get(
            "/api/documents?q=MOU&page_size=7&page=0&week=x&handler_id=null",
            "staff",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Draft MOU on Cooperation");
    assert_eq!(body["data"][0]["status_label"], "Chưa xử lý");
    assert_eq!(
        body["meta"],
        json!({
            "total_filtered": 1,
            "total_pages": 1,
            "page": 1,
            "page_size": 10,
            "filters": {
                "q": "MOU",
                "country": null,
                "status": null,
                "week": null,
                "year": null,
                "handler_id": "null",
                "page_size": 10
            }
        })
    );
}

#[tokio::test]
async fn undecodable_filter_input_still_lists() {
    let app = app().await;
    insert_document(&app.database, DocumentSeed::titled("Annual report")).await;

    let (status, body) = send(&app, get("/api/documents?q=%FF&page=abc", "staff")).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["page_size"], 10);
    assert_eq!(body["meta"]["filters"]["q"], "\u{FFFD}");
    assert_eq!(body["meta"]["total_filtered"], 0);
}

#[tokio::test]
async fn stats_count_documents_by_status() {
    let app = app().await;
    insert_document(&app.database, DocumentSeed::titled("a")).await;
    insert_document(
        &app.database,
        DocumentSeed {
            status: "processing",
            handler_id: Some(app.staff_id),
            ..DocumentSeed::titled("b")
        },
    )
    .await;

    let (status, body) = send(&app, get("/api/documents/stats", "staff")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"total": 2, "unassigned": 1, "processing": 1, "completed": 0})
    );
}

#[tokio::test]
async fn created_document_gets_text_and_summary_from_translation() {
    let app = app().await;
    let handler_id = app.staff_id.to_string();
    let translated = docx("Hai bên thống nhất hợp tác");

    let (status, body) = send(
        &app,
        multipart_request(
            "POST",
            "/api/documents",
            "staff",
            &[
                ("title", "Draft MOU on Cooperation"),
                ("creation_date", "2024-01-17T08:30:00Z"),
                ("handler_id", &handler_id),
                ("week_number", "3"),
            ],
            &[("translated_file", "ban dich (final).docx", translated.as_slice())],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "processing");
    assert_eq!(body["handler"]["full_name"], "Nhân viên");
    assert_eq!(body["creation_date"]["raw"], "2024-01-17 08:30:00");
    assert_eq!(body["creation_date"]["display"], "17/01/2024 08:30");
    assert_eq!(body["week_number"], 3);
    assert_eq!(body["translated_text"], "Hai bên thống nhất hợp tác");
    assert_eq!(
        body["main_content_summary"],
        "[TÓM TẮT TỰ ĐỘNG (GIẢ LẬP)] Hai bên thống nhất hợp tác..."
    );

    let url = body["translated_file"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/ban_dich_final_"));
    let response = app
        .router
        .clone()
        .oneshot(get(&url, "staff"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), translated.as_slice());
}

#[tokio::test]
async fn document_without_title_is_rejected() {
    let app = app().await;
    let (status, _) = send(
        &app,
        multipart_request("POST", "/api/documents", "staff", &[("title", "  ")], &[]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn workflow_goes_through_assign_and_report() {
    let app = app().await;
    let id = insert_document(&app.database, DocumentSeed::titled("Công văn")).await;
    let uri = format!("/api/documents/{id}");
    let report = format!("/api/documents/{id}/report");

    let (status, _) = send(&app, request("POST", &report, "staff").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &uri,
            "admin",
            json!({"title": "Công văn", "handler_id": app.staff_id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");

    let (status, _) = send(
        &app,
        json_request("PUT", &uri, "admin", json!({"title": "Công văn", "handler_id": null})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, request("POST", &report, "staff").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["status_label"], "Đã xử lý");
    assert_eq!(body["implementer"]["id"], app.staff_id);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &uri,
            "admin",
            json!({"title": "Công văn", "handler_id": app.admin_id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &uri,
            "admin",
            json!({
                "title": "Công văn",
                "handler_id": app.staff_id,
                "completion_time": "2024-02-01 09:15"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completion_time"]["display"], "01/02/2024 09:15");
}

#[tokio::test]
async fn attachments_can_be_replaced_and_removed() {
    let app = app().await;
    let id = insert_document(&app.database, DocumentSeed::titled("a")).await;
    let files = format!("/api/documents/{id}/files/original");

    let (status, body) = send(
        &app,
        multipart_request("PUT", &files, "admin", &[], &[("file", "scan.txt", b"first".as_slice())]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first = body["original_file"]["url"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        multipart_request("PUT", &files, "admin", &[], &[("file", "scan.txt", b"second".as_slice())]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["original_file"]["url"].as_str().unwrap(), first);

    let (status, _) = send(&app, get(&first, "staff")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("DELETE", &files, "admin").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, get(&format!("/api/documents/{id}"), "staff")).await;
    assert_eq!(body["original_file"], Value::Null);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/documents/{id}/files/cover"), "admin")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_document_is_gone() {
    let app = app().await;
    let id = insert_document(&app.database, DocumentSeed::titled("a")).await;
    let uri = format!("/api/documents/{id}");

    let (status, _) = send(&app, request("DELETE", &uri, "staff").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request("DELETE", &uri, "admin").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, get(&uri, "admin")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status_code"], 404);
}

#[tokio::test]
async fn admin_manages_users() {
    let app = app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            "admin",
            json!({
                "username": "new.user",
                "password": "s3cret",
                "confirm_password": "s3cret",
                "full_name": "Người mới",
                "role": "staff"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "staff");

    let me = Request::builder()
        .uri("/api/me")
        .header(AUTHORIZATION, basic("new.user", "s3cret"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, me).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Người mới");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            "admin",
            json!({
                "username": "new.user",
                "password": "x",
                "confirm_password": "x",
                "full_name": "Trùng"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            "admin",
            json!({
                "username": "bad name",
                "password": "x",
                "confirm_password": "y",
                "full_name": "X"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn user_deletion_guards() {
    let app = app().await;
    insert_document(
        &app.database,
        DocumentSeed {
            status: "processing",
            handler_id: Some(app.staff_id),
            ..DocumentSeed::titled("busy")
        },
    )
    .await;

    let delete = |id: i64| {
        request("DELETE", &format!("/api/users/{id}"), "admin")
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&app, delete(app.admin_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, delete(app.staff_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, delete(9999)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_password_change_needs_confirmation() {
    let app = app().await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/me",
            "staff",
            json!({"password": "new", "confirm_password": "other"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/me",
            "staff",
            json!({"position": "Trưởng phòng", "password": "new", "confirm_password": "new"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], "Trưởng phòng");
    assert_eq!(body["role"], "staff");

    let me = Request::builder()
        .uri("/api/me")
        .header(AUTHORIZATION, basic("staff", "new"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, me).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn handlers_are_listed_by_name() {
    let app = app().await;
    let (status, body) = send(&app, get("/api/handlers", "staff")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["full_name"], "Nhân viên");
    assert_eq!(body[1]["full_name"], "Quản trị viên");
}

#[tokio::test]
async fn unknown_handler_is_rejected() {
    let app = app().await;
    let (status, _) = send(
        &app,
        multipart_request(
            "POST",
            "/api/documents",
            "staff",
            &[("title", "Công văn"), ("handler_id", "4242")],
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
