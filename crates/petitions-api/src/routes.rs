use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::storage::MAX_UPLOAD_SIZE;
use crate::{drafts, petitions, uploads, users};

/// Every route the portal serves. Transport layers (CORS, tracing) are added
/// by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{user_id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/petitions", get(petitions::list_by_status).post(petitions::submit))
        .route("/petitions/mine", get(petitions::list_mine))
        .route("/petitions/{petition_id}", get(petitions::get_petition))
        .route("/petitions/{petition_id}/status", put(petitions::update_status))
        .route(
            "/petitions/{petition_id}/steps",
            get(petitions::list_steps).post(petitions::append_step),
        )
        .route("/petitions/{petition_id}/status-changes", post(petitions::record_status_change))
        .route(
            "/drafts/{draft_id}",
            get(drafts::load).put(drafts::save).delete(drafts::discard),
        )
        .route("/drafts/{draft_id}/submit", post(drafts::submit))
        .route("/drafts/{draft_id}/petitioners", post(drafts::add_co_petitioner))
        .route(
            "/drafts/{draft_id}/petitioners/{petitioner_id}",
            delete(drafts::remove_co_petitioner),
        )
        .route(
            "/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use petitions_db::Database;

    use super::*;
    use crate::auth::{AppStateInner, bootstrap_admin};
    use crate::storage::ObjectStorage;

    const SECRET: &str = "test-secret";

    fn app() -> Router {
        app_with_storage(None)
    }

    fn app_with_storage(storage: Option<ObjectStorage>) -> Router {
        let db = Database::open_in_memory().unwrap();
        bootstrap_admin(&db, "admin@x.com", "adminpass1").unwrap();
        router(Arc::new(AppStateInner {
            db,
            jwt_secret: SECRET.into(),
            storage,
        }))
    }

    async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(body) => send_raw(app, method, uri, token, Some("application/json"), Body::from(body.to_string())).await,
            None => send_raw(app, method, uri, token, None, Body::empty()).await,
        }
    }

    async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: Body,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(body).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(app: &Router, email: &str, national_id: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "email": email,
                "phone": "0700000000",
                "nationalId": national_id,
                "password": "password1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["user"]["role"], "petitioner");
        body["token"].as_str().unwrap().to_string()
    }

    async fn submit(app: &Router, token: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/petitions",
            Some(token),
            Some(json!({
                "petitionFormUrl": "https://x/form.pdf",
                "subjectMatter": "Roads",
                "sources": [],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["status"], "PENDING");
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn petition_lifecycle_end_to_end() {
        let app = app();
        let jane = register(&app, "jane@x.com", "ID123456").await;
        let petition_id = submit(&app, &jane).await;

        let admin = login(&app, "admin@x.com", "adminpass1").await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/users",
            Some(&admin),
            Some(json!({
                "firstName": "Carl",
                "lastName": "Clerk",
                "email": "clerk@x.com",
                "phone": "0711111111",
                "nationalId": "ID999",
                "password": "clerkpass1",
                "role": "clerk",
                "roleDescription": "National Assembly",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let clerk = login(&app, "clerk@x.com", "clerkpass1").await;

        let (status, pending) = send(&app, Method::GET, "/petitions?status=PENDING", Some(&clerk), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);
        assert_eq!(pending[0]["owner"]["firstName"], "Jane");

        let (status, change) = send(
            &app,
            Method::POST,
            &format!("/petitions/{petition_id}/status-changes"),
            Some(&clerk),
            Some(json!({ "status": "Under Review", "note": "Clerk reviewing" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{change}");
        assert_eq!(change["petition"]["status"], "UNDER_REVIEW");
        assert_eq!(change["step"]["title"], "Under Review");

        let (status, steps) = send(&app, Method::GET, &format!("/petitions/{petition_id}/steps"), Some(&jane), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(steps.as_array().unwrap().len(), 1);
        assert_eq!(steps[0]["description"], "Clerk reviewing");

        let (_, mine) = send(&app, Method::GET, "/petitions/mine", Some(&jane), None).await;
        assert_eq!(mine[0]["status"], "UNDER_REVIEW");
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let app = app();
        register(&app, "jane@x.com", "ID123456").await;

        let wrong = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "jane@x.com", "password": "not-her-password" })),
        )
        .await;
        let unknown = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ghost@x.com", "password": "password1" })),
        )
        .await;

        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong.1["error"], "Invalid email or password.");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = app();
        register(&app, "jane@x.com", "ID123456").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "firstName": "Jane",
                "lastName": "Again",
                "email": "jane@x.com",
                "phone": "0700000000",
                "nationalId": "ID000001",
                "password": "password1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "email is already registered");
    }

    #[tokio::test]
    async fn role_gates_are_enforced() {
        let app = app();
        let jane = register(&app, "jane@x.com", "ID123456").await;
        let john = register(&app, "john@x.com", "ID654321").await;
        let petition_id = submit(&app, &jane).await;

        let (status, _) = send(&app, Method::GET, "/petitions/mine", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/petitions?status=PENDING", Some(&jane), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, &format!("/petitions/{petition_id}"), Some(&john), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/petitions/{petition_id}/status"),
            Some(&jane),
            Some(json!({ "status": "APPROVED" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, "/users?role=clerk", Some(&jane), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, me) = send(&app, Method::GET, "/users/me", Some(&jane), None).await;
        let jane_id = me["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/users/{jane_id}"),
            Some(&jane),
            Some(json!({ "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &format!("/users/{jane_id}"),
            Some(&jane),
            Some(json!({ "phone": "0722222222" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["phone"], "0722222222");
        assert_eq!(updated["role"], "petitioner");
    }

    #[tokio::test]
    async fn unknown_status_is_a_bad_request() {
        let app = app();
        let admin = login(&app, "admin@x.com", "adminpass1").await;

        let (status, body) = send(&app, Method::GET, "/petitions?status=Shredded", Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Shredded"));
    }

    #[tokio::test]
    async fn deleted_accounts_lose_access() {
        let app = app();
        let jane = register(&app, "jane@x.com", "ID123456").await;
        let admin = login(&app, "admin@x.com", "adminpass1").await;

        let (_, me) = send(&app, Method::GET, "/users/me", Some(&jane), None).await;
        let jane_id = me["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, Method::DELETE, &format!("/users/{jane_id}"), Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, "/users/me", Some(&jane), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn drafts_round_trip_and_submit() {
        let app = app();
        let jane = register(&app, "jane@x.com", "ID123456").await;
        let draft_id = uuid::Uuid::new_v4();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/drafts/{draft_id}"),
            Some(&jane),
            Some(json!({ "subjectMatter": "Water", "petitionFormUrl": "https://x/form.pdf" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, draft) = send(&app, Method::GET, &format!("/drafts/{draft_id}"), Some(&jane), None).await;
        assert_eq!(draft["subjectMatter"], "Water");

        let (status, petition) = send(&app, Method::POST, &format!("/drafts/{draft_id}/submit"), Some(&jane), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(petition["subjectMatter"], "Water");

        let (status, _) = send(&app, Method::GET, &format!("/drafts/{draft_id}"), Some(&jane), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn uploads_go_to_the_bucket() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let app = app_with_storage(Some(ObjectStorage::new(&server.uri(), "evidence", "anon-key")));
        let jane = register(&app, "jane@x.com", "ID123456").await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/uploads?fileName=form.pdf&prefix=petitions")
            .header(header::AUTHORIZATION, format!("Bearer {jane}"))
            .header(header::CONTENT_TYPE, "application/pdf")
            .body(Body::from("%PDF-1.7"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["url"].as_str().unwrap().contains("/storage/v1/object/public/evidence/petitions/"));
        assert_eq!(body["size"], 8);
    }

    #[tokio::test]
    async fn uploads_without_storage_are_unavailable() {
        let app = app();
        let jane = register(&app, "jane@x.com", "ID123456").await;

        let (status, body) = send_raw(
            &app,
            Method::POST,
            "/uploads?fileName=form.pdf",
            Some(&jane),
            Some("application/pdf"),
            Body::from("%PDF-1.7"),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "file uploads are disabled on this server");
    }

    #[tokio::test]
    async fn oversized_uploads_get_a_json_413() {
        let app = app();
        let jane = register(&app, "jane@x.com", "ID123456").await;

        let (status, body) = send_raw(
            &app,
            Method::POST,
            "/uploads?fileName=huge.bin",
            Some(&jane),
            Some("application/octet-stream"),
            Body::from(vec![0u8; MAX_UPLOAD_SIZE + 1]),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "request body is too large");
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let app = app();
        let admin = login(&app, "admin@x.com", "adminpass1").await;

        let cases = [
            send(&app, Method::GET, "/petitions/not-a-uuid", Some(&admin), None).await,
            send(&app, Method::GET, "/petitions", Some(&admin), None).await,
            send_raw(&app, Method::POST, "/petitions", Some(&admin), Some("application/json"), Body::from("{not json")).await,
            send(
                &app,
                Method::POST,
                "/petitions",
                Some(&admin),
                Some(json!({
                    "petitionFormUrl": "https://x/form.pdf",
                    "subjectMatter": "Roads",
                    "priority": "urgent",
                })),
            )
            .await,
            send_raw(&app, Method::POST, "/auth/login", None, Some("text/plain"), Body::from("hi")).await,
        ];

        for (status, body) in cases {
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(body["error"].is_string(), "{body}");
        }
    }

    #[tokio::test]
    async fn login_tolerates_surrounding_whitespace() {
        let app = app();
        register(&app, "jane@x.com", "ID123456").await;
        login(&app, " jane@x.com ", "password1").await;
    }

    #[tokio::test]
    async fn co_petitioners_on_a_draft() {
        let app = app();
        let jane = register(&app, "jane@x.com", "ID123456").await;
        let draft_id = uuid::Uuid::new_v4();

        let (status, draft) = send(
            &app,
            Method::PUT,
            &format!("/drafts/{draft_id}"),
            Some(&jane),
            Some(json!({
                "subjectMatter": "Water",
                "grievances": "No piped water for two years",
                "prayer": "Connect the ward to the mains",
                "legalStatusConfirmation": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{draft}");
        assert_eq!(draft["legalStatusConfirmation"], true);
        assert_eq!(draft["petitioners"], json!([]));

        let (status, draft) = send(
            &app,
            Method::POST,
            &format!("/drafts/{draft_id}/petitioners"),
            Some(&jane),
            Some(json!({
                "name": "John Mwangi",
                "address": "12 Moi Avenue, Nairobi",
                "phone": "0700 123 456",
                "nationalId": "A1234567",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{draft}");
        let petitioner_id = draft["petitioners"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/drafts/{draft_id}/petitioners"),
            Some(&jane),
            Some(json!({ "name": "J", "address": "12 Moi Avenue, Nairobi", "phone": "0700123456", "nationalId": "A1234567" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("name"));

        let (status, draft) = send(
            &app,
            Method::DELETE,
            &format!("/drafts/{draft_id}/petitioners/{petitioner_id}"),
            Some(&jane),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["petitioners"], json!([]));
    }
}
