#[cfg(test)]
mod api_integration_tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use helpdesk::core::bootstrap::seed_if_empty;
    use helpdesk::storage::MemoryStore;
    use helpdesk::{build_router, AppConfig, AppState};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const ADMIN_EMAIL: &str = "admin@helpdesk.local";
    const ADMIN_PASSWORD: &str = "admin123";
    const AGENT_EMAIL: &str = "john.doe@company.com";
    const AGENT_PASSWORD: &str = "password123";

    async fn seeded_app() -> Router {
        let state = AppState::new(Arc::new(MemoryStore::new()), AppConfig::for_tests())
            .expect("Failed to build state");
        seed_if_empty(&state).await.expect("Failed to seed");
        build_router(Arc::new(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = app.clone().oneshot(request).await.expect("Request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    async fn first_ticket_id(app: &Router, token: &str) -> String {
        let (_, body) = send(app, Method::GET, "/api/v1/ticket", Some(token), None).await;
        body["tickets"][0]["id"].as_str().expect("ticket id").to_string()
    }

    #[tokio::test]
    async fn test_root_and_health_are_public() {
        let app = seeded_app().await;

        let (status, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");

        let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let app = seeded_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("token").is_none());
        assert_eq!(body["error"], "Invalid email or password");
        assert_eq!(body["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let app = seeded_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email and password are required");
    }

    #[tokio::test]
    async fn test_token_resolves_to_logged_in_user() {
        let app = seeded_app().await;
        let (_, login_body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
        let token = login_body["token"].as_str().expect("token");
        assert!(login_body["user"].get("passwordHash").is_none());

        let (status, me) = send(&app, Method::GET, "/api/v1/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], login_body["user"]["id"]);
        assert!(me["lastLogin"].is_string());
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = seeded_app().await;

        let (status, body) = send(&app, Method::GET, "/api/v1/ticket", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthenticated");

        let (status, _) = send(&app, Method::GET, "/api/v1/ticket", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // 401 wins over 403 on admin routes.
        let (status, _) = send(&app, Method::DELETE, "/api/v1/users/whatever", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_close_reopen_scenario() {
        let app = seeded_app().await;
        let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/ticket/create",
            Some(&token),
            Some(json!({ "title": "X", "detail": "Y" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["number"], 1004);
        assert_eq!(created["status"], "needs_support");
        assert_eq!(created["isComplete"], false);
        assert_eq!(created["priority"], "medium");
        assert_eq!(created["type"], "support");
        assert_eq!(created["createdAt"], created["updatedAt"]);
        assert_eq!(created["createdBy"]["email"], ADMIN_EMAIL);
        assert!(created["assignedTo"].is_null());

        let id = created["id"].as_str().expect("id");
        let (status, closed) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/ticket/{id}/close"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["status"], "resolved");
        assert_eq!(closed["isComplete"], true);

        let (_, closed_again) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/ticket/{id}/close"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(closed_again["status"], "resolved");

        let (status, reopened) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/ticket/{id}/reopen"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reopened["status"], "needs_support");
        assert_eq!(reopened["isComplete"], false);
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/ticket/create",
            Some(&token),
            Some(json!({ "detail": "no title" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "title is required", "code": "validation_error" }));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/ticket/create",
            Some(&token),
            Some(json!({ "title": "T", "detail": "D", "assigned_to": uuid::Uuid::new_v4() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/ticket/create")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body: Value = serde_json::from_slice(&bytes).expect("json error body");
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids_are_not_found() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;

        let (status, body) =
            send(&app, Method::GET, "/api/v1/ticket/1001", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Ticket not found");

        let missing = format!("/api/v1/ticket/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, Method::GET, &missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("{missing}/close"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_partial_update_and_unassign() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;
        let id = first_ticket_id(&app, &token).await;
        let uri = format!("/api/v1/ticket/{id}");

        let (_, before) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert!(before["assignedTo"].is_object());

        let (status, updated) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "priority": "urgent", "assigned_to": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["priority"], "urgent");
        assert_eq!(updated["title"], before["title"]);
        assert!(updated["assignedTo"].is_null());

        let (_, closed) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "status": "closed" })),
        )
        .await;
        assert_eq!(closed["isComplete"], true);
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;

        let (status, body) = send(&app, Method::GET, "/api/v1/ticket", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["pages"], 1);
        assert_eq!(body["current_page"], 1);
        // Newest first.
        assert_eq!(body["tickets"][0]["number"], 1003);

        let (_, high) = send(
            &app,
            Method::GET,
            "/api/v1/ticket?priority=high",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(high["total"], 2);

        let (_, paged) = send(
            &app,
            Method::GET,
            "/api/v1/ticket?page=2&per_page=2",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(paged["pages"], 2);
        assert_eq!(paged["tickets"].as_array().map(Vec::len), Some(1));

        let (_, beyond) = send(
            &app,
            Method::GET,
            "/api/v1/ticket?page=9",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(beyond["tickets"], json!([]));
        assert_eq!(beyond["total"], 3);

        let (status, lenient) = send(
            &app,
            Method::GET,
            "/api/v1/ticket?page=abc&per_page=0",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(lenient["current_page"], 1);
    }

    #[tokio::test]
    async fn test_comments_lifecycle() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;
        let id = first_ticket_id(&app, &token).await;
        let uri = format!("/api/v1/ticket/{id}/comments");

        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "content": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Comment content is required");

        let (status, comment) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "content": "On it", "is_internal": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(comment["ticketId"], id.as_str());
        assert_eq!(comment["isInternal"], true);
        assert_eq!(comment["author"]["email"], AGENT_EMAIL);

        let (status, list) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["content"], "On it");

        let missing = format!("/api/v1/ticket/{}/comments", uuid::Uuid::new_v4());
        let (status, _) = send(&app, Method::GET, &missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &app,
            Method::POST,
            &missing,
            Some(&token),
            Some(json!({ "content": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_time_entries() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;
        let id = first_ticket_id(&app, &token).await;
        let uri = format!("/api/v1/ticket/{id}/time");

        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "description": "Debugging", "hours": 1.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "date is required");

        let (status, entry) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "description": "Debugging", "hours": 1.5, "date": "2099-12-31" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["hours"], 1.5);
        assert_eq!(entry["date"], "2099-12-31");
        assert_eq!(entry["user"]["email"], AGENT_EMAIL);

        let (_, list) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(list[0]["date"], "2099-12-31");
    }

    #[tokio::test]
    async fn test_user_administration() {
        let app = seeded_app().await;
        let agent = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let new_user = json!({
            "name": "New Agent",
            "email": "new@company.com",
            "password": "s3cret"
        });

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(&agent),
            Some(new_user.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "forbidden");

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(&admin),
            Some(new_user.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], "user");
        assert_eq!(created["status"], "active");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(&admin),
            Some(new_user),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, list) = send(&app, Method::GET, "/api/v1/users", Some(&agent), None).await;
        assert_eq!(list["total"], 5);

        // The new user can log in with the password set by the admin.
        login(&app, "new@company.com", "s3cret").await;

        let id = created["id"].as_str().expect("id");
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/users/{id}"),
            Some(&admin),
            Some(json!({ "department": "Billing", "email": AGENT_EMAIL })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "{updated}");

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/users/{id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/v1/users/{id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleting_an_author_is_a_conflict() {
        let app = seeded_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (_, me) = send(&app, Method::GET, "/api/v1/auth/me", Some(&admin), None).await;

        // Authors are restricted, so create a ticket as the admin first.
        send(
            &app,
            Method::POST,
            "/api/v1/ticket/create",
            Some(&admin),
            Some(json!({ "title": "Mine", "detail": "Owned" })),
        )
        .await;

        let id = me["id"].as_str().expect("id");
        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/users/{id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "conflict");
    }

    #[tokio::test]
    async fn test_profile_update() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/auth/profile",
            Some(&token),
            Some(json!({ "name": "Johnny", "phone": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Johnny");
        assert!(body["phone"].is_null());
        assert_eq!(body["department"], "Technical Support");
    }

    #[tokio::test]
    async fn test_clients() {
        let app = seeded_app().await;
        let agent = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, list) = send(&app, Method::GET, "/api/v1/clients", Some(&agent), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().map(Vec::len), Some(2));

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/clients",
            Some(&agent),
            Some(json!({ "name": "Globex", "email": "it@globex.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/clients",
            Some(&admin),
            Some(json!({ "name": "Globex" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email is required");

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/clients",
            Some(&admin),
            Some(json!({ "name": "Globex", "email": "it@globex.com", "contact_name": "Hank" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["contactName"], "Hank");
        assert_eq!(created["active"], true);
    }

    #[tokio::test]
    async fn test_admin_ticket_delete_cascades() {
        let app = seeded_app().await;
        let agent = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let id = first_ticket_id(&app, &admin).await;
        let uri = format!("/api/v1/ticket/{id}");

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&agent), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Ticket deleted successfully");

        let comments = format!("{uri}/comments");
        let (status, _) = send(&app, Method::GET, &comments, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleted_ticket_numbers_are_not_reused() {
        let app = seeded_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let body = json!({ "title": "Temporary", "detail": "Removed right away" });

        let (_, first) = send(
            &app,
            Method::POST,
            "/api/v1/ticket/create",
            Some(&admin),
            Some(body.clone()),
        )
        .await;
        let id = first["id"].as_str().expect("id");
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/ticket/{id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, second) = send(
            &app,
            Method::POST,
            "/api/v1/ticket/create",
            Some(&admin),
            Some(body),
        )
        .await;
        assert_eq!(first["number"], 1004);
        assert_eq!(second["number"], 1005);
    }

    #[tokio::test]
    async fn test_over_long_fields_are_validation_errors() {
        let app = seeded_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/ticket/create",
            Some(&admin),
            Some(json!({ "title": "x".repeat(201), "detail": "Y" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");

        let id = first_ticket_id(&app, &admin).await;
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/ticket/{id}"),
            Some(&admin),
            Some(json!({ "status": "s".repeat(51) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/v1/auth/profile",
            Some(&admin),
            Some(json!({ "phone": "5".repeat(21) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_token_of_deleted_user_is_rejected() {
        let app = seeded_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(&admin),
            Some(json!({ "name": "Temp", "email": "temp@company.com", "password": "temp123" })),
        )
        .await;
        let token = login(&app, "temp@company.com", "temp123").await;
        let (status, _) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let id = created["id"].as_str().expect("id");
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/users/{id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_demoted_admin_loses_admin_routes() {
        let app = seeded_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let demo_admin = login(&app, "demo@example.com", "demo123").await;
        let (_, demo) = send(&app, Method::GET, "/api/v1/auth/me", Some(&demo_admin), None).await;
        assert_eq!(demo["isAdmin"], true);

        let client = json!({ "name": "Initech", "email": "it@initech.com" });
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/clients",
            Some(&demo_admin),
            Some(client.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let id = demo["id"].as_str().expect("id");
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/users/{id}"),
            Some(&admin),
            Some(json!({ "is_admin": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["isAdmin"], false);

        // Same token, but the role is read from storage on every request.
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/clients",
            Some(&demo_admin),
            Some(client),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "forbidden");
    }

    #[tokio::test]
    async fn test_last_login_advances_on_each_request() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;

        let (_, first) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let (_, second) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;

        let stamp = |body: &Value| {
            body["lastLogin"]
                .as_str()
                .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
                .expect("lastLogin timestamp")
        };
        assert!(stamp(&second) > stamp(&first));
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_numbers() {
        let app = seeded_app().await;
        let token = login(&app, AGENT_EMAIL, AGENT_PASSWORD).await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let app = app.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                let (status, body) = send(
                    &app,
                    Method::POST,
                    "/api/v1/ticket/create",
                    Some(&token),
                    Some(json!({ "title": format!("Load {i}"), "detail": "parallel" })),
                )
                .await;
                assert_eq!(status, StatusCode::CREATED);
                body["number"].as_i64().expect("number")
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.expect("join"));
        }
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), 16);
        assert_eq!(numbers.first(), Some(&1004));
        assert_eq!(numbers.last(), Some(&1019));
    }
}
