mod common;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{rt, test, web, App, HttpServer};
use common::{account_with_token, init_app, staff, test_state, PASSWORD};
use extractable::auth::{AuthMiddleware, AuthResponse};
use extractable::models::{AccountRead, ExtraFields};
use extractable::routes::{self, health};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::net::TcpListener;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let state = test_state();
    let app = init_app(state.clone()).await;

    let register_payload = json!({
        "email": "integration@EXAMPLE.com",
        "name": "Integration User",
        "password": PASSWORD,
        "is_admin": true
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["email", "id", "is_admin", "is_user", "name"]);
    assert_eq!(body["email"], "integration@example.com");
    assert_eq!(body["is_admin"], true);
    assert_eq!(body["is_user"], true);

    let req_conflict = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(resp_conflict.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({
            "email": "integration@example.com",
            "password": PASSWORD
        }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    assert_eq!(resp_login.status(), StatusCode::OK);
    let login_response: AuthResponse = test::read_body_json(resp_login).await;
    assert!(!login_response.token.is_empty());
    assert_eq!(Some(login_response.user_id), body["id"].as_i64().map(|id| id as i32));

    let req_me = test::TestRequest::get()
        .uri("/api/users/me")
        .append_header(("Authorization", format!("Bearer {}", login_response.token)))
        .to_request();
    let resp_me = test::call_service(&app, req_me).await;
    assert_eq!(resp_me.status(), StatusCode::OK);
    let me: AccountRead = test::read_body_json(resp_me).await;
    assert_eq!(me.id, login_response.user_id);
    assert_eq!(me.name, "Integration User");
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let app = init_app(test_state()).await;

    let test_cases = vec![
        (
            json!({ "name": "Test", "password": PASSWORD }),
            StatusCode::BAD_REQUEST,
            "missing email",
        ),
        (
            json!({ "email": "test@example.com", "password": PASSWORD }),
            StatusCode::BAD_REQUEST,
            "missing name",
        ),
        (
            json!({ "email": "test@example.com", "name": "Test" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            json!({ "email": "invalid-email", "name": "Test", "password": PASSWORD }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "email": "test@example.com", "name": "", "password": PASSWORD }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty name",
        ),
        (
            json!({ "email": "test@example.com", "name": "a".repeat(101), "password": PASSWORD }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "name too long",
        ),
        (
            json!({ "email": "test@example.com", "name": "Test", "password": "123" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password too short",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_invalid_login_inputs() {
    let state = test_state();
    account_with_token(&state, "login_test_user@example.com", ExtraFields::default()).await;
    let app = init_app(state).await;

    let test_cases = vec![
        (json!({ "password": PASSWORD }), StatusCode::BAD_REQUEST, "missing email"),
        (
            json!({ "email": "login_test_user@example.com" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            json!({ "email": "invalid-email", "password": PASSWORD }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "email": "login_test_user@example.com", "password": "WrongPassword123!" }),
            StatusCode::UNAUTHORIZED,
            "incorrect password",
        ),
        (
            json!({ "email": "nonexistent@example.com", "password": PASSWORD }),
            StatusCode::UNAUTHORIZED,
            "non-existent user",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected_status, "Test case failed: {}", description);
    }
}

#[actix_rt::test]
async fn test_user_visibility() {
    let state = test_state();
    let (alice, alice_auth) =
        account_with_token(&state, "alice@example.com", ExtraFields::default()).await;
    let (bob, _) = account_with_token(&state, "bob@example.com", ExtraFields::default()).await;
    let (_, staff_auth) = staff(&state, "staff@example.com").await;
    let app = init_app(state).await;

    let req = test::TestRequest::get()
        .uri("/api/users")
        .append_header(alice_auth.clone())
        .to_request();
    let own: Vec<AccountRead> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(own.iter().map(|a| a.id).collect::<Vec<_>>(), vec![alice.id]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", bob.id))
        .append_header(alice_auth)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .append_header(staff_auth.clone())
        .to_request();
    let all: Vec<AccountRead> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(all.len(), 3);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", bob.id))
        .append_header(staff_auth)
        .to_request();
    let fetched: AccountRead = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(fetched.email, "bob@example.com");
}

#[actix_rt::test]
async fn test_protected_route_requires_token() {
    let state = test_state();

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let server_state = web::Data::new(state);
    let server_handle = rt::spawn(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(server_state.clone())
                .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
                .wrap(Logger::default())
                .service(health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                )
        })
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://127.0.0.1:{}/api/users/me", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("http://127.0.0.1:{}/api/admin/accounts", port))
        .bearer_auth("not-a-token")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    server_handle.abort();
}
