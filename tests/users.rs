#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::{bearer, create_task, login, multipart, png_bytes, register_user, test_state, PASSWORD};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use taskdesk::models::TaskFilter;

#[actix_rt::test]
async fn test_register_returns_sanitized_user_and_token() {
    let state = test_state();
    let app = test_app!(state);

    let payload = json!({ "name": "A", "email": "a@x.com", "password": "longenough1" });
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["name"], "A");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["age"], 0);
    let user = body["user"].as_object().unwrap();
    assert!(!user.contains_key("password"));
    assert!(!user.contains_key("password_hash"));
    assert!(!user.contains_key("tokens"));
    assert!(!user.contains_key("avatar"));

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_rt::test]
async fn test_register_validation() {
    let state = test_state();
    let app = test_app!(state);

    let invalid = [
        json!({ "name": "A", "email": "not-an-email", "password": "longenough1" }),
        json!({ "name": "A", "email": "a@x.com", "password": "short" }),
        json!({ "name": "A", "email": "a@x.com", "password": "MyPassWord99" }),
        json!({ "name": "   ", "email": "a@x.com", "password": "longenough1" }),
        json!({ "name": "A", "email": "a@x.com", "password": "longenough1", "age": -1 }),
        json!({ "email": "a@x.com", "password": "longenough1" }),
    ];
    for payload in invalid {
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }

    let req = test::TestRequest::post()
        .uri("/users")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_login_issues_new_token_and_fails_generically() {
    let state = test_state();
    let app = test_app!(state);
    let user = register_user(&app, "Ada", "Ada@Example.com").await;
    assert_eq!(user.email, "ada@example.com");

    let token = login(&app, "ada@example.com", PASSWORD)
        .await
        .expect("login with registered credentials");
    assert_ne!(token, user.token);

    let mut failures = Vec::new();
    for (email, password) in [("ada@example.com", "wrongpass1"), ("nobody@example.com", PASSWORD)] {
        let req = test::TestRequest::post()
            .uri("/users/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        failures.push(body);
    }
    assert_eq!(failures[0], json!({ "error": "Login failed" }));
    assert_eq!(failures[0], failures[1]);
}

#[actix_rt::test]
async fn test_logout_ends_only_current_session() {
    let state = test_state();
    let app = test_app!(state);
    let user = register_user(&app, "Ada", "ada@example.com").await;
    let second = login(&app, &user.email, PASSWORD).await.unwrap();
    let third = login(&app, &user.email, PASSWORD).await.unwrap();

    let req = test::TestRequest::post()
        .uri("/users/logout")
        .insert_header(bearer(&user.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let me = |token: &str| {
        test::TestRequest::get()
            .uri("/users/me")
            .insert_header(bearer(token))
            .to_request()
    };
    assert_eq!(
        test::call_service(&app, me(user.token.as_str())).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(test::call_service(&app, me(second.as_str())).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/users/logoutAll")
        .insert_header(bearer(&second))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    for token in [second.as_str(), third.as_str()] {
        assert_eq!(
            test::call_service(&app, me(token)).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}

#[actix_rt::test]
async fn test_protected_routes_require_bearer_token() {
    let state = test_state();
    let app = test_app!(state);
    let user = register_user(&app, "Ada", "ada@example.com").await;

    let req = test::TestRequest::get().uri("/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header((header::AUTHORIZATION, user.token.clone()))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_update_profile() {
    let state = test_state();
    let app = test_app!(state);
    let user = register_user(&app, "Ada", "ada@example.com").await;
    register_user(&app, "Bea", "bea@example.com").await;

    let patch = |body: Value| {
        test::TestRequest::patch()
            .uri("/users/me")
            .insert_header(bearer(&user.token))
            .set_json(body)
            .to_request()
    };

    let resp = test::call_service(&app, patch(json!({ "name": " Ada L ", "age": 36 }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Ada L");
    assert_eq!(body["age"], 36);
    assert!(body.get("password_hash").is_none());

    for rejected in [
        json!({ "location": "London" }),
        json!({ "email": "bea@example.com" }),
        json!({ "password": "password123" }),
        json!({ "age": -3 }),
    ] {
        let resp = test::call_service(&app, patch(rejected.clone())).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "patch {}", rejected);
    }

    let resp = test::call_service(&app, patch(json!({ "password": "brandnew99" }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(login(&app, "ada@example.com", PASSWORD).await.is_none());
    assert!(login(&app, "ada@example.com", "brandnew99").await.is_some());
}

#[actix_rt::test]
async fn test_delete_account_removes_tasks_and_sessions() {
    let state = test_state();
    let app = test_app!(state);
    let user = register_user(&app, "Ada", "ada@example.com").await;
    let other = register_user(&app, "Bea", "bea@example.com").await;
    create_task(&app, &user.token, "one", false).await;
    create_task(&app, &user.token, "two", true).await;
    create_task(&app, &other.token, "keep", false).await;

    let req = test::TestRequest::delete()
        .uri("/users/me")
        .insert_header(bearer(&user.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "ada@example.com");

    let remaining = state
        .store
        .list_tasks(user.id, &TaskFilter::default())
        .await
        .unwrap();
    assert!(remaining.is_empty());
    let others = state
        .store
        .list_tasks(other.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(others.len(), 1);

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&user.token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert!(login(&app, "ada@example.com", PASSWORD).await.is_none());
}

#[actix_rt::test]
async fn test_avatar_upload_fetch_and_delete() {
    let state = test_state();
    let app = test_app!(state);
    let user = register_user(&app, "Ada", "ada@example.com").await;
    let avatar_uri = format!("/users/{}/avatar", user.id);

    let req = test::TestRequest::get().uri(&avatar_uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let (content_type, body) = multipart("avatar", "me.png", &png_bytes(40, 30));
    let req = test::TestRequest::post()
        .uri("/users/me/avatar")
        .insert_header(bearer(&user.token))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&avatar_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let stored = test::read_body(resp).await;
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (250, 250));

    let req = test::TestRequest::delete()
        .uri("/users/me/avatar")
        .insert_header(bearer(&user.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&avatar_uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_rejected_avatar_leaves_stored_one_unchanged() {
    let state = test_state();
    let app = test_app!(state);
    let user = register_user(&app, "Ada", "ada@example.com").await;

    let (content_type, body) = multipart("avatar", "me.jpg", &png_bytes(10, 10));
    let req = test::TestRequest::post()
        .uri("/users/me/avatar")
        .insert_header(bearer(&user.token))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let original = state.store.find_avatar(user.id).await.unwrap().unwrap();

    let oversized = vec![0u8; 1_000_001];
    let rejected = [
        multipart("avatar", "big.png", &oversized),
        multipart("avatar", "me.gif", &png_bytes(10, 10)),
        multipart("avatar", "broken.png", b"not an image at all"),
        multipart("photo", "me.png", &png_bytes(10, 10)),
    ];
    for (content_type, body) in rejected {
        let req = test::TestRequest::post()
            .uri("/users/me/avatar")
            .insert_header(bearer(&user.token))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let current = state.store.find_avatar(user.id).await.unwrap().unwrap();
    assert_eq!(current, original);
}

#[actix_rt::test]
async fn test_avatar_fetch_for_unknown_user() {
    let state = test_state();
    let app = test_app!(state);

    for uri in [
        format!("/users/{}/avatar", uuid::Uuid::new_v4()),
        "/users/not-a-uuid/avatar".to_string(),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}

#[actix_rt::test]
async fn test_pages_and_health() {
    let state = test_state();
    let app = test_app!(state);

    for uri in ["/", "/users/login", "/health"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK, "{}", uri);
    }
}
