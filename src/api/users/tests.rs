use crate::db::types::UserRole;
use crate::test_support;
use axum::http::{header, Method, StatusCode};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn register_then_login_returns_student_role() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "name": "Alice", "email": "a@x.com", "password": "secret1" })),
        ))
        .await
        .expect("register");

    let status = response.status();
    let registered = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {registered}");
    assert!(registered["token"].as_str().is_some_and(|token| !token.is_empty()));

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "secret1" })),
        ))
        .await
        .expect("login");

    let status = response.status();
    let login = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {login}");
    assert_eq!(login["role"], "Student");
    assert_eq!(login["name"], "Alice");
    assert!(login["id"].as_str().is_some());
    assert!(login["token"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    for (password, expected) in [("secret1", StatusCode::CREATED), ("other-pass", StatusCode::BAD_REQUEST)]
    {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/users/register",
                None,
                Some(json!({ "name": "Alice", "email": "a@x.com", "password": password })),
            ))
            .await
            .expect("register");
        assert_eq!(response.status(), expected);

        if expected == StatusCode::BAD_REQUEST {
            let body = test_support::read_json(response).await;
            assert_eq!(body["message"], "User already exists");
            assert_eq!(body["status"], 400);
        }
    }
}

#[tokio::test]
async fn login_failures_share_message() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "Alice", "a@x.com", UserRole::Student).await;

    let mut messages = Vec::new();
    for (email, password) in [("a@x.com", "wrong-password"), ("nobody@x.com", "password-1")] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/users/login",
                None,
                Some(json!({ "email": email, "password": password })),
            ))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        messages.push(test_support::read_json(response).await["message"].clone());
    }

    assert_eq!(messages[0], "Invalid email or password");
    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn register_rejects_invalid_payloads() {
    let ctx = test_support::setup_test_context().await;

    for body in [
        json!({ "name": "Alice", "email": "not-an-email", "password": "secret1" }),
        json!({ "name": "", "email": "a@x.com", "password": "secret1" }),
        json!({ "email": "a@x.com", "password": "secret1" }),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/users/register",
                None,
                Some(body),
            ))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn admin_creates_teacher() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(&ctx.state, "Root", "root@x.com", UserRole::Admin).await;
    let token = test_support::bearer_token(&admin, &ctx.state);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/users/create-teacher",
            Some(&token),
            Some(json!({ "name": "Tom", "email": "t@x.com", "password": "teach-pass" })),
        ))
        .await
        .expect("create teacher");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["message"], "Teacher created successfully");
    assert_eq!(created["teacher"]["role"], "Teacher");
    assert!(created["teacher"].get("hashed_password").is_none());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": "t@x.com", "password": "teach-pass" })),
        ))
        .await
        .expect("login");
    assert_eq!(test_support::read_json(response).await["role"], "Teacher");
}

#[tokio::test]
async fn non_admin_cannot_create_teacher() {
    let ctx = test_support::setup_test_context().await;
    let teacher = test_support::insert_user(&ctx.state, "Tom", "t@x.com", UserRole::Teacher).await;
    let token = test_support::bearer_token(&teacher, &ctx.state);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/users/create-teacher",
            Some(&token),
            Some(json!({ "name": "Eve", "email": "e@x.com", "password": "pass" })),
        ))
        .await
        .expect("create teacher");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(test_support::read_json(response).await["message"], "Access denied");
}

#[tokio::test]
async fn staff_list_users_by_role() {
    let ctx = test_support::setup_test_context().await;
    let teacher = test_support::insert_user(&ctx.state, "Tom", "t@x.com", UserRole::Teacher).await;
    test_support::insert_user(&ctx.state, "Alice", "a@x.com", UserRole::Student).await;
    test_support::insert_user(&ctx.state, "Bob", "b@x.com", UserRole::Student).await;
    let token = test_support::bearer_token(&teacher, &ctx.state);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/users/students", Some(&token), None))
        .await
        .expect("students");
    assert_eq!(response.status(), StatusCode::OK);
    let students = test_support::read_json(response).await;
    let emails: Vec<&str> =
        students.as_array().expect("array").iter().filter_map(|s| s["email"].as_str()).collect();
    assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    assert!(students[0].get("hashed_password").is_none());

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/users/teachers", Some(&token), None))
        .await
        .expect("teachers");
    let teachers = test_support::read_json(response).await;
    assert_eq!(teachers.as_array().map(Vec::len), Some(1));
    assert_eq!(teachers[0]["name"], "Tom");
}

#[tokio::test]
async fn students_cannot_list_users() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(&ctx.state, "Alice", "a@x.com", UserRole::Student).await;
    let token = test_support::bearer_token(&student, &ctx.state);

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/users/students", Some(&token), None))
        .await
        .expect("students");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_omits_password_hash() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(&ctx.state, "Alice", "a@x.com", UserRole::Student).await;
    let token = test_support::bearer_token(&student, &ctx.state);

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/users/profile", Some(&token), None))
        .await
        .expect("profile");

    assert_eq!(response.status(), StatusCode::OK);
    let profile = test_support::read_json(response).await;
    assert_eq!(profile["id"], student.id.as_str());
    assert_eq!(profile["email"], "a@x.com");
    assert!(profile.get("hashed_password").is_none());
}

#[tokio::test]
async fn gate_rejects_bad_credentials() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(&ctx.state, "Alice", "a@x.com", UserRole::Student).await;

    let expired = crate::core::security::create_access_token(
        &student.id,
        &student.name,
        student.role,
        ctx.state.settings().security(),
        Some(Duration::minutes(-5)),
    )
    .expect("expired token");
    let unknown_subject = crate::core::security::create_access_token(
        "ghost",
        "Ghost",
        UserRole::Admin,
        ctx.state.settings().security(),
        None,
    )
    .expect("ghost token");

    for token in [None, Some("not-a-jwt"), Some(expired.as_str()), Some(unknown_subject.as_str())] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/users/profile", token, None))
            .await
            .expect("profile");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(test_support::read_json(response).await["message"], "Not authorized");
    }
}
