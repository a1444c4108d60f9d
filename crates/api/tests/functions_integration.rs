//! Serverless function endpoint tests.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    body_json, body_text, post_json, request, test_app, test_app_with_roles, StoredRoles, TestUser,
};
use serde_json::json;
use tower::ServiceExt;

const FUNCTIONS: &[&str] = &[
    "send-invitation",
    "send-notification",
    "store-webauthn-challenge",
    "manage-rls-policies",
];

fn assert_cors(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "authorization, x-client-info, apikey, content-type"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
}

#[tokio::test]
async fn test_preflight_returns_ok_with_cors_headers() {
    for name in FUNCTIONS {
        let response = test_app()
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::OPTIONS)
                    .uri(format!("/functions/v1/{}", name))
                    .header(header::ORIGIN, "https://shop.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{}", name);
        assert_cors(&response);
        assert_eq!(body_text(response).await, "ok");
    }
}

#[tokio::test]
async fn test_non_post_method_not_allowed() {
    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let response = test_app()
            .oneshot(request(method.clone(), "/functions/v1/send-notification", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        assert_cors(&response);
        assert_eq!(body_json(response).await, json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/send-notification",
            None,
            json!({ "to": "c@example.com", "subject": "Hi", "message": "Hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_cors(&response);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_forged_token_is_unauthorized() {
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/store-webauthn-challenge",
            Some("not.a.jwt"),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_function_not_found() {
    let token = TestUser::admin().token();
    let response = test_app()
        .oneshot(post_json("/functions/v1/drop-database", Some(&token), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
}

#[tokio::test]
async fn test_customer_cannot_send_notifications() {
    let token = TestUser::customer().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/send-notification",
            Some(&token),
            json!({ "to": "c@example.com", "subject": "Hi", "message": "Hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_cors(&response);
}

#[tokio::test]
async fn test_inactive_staff_is_forbidden() {
    let token = TestUser::with_role("inactive_staff").token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/send-notification",
            Some(&token),
            json!({ "to": "c@example.com", "subject": "Hi", "message": "Hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Account is inactive");
}

#[tokio::test]
async fn test_deactivated_staff_with_stale_token_is_forbidden() {
    let user = TestUser::staff();
    let response = test_app_with_roles(&[], StoredRoles::default().with(&user, "inactive_staff"))
        .oneshot(post_json(
            "/functions/v1/send-notification",
            Some(&user.token()),
            json!({ "to": "c@example.com", "subject": "Hi", "message": "Hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Account is inactive");
}

#[tokio::test]
async fn test_bad_json_is_bad_request() {
    let token = TestUser::staff().token();
    let response = test_app()
        .oneshot(request(
            Method::POST,
            "/functions/v1/send-notification",
            Some(&token),
            Some("{\"to\": "),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
}

#[tokio::test]
async fn test_missing_fields_are_bad_request() {
    let token = TestUser::staff().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/send-notification",
            Some(&token),
            json!({ "to": "c@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_notification_with_email_disabled_succeeds() {
    let token = TestUser::staff().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/send-notification",
            Some(&token),
            json!({
                "to": "customer@example.com",
                "subject": "2015 Honda Accord",
                "message": "Your car is ready for pickup.",
                "category": "vehicle_ready"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(body_json(response).await, json!({ "success": true }));
}

#[tokio::test]
async fn test_staff_cannot_invite_staff() {
    let token = TestUser::staff().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/send-invitation",
            Some(&token),
            json!({ "email": "tech@example.com", "role": "staff" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invitation_without_backend_is_server_error() {
    let token = TestUser::admin().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/send-invitation",
            Some(&token),
            json!({ "email": "tech@example.com", "role": "staff" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    assert_eq!(body_json(response).await["error"], "Failed to send invitation");
}

#[tokio::test]
async fn test_rls_policies_are_admin_only() {
    let token = TestUser::staff().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/manage-rls-policies",
            Some(&token),
            json!({ "action": "list", "table": "vehicles" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rls_policies_reject_unknown_table() {
    let token = TestUser::admin().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/manage-rls-policies",
            Some(&token),
            json!({ "action": "enable", "table": "pg_authid" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Table 'pg_authid' is not managed"
    );
}

#[tokio::test]
async fn test_webauthn_challenge_validation() {
    let token = TestUser::customer().token();
    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/store-webauthn-challenge",
            Some(&token),
            json!({ "challenge": "short", "challenge_type": "registration" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test_app()
        .oneshot(post_json(
            "/functions/v1/store-webauthn-challenge",
            Some(&token),
            json!({ "challenge": "dGVzdC1jaGFsbGVuZ2UtYnl0ZXM", "challenge_type": "login" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limit_applies_per_user() {
    let app = common::test_app_with(&[("security.rate_limit_per_minute", "2")]);
    let token = TestUser::staff().token();
    let body = json!({ "to": "c@example.com", "subject": "Hi", "message": "Hello" });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/functions/v1/send-notification", Some(&token), body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(post_json("/functions/v1/send-notification", Some(&token), body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_cors(&response);

    // Another caller has a separate budget
    let other = TestUser::staff().token();
    let response = app
        .oneshot(post_json("/functions/v1/send-notification", Some(&other), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
