//! Role gating, route access decisions and the impersonation overlay.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    body_json, get, post_json, request, test_app, test_app_with_roles, StoredRoles, TestUser,
};
use serde_json::json;
use tower::ServiceExt;

const OVERLAY_HEADER: &str = "x-impersonation";

async fn route_access(path: &str, token: Option<&str>) -> serde_json::Value {
    let uri = format!(
        "/api/v1/route-access?path={}",
        url::form_urlencoded::byte_serialize(path.as_bytes()).collect::<String>()
    );
    let response = test_app().oneshot(get(&uri, token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_anonymous_is_sent_to_login() {
    let body = route_access("/staff/work-orders", None).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(
        body["redirect_to"],
        "/staff/login?redirect=%2Fstaff%2Fwork-orders"
    );

    let body = route_access("/customer/vehicles", None).await;
    assert_eq!(
        body["redirect_to"],
        "/customer/login?redirect=%2Fcustomer%2Fvehicles"
    );
}

#[tokio::test]
async fn test_public_paths_are_allowed() {
    let body = route_access("/staff/login", None).await;
    assert_eq!(body["allowed"], true);
    assert!(body["redirect_to"].is_null());
}

#[tokio::test]
async fn test_wrong_portal_redirects_home() {
    let customer = TestUser::customer().token();
    let body = route_access("/staff/dashboard", Some(&customer)).await;
    assert_eq!(body["redirect_to"], "/customer/dashboard");

    let staff = TestUser::staff().token();
    let body = route_access("/staff/admin/users", Some(&staff)).await;
    assert_eq!(body["redirect_to"], "/staff/dashboard");

    let body = route_access("/staff/inventory", Some(&staff)).await;
    assert_eq!(body["allowed"], true);
}

#[tokio::test]
async fn test_inactive_account_redirect() {
    let token = TestUser::with_role("inactive_customer").token();
    let body = route_access("/customer/dashboard", Some(&token)).await;
    assert_eq!(body["redirect_to"], "/account-inactive");
}

#[tokio::test]
async fn test_route_access_rejects_relative_path() {
    let response = test_app()
        .oneshot(get("/api/v1/route-access?path=staff", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_requires_token() {
    for uri in ["/api/v1/me", "/api/v1/inventory", "/api/v1/admin/profiles", "/api/v1/session"] {
        let response = test_app().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_customer_cannot_reach_staff_routes() {
    let token = TestUser::customer().token();
    for uri in ["/api/v1/inventory", "/api/v1/part-sales/00000000-0000-0000-0000-000000000000"] {
        let response = test_app().oneshot(get(uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body_json(response).await["error"], "forbidden");
    }
}

#[tokio::test]
async fn test_staff_cannot_reach_admin_routes() {
    let token = TestUser::staff().token();
    let response = test_app()
        .oneshot(get("/api/v1/admin/security-alerts", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_inactive_accounts_only_see_session() {
    let user = TestUser::with_role("inactive_staff");
    let token = user.token();

    let response = test_app().oneshot(get("/api/v1/me", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["message"], "Account is inactive");

    let response = test_app()
        .oneshot(get("/api/v1/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["real"]["role"], "inactive_staff");
    assert_eq!(body["real"]["user_id"], user.id.to_string());
    assert_eq!(body["impersonating"], false);
}

#[tokio::test]
async fn test_deactivation_overrides_token_role() {
    let user = TestUser::staff();
    let token = user.token();
    let app = || test_app_with_roles(&[], StoredRoles::default().with(&user, "inactive_staff"));

    let response = app()
        .oneshot(get("/api/v1/inventory", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(get("/api/v1/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["real"]["role"], "inactive_staff");
}

#[tokio::test]
async fn test_role_change_overrides_token_role() {
    let user = TestUser::admin();
    let token = user.token();
    let response = test_app_with_roles(&[], StoredRoles::default().with(&user, "customer"))
        .oneshot(get("/api/v1/admin/security-alerts", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_test_mode_overlay() {
    let admin = TestUser::admin();
    let token = admin.token();

    let response = test_app()
        .oneshot(post_json(
            "/api/v1/admin/test-mode",
            Some(&token),
            json!({ "role": "customer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let overlay = body_json(response).await["overlay"]
        .as_str()
        .unwrap()
        .to_string();

    let mut req = get("/api/v1/session", Some(&token));
    req.headers_mut()
        .insert(OVERLAY_HEADER, overlay.parse().unwrap());
    let response = test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["real"]["role"], "admin");
    assert_eq!(body["effective"]["role"], "test_customer");
    assert_eq!(body["effective"]["user_id"], admin.id.to_string());
    assert_eq!(body["mode"], "test");

    // Route decisions follow the effective identity
    let mut req = get("/api/v1/route-access?path=%2Fstaff%2Fdashboard", Some(&token));
    req.headers_mut()
        .insert(OVERLAY_HEADER, overlay.parse().unwrap());
    let body = body_json(test_app().oneshot(req).await.unwrap()).await;
    assert_eq!(body["redirect_to"], "/customer/dashboard");
}

#[tokio::test]
async fn test_overlay_ignored_for_non_admin() {
    let admin_token = TestUser::admin().token();
    let response = test_app()
        .oneshot(post_json(
            "/api/v1/admin/test-mode",
            Some(&admin_token),
            json!({ "role": "admin" }),
        ))
        .await
        .unwrap();
    let overlay = body_json(response).await["overlay"]
        .as_str()
        .unwrap()
        .to_string();

    let staff_token = TestUser::staff().token();
    let mut req = get("/api/v1/session", Some(&staff_token));
    req.headers_mut()
        .insert(OVERLAY_HEADER, overlay.parse().unwrap());
    let body = body_json(test_app().oneshot(req).await.unwrap()).await;
    assert_eq!(body["effective"]["role"], "staff");
    assert_eq!(body["impersonating"], false);
}

#[tokio::test]
async fn test_malformed_overlay_is_bad_request() {
    let token = TestUser::admin().token();
    let mut req = get("/api/v1/session", Some(&token));
    req.headers_mut()
        .insert(OVERLAY_HEADER, "%%%not-base64%%%".parse().unwrap());
    let response = test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staff_cannot_start_test_mode() {
    let token = TestUser::staff().token();
    let response = test_app()
        .oneshot(post_json(
            "/api/v1/admin/test-mode",
            Some(&token),
            json!({ "role": "customer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self() {
    let admin = TestUser::admin();
    let token = admin.token();
    let response = test_app()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/admin/profiles/{}/toggle-active", admin.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_preflight_on_api() {
    let response = test_app()
        .oneshot(
            axum::http::Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/vehicles")
                .header(header::ORIGIN, "https://shop.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
