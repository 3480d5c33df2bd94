use std::net::SocketAddr;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    auth::{
        self,
        middleware::{require_admin, require_auth},
    },
    config::AppConfig,
    orders, products,
    state::AppState,
};

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth::handlers::me_routes())
        .merge(products::handlers::read_routes())
        .merge(orders::handlers::routes())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // require_auth is the outer layer, so require_admin always sees an identity
    let admin = Router::new()
        .merge(auth::handlers::admin_routes())
        .merge(products::handlers::admin_routes())
        .merge(orders::handlers::admin_routes())
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::handlers::public_routes())
                .merge(protected)
                .nest("/admin", admin)
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        request_id = %Uuid::new_v4(),
                        status = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{claims::Role, password::hash_password, repo::UserRepo, repo_types::NewUser};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

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

    async fn register_and_login(app: &Router, email: &str) -> String {
        let credentials = json!({ "email": email, "password": "password123" });
        let (status, _) = send(app, "POST", "/api/users/register", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::CREATED);
        login(app, email).await
    }

    async fn login(app: &Router, email: &str) -> String {
        let credentials = json!({ "email": email, "password": "password123" });
        let (status, body) = send(app, "POST", "/api/users/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn seed_admin(state: &AppState, email: &str) {
        state
            .users
            .create(NewUser {
                email: email.into(),
                password_hash: hash_password("password123").unwrap(),
                role: Role::Admin,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let (status, _) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn order_lifecycle_over_http() {
        let app = build_app(AppState::fake());

        let (status, body) = send(&app, "GET", "/api/orders", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

        let token = register_and_login(&app, "buyer@example.com").await;

        let (status, body) = send(&app, "GET", "/api/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, order) = send(
            &app,
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({ "product_id": 7, "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["status"], "Pending");
        assert_eq!(order["quantity"], 2);
        assert_eq!(order["user_id"], 1);
        let id = order["id"].as_i64().unwrap();

        let cancel_uri = format!("/api/orders/{id}/cancel");
        let (status, body) = send(&app, "PUT", &cancel_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Cancelled");

        let (status, body) = send(&app, "PUT", &cancel_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn invalid_order_is_rejected() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "zero@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({ "product_id": 7, "quantity": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ORDER");
    }

    #[tokio::test]
    async fn order_missing_fields_is_invalid_order() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "partial@example.com").await;

        for payload in [json!({ "product_id": 7 }), json!({ "quantity": 2 })] {
            let (status, body) = send(&app, "POST", "/api/orders", Some(&token), Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "INVALID_ORDER");
        }

        let (status, body) = send(&app, "GET", "/api/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn unparseable_input_gets_error_envelope() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "typo@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({ "product_id": "seven", "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(&app, "GET", "/api/orders/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(&app, "POST", "/api/users/login", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "mallory@example.com").await;
        let tampered = format!("{token}x");

        let (status, body) = send(&app, "GET", "/api/users/me", Some(&tampered), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_ne!(body["error"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn admin_routes_require_admin_role() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        let user_token = register_and_login(&app, "user@example.com").await;
        let (_, order) = send(
            &app,
            "POST",
            "/api/orders",
            Some(&user_token),
            Some(json!({ "product_id": 3, "quantity": 1 })),
        )
        .await;
        let status_uri = format!("/api/admin/orders/{}/status", order["id"]);
        let completed = json!({ "status": "Completed" });

        let (status, _) = send(&app, "PUT", &status_uri, None, Some(completed.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send(&app, "PUT", &status_uri, Some(&user_token), Some(completed.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        seed_admin(&state, "root@example.com").await;
        let admin_token = login(&app, "root@example.com").await;

        let (status, body) = send(
            &app,
            "PUT",
            &status_uri,
            Some(&admin_token),
            Some(json!({ "status": "shipped" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_STATUS");

        let (status, body) =
            send(&app, "PUT", &status_uri, Some(&admin_token), Some(completed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Completed");

        let (status, body) = send(&app, "GET", "/api/admin/orders", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admin_manages_catalog() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        seed_admin(&state, "shop@example.com").await;
        let admin_token = login(&app, "shop@example.com").await;
        let user_token = register_and_login(&app, "browser@example.com").await;

        let widget = json!({ "name": "Widget", "price": 4.5, "stock": 3 });
        let (status, _) =
            send(&app, "POST", "/api/admin/products", Some(&user_token), Some(widget.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, product) =
            send(&app, "POST", "/api/admin/products", Some(&admin_token), Some(widget)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["description"], "");

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/products",
            Some(&admin_token),
            Some(json!({ "name": "Freebie", "price": 0.0, "stock": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, list) = send(&app, "GET", "/api/products", Some(&user_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let uri = format!("/api/admin/products/{}", product["id"]);
        let (status, _) = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/products/{}", product["id"]),
            Some(&user_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
