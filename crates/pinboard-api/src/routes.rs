use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::{AppState, comments, favorites, pins};

/// Build the resource routers. Each resource advertises exactly the methods
/// it supports; the CORS layer answers preflights without touching the
/// database, and every other method lands on the 405 fallback.
pub fn router(state: AppState) -> Router {
    let comments = Router::new()
        .route(
            "/comments",
            get(comments::list_comments)
                .post(comments::create_comment)
                .fallback(method_not_allowed),
        )
        .layer(cors(vec![Method::GET, Method::POST, Method::OPTIONS]));

    let favorites = Router::new()
        .route(
            "/favorites",
            get(favorites::list_favorites)
                .post(favorites::add_favorite)
                .delete(favorites::remove_favorite)
                .fallback(method_not_allowed),
        )
        .layer(cors(vec![
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]));

    let pins = Router::new()
        .route(
            "/pins",
            get(pins::list_pins)
                .post(pins::create_pin)
                .put(pins::increment_views)
                .fallback(method_not_allowed),
        )
        .layer(cors(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ]));

    Router::new()
        .merge(comments)
        .merge(favorites)
        .merge(pins)
        .with_state(state)
}

fn cors(methods: Vec<Method>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")])
        .max_age(Duration::from_secs(86400))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppStateInner;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use pinboard_db::Database;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let db = Database::open_in_memory().unwrap();
        Arc::new(AppStateInner { db })
    }

    fn seed_user(state: &AppState, username: &str) -> i64 {
        state
            .db
            .with_conn(|conn| {
                conn.execute("INSERT INTO users (username) VALUES (?1)", [username])?;
                Ok(conn.last_insert_rowid())
            })
            .unwrap()
    }

    fn seed_pin(state: &AppState, title: &str, author_id: i64, created_at: &str, views: i64) -> i64 {
        state
            .db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO pins (title, content, author_id, created_at, views)
                     VALUES (?1, 'body', ?2, ?3, ?4)",
                    (title, author_id, created_at, views),
                )?;
                Ok(conn.last_insert_rowid())
            })
            .unwrap()
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn unknown_method_returns_405() {
        let state = test_state();

        for (method, uri) in [
            ("DELETE", "/comments"),
            ("PUT", "/favorites"),
            ("PATCH", "/pins"),
        ] {
            let (status, body) = send(router(state.clone()), method, uri, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} {}", method, uri);
            assert_eq!(body, json!({ "error": "Method not allowed" }));
        }
    }

    #[tokio::test]
    async fn list_comments_requires_pin_id() {
        let state = test_state();
        let (status, body) = send(router(state), "GET", "/comments", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "pin_id is required" }));
    }

    #[tokio::test]
    async fn create_comment_trims_and_lists_in_order() {
        let state = test_state();
        let alice = seed_user(&state, "alice");
        let pin = seed_pin(&state, "Pin", alice, "2024-01-01 00:00:00", 0);

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/comments",
            Some(json!({ "pin_id": pin, "author_id": alice, "content": "  hi  " })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["content"], "hi");
        assert_eq!(body["author"], "alice");
        assert_eq!(body["author_id"], alice);

        let (status, body) = send(
            router(state),
            "GET",
            &format!("/comments?pin_id={}", pin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["comments"].as_array().unwrap().len(), 1);
        assert_eq!(body["comments"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn create_comment_rejects_missing_or_blank_fields() {
        let state = test_state();
        let alice = seed_user(&state, "alice");
        let pin = seed_pin(&state, "Pin", alice, "2024-01-01 00:00:00", 0);

        for payload in [
            json!({ "pin_id": pin, "author_id": alice }),
            json!({ "pin_id": pin, "author_id": alice, "content": "   " }),
            json!({ "author_id": alice, "content": "hi" }),
        ] {
            let (status, body) =
                send(router(state.clone()), "POST", "/comments", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                body,
                json!({ "error": "pin_id, author_id and content are required" })
            );
        }

        // Rejected requests must not have written anything.
        let count: i64 = state
            .db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn favorites_roundtrip_with_soft_delete() {
        let state = test_state();
        let alice = seed_user(&state, "alice");
        let pin = seed_pin(&state, "Pin", alice, "2024-01-01 00:00:00", 0);

        let payload = json!({ "user_id": alice, "pin_id": pin });

        // Two adds, both successful, one row.
        for _ in 0..2 {
            let (status, body) = send(
                router(state.clone()),
                "POST",
                "/favorites",
                Some(payload.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body, json!({ "success": true }));
        }

        let (status, body) = send(
            router(state.clone()),
            "GET",
            &format!("/favorites?user_id={}", alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "favorites": [pin] }));

        let (status, body) = send(
            router(state.clone()),
            "DELETE",
            "/favorites",
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (_, body) = send(
            router(state.clone()),
            "GET",
            &format!("/favorites?user_id={}", alice),
            None,
        )
        .await;
        assert_eq!(body, json!({ "favorites": [] }));

        // The row persists with a nulled owner.
        let (count, nulled): (i64, i64) = state
            .db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*), COUNT(*) FILTER (WHERE user_id IS NULL) FROM favorites",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!((count, nulled), (1, 1));

        // Deleting a favorite that no longer exists still reports success.
        let (status, body) = send(router(state), "DELETE", "/favorites", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
    }

    #[tokio::test]
    async fn favorites_require_both_ids() {
        let state = test_state();

        let (status, body) = send(router(state.clone()), "GET", "/favorites", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "user_id is required" }));

        let (status, body) = send(
            router(state),
            "POST",
            "/favorites",
            Some(json!({ "user_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "user_id and pin_id are required" }));
    }

    #[tokio::test]
    async fn list_pins_searches_and_sorts() {
        let state = test_state();
        let alice = seed_user(&state, "alice");
        seed_pin(&state, "Sunset Beach", alice, "2024-01-01 00:00:00", 5);
        seed_pin(&state, "City Lights", alice, "2024-01-02 00:00:00", 1);
        seed_pin(&state, "Beach Bonfire", alice, "2024-01-03 00:00:00", 9);

        let (status, body) = send(router(state.clone()), "GET", "/pins?search=BEACH", None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body["pins"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Beach Bonfire", "Sunset Beach"]);

        let (_, body) = send(router(state.clone()), "GET", "/pins?sort=views", None).await;
        let views: Vec<i64> = body["pins"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["views"].as_i64().unwrap())
            .collect();
        assert_eq!(views, [9, 5, 1]);

        // Unknown sort falls back to newest.
        let (_, body) = send(router(state), "GET", "/pins?sort=bogus", None).await;
        let first = body["pins"][0]["title"].as_str().unwrap();
        assert_eq!(first, "Beach Bonfire");
        assert!(body["pins"][0]["comment_count"].is_number());
    }

    #[tokio::test]
    async fn create_pin_validates_and_returns_record() {
        let state = test_state();
        let alice = seed_user(&state, "alice");

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/pins",
            Some(json!({ "title": "   ", "content": "body", "author_id": alice })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Title, content and author_id are required" })
        );

        let (status, body) = send(
            router(state),
            "POST",
            "/pins",
            Some(json!({ "title": " Sunset ", "content": "over the bay", "author_id": alice })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "Sunset");
        assert_eq!(body["views"], 0);
        assert_eq!(body["author"], "alice");
        // Creation response carries no comment count.
        assert!(body.get("comment_count").is_none());
    }

    #[tokio::test]
    async fn increment_views_handles_missing_and_unknown_pin() {
        let state = test_state();
        let alice = seed_user(&state, "alice");
        let pin = seed_pin(&state, "Pin", alice, "2024-01-01 00:00:00", 0);

        let (status, body) = send(router(state.clone()), "PUT", "/pins", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "pin_id is required" }));

        let (status, body) = send(
            router(state.clone()),
            "PUT",
            "/pins",
            Some(json!({ "pin_id": 999 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Pin not found" }));

        let (status, body) = send(
            router(state),
            "PUT",
            "/pins",
            Some(json!({ "pin_id": pin })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "views": 1 }));
    }

    #[tokio::test]
    async fn preflight_is_answered_without_storage() {
        let state = test_state();

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/pins")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("PUT"), "allow-methods: {}", methods);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
