use axum::{Router, middleware};

use crate::state::SharedState;

pub mod auth;
pub mod docs;
pub mod health;
pub mod play;
pub mod quizzes;
pub mod users;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// Every `/api` route goes through [`auth::require_token`].
pub fn router(state: SharedState) -> Router<()> {
    let api_router = quizzes::router()
        .merge(play::router())
        .merge(users::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    let docs_router = docs::router(state.clone());

    health::router()
        .merge(api_router)
        .merge(docs_router)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{NewQuizEntity, NewUserEntity},
            quiz_store::{QuizStore, memory::MemoryQuizStore},
        },
        state::AppState,
    };

    const TOKEN: &str = "secret";

    async fn app() -> Router<()> {
        let store = MemoryQuizStore::new();
        let user = store
            .insert_user(NewUserEntity {
                username: "ana".into(),
                is_admin: false,
                token: TOKEN.into(),
            })
            .await
            .unwrap();
        store
            .insert_quiz(NewQuizEntity {
                question: "Capital of France".into(),
                answer: "Paris".into(),
                author_id: Some(user.id),
            })
            .await
            .unwrap();
        let state = AppState::new(AppConfig::default());
        state.set_quiz_store(Arc::new(store)).await;
        router(state)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-quiz-token", TOKEN);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn api_requires_a_known_token() {
        let app = app().await;

        let missing = Request::builder()
            .uri("/api/quizzes")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(missing).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .uri("/api/quizzes")
            .header("x-quiz-token", "nope")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let health = Request::builder()
            .uri("/healthcheck")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(health).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn play_round_trip_over_http() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(request("POST", "/api/play/check", Some(json!({"answer": "x"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(request("POST", "/api/play/new", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let dealt = json_body(response).await;
        assert_eq!(dealt["score"], 0);
        assert_eq!(dealt["quiz"]["question"], "Capital of France");
        assert!(dealt["quiz"].get("answer").is_none());

        let response = app
            .clone()
            .oneshot(request("POST", "/api/play/check", Some(json!({"answer": " paris"}))))
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await,
            json!({"result": true, "score": 1, "quizId": 1, "answer": " paris"})
        );

        let response = app
            .oneshot(request("GET", "/api/play/next", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!({"nomore": true, "score": 1}));
    }

    #[tokio::test]
    async fn blank_quiz_is_rejected_and_valid_one_created() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/quizzes",
                Some(json!({"question": "  ", "answer": "x"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/quizzes",
                Some(json!({"question": "2+2", "answer": "4"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["author"]["username"], "ana");

        let response = app
            .oneshot(request("GET", "/api/quizzes/99", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
