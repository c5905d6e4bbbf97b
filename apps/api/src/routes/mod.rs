pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route("/api/v1/interviews", post(handlers::handle_create_session))
        .route("/api/v1/interviews/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/interviews/:id/question",
            get(handlers::handle_current_question),
        )
        .route(
            "/api/v1/interviews/:id/answers",
            post(handlers::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:id/report",
            post(handlers::handle_generate_report).get(handlers::handle_get_report),
        )
        .route(
            "/api/v1/interviews/:id/history",
            get(handlers::handle_session_history),
        )
        .route(
            "/api/v1/resumes/:id/interviews",
            get(handlers::handle_resume_interviews),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::interview::answer_evaluator::AnswerEvaluator;
    use crate::interview::controller::SessionLifecycleController;
    use crate::interview::persistence::{NoopPersistence, PersistenceHandle};
    use crate::interview::question_generator::QuestionGenerator;
    use crate::interview::testing::{PendingGenerator, ScriptedEvaluator, StaticQuestionGenerator};

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/interview_test".into(),
            anthropic_api_key: "test-key".into(),
            port: 0,
            rust_log: "info".into(),
            db_max_connections: 1,
            llm_timeout_secs: 5,
            persistence_enabled: false,
        }
    }

    fn test_router(generator: Arc<dyn QuestionGenerator>, evaluator: Arc<dyn AnswerEvaluator>) -> Router {
        let config = test_config();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let (persistence, _writer) = PersistenceHandle::spawn(Arc::new(NoopPersistence));
        let interviews = Arc::new(SessionLifecycleController::new(
            generator,
            evaluator,
            persistence,
        ));
        build_router(AppState {
            db,
            config,
            interviews,
        })
    }

    fn default_router() -> Router {
        test_router(
            Arc::new(StaticQuestionGenerator::default()),
            Arc::new(ScriptedEvaluator::new(vec![80, 60, 70])),
        )
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(router: &Router, count: usize) -> String {
        let (status, body) = send(
            router,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({ "resume_text": "Rust engineer, 5 years", "question_count": count })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let router = default_router();
        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "interview-api");
    }

    #[tokio::test]
    async fn test_full_interview_over_http() {
        let router = default_router();
        let id = create(&router, 3).await;

        let (status, question) =
            send(&router, Method::GET, &format!("/api/v1/interviews/{id}/question"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(question["question_index"], 0);

        for index in 0..3 {
            let (status, body) = send(
                &router,
                Method::POST,
                &format!("/api/v1/interviews/{id}/answers"),
                Some(json!({ "question_index": index, "answer": format!("answer {index}") })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["has_next_question"], index < 2);
        }

        let (status, _) =
            send(&router, Method::GET, &format!("/api/v1/interviews/{id}/question"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, report) =
            send(&router, Method::POST, &format!("/api/v1/interviews/{id}/report"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["overall_score"], 70.0);

        let (status, fetched) =
            send(&router, Method::GET, &format!("/api/v1/interviews/{id}/report"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["overall_score"], 70.0);

        let (_, session) = send(&router, Method::GET, &format!("/api/v1/interviews/{id}"), None).await;
        assert_eq!(session["status"], "EVALUATED");
        assert_eq!(session["has_report"], true);
    }

    #[tokio::test]
    async fn test_out_of_order_answer_is_conflict() {
        let router = default_router();
        let id = create(&router, 3).await;

        let (status, body) = send(
            &router,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answers"),
            Some(json!({ "question_index": 1, "answer": "skipping ahead" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_request_validation() {
        let router = default_router();

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({ "resume_text": "   ", "question_count": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({ "resume_text": "Rust engineer", "question_count": 50 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    }

    #[tokio::test]
    async fn test_blank_answer_is_accepted() {
        let router = default_router();
        let id = create(&router, 3).await;

        let (status, body) = send(
            &router,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answers"),
            Some(json!({ "question_index": 0, "answer": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_index"], 1);
    }

    #[tokio::test]
    async fn test_negative_index_uses_error_envelope() {
        let router = default_router();
        let id = create(&router, 3).await;

        let (status, body) = send(
            &router,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answers"),
            Some(json!({ "question_index": -1, "answer": "first" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("-1"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let router = default_router();
        for uri in [
            "/api/v1/interviews/missing",
            "/api/v1/interviews/missing/question",
            "/api/v1/interviews/missing/report",
        ] {
            let (status, _) = send(&router, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_report_before_completion_is_conflict() {
        let router = default_router();
        let id = create(&router, 3).await;

        let (status, _) =
            send(&router, Method::POST, &format!("/api/v1/interviews/{id}/report"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) =
            send(&router, Method::GET, &format!("/api/v1/interviews/{id}/report"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_generation_times_out() {
        let router = test_router(
            Arc::new(PendingGenerator),
            Arc::new(ScriptedEvaluator::new(vec![])),
        );

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({ "resume_text": "Rust engineer", "question_count": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "TIMEOUT");
    }
}
