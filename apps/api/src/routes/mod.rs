pub mod diagnostics;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;
use crate::storage::handlers as candidates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/diagnostics", get(diagnostics::diagnostics_handler))
        // Screening sessions
        .route("/api/v1/sessions", post(handlers::handle_start_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_send_message),
        )
        .route("/api/v1/sessions/:id/save", post(handlers::handle_save_session))
        // Stored candidates
        .route("/api/v1/candidates", get(candidates::handle_list_candidates))
        .route(
            "/api/v1/candidates/stats",
            get(candidates::handle_candidate_stats),
        )
        .route(
            "/api/v1/candidates/export",
            get(candidates::handle_export_candidates),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::{GenerationOptions, LlmError, TextGenerator};
    use crate::screening::profile::CandidateProfile;
    use crate::screening::prompts::PromptBuilder;
    use crate::screening::session::SessionRegistry;
    use crate::storage::{CandidateStore, JsonFileStore, StorageError};

    const INTAKE: [&str; 7] = [
        "Jane Doe",
        "jane@x.com",
        "555-1234",
        "3",
        "Backend Engineer",
        "Austin, TX",
        "Python, Go",
    ];

    struct OfflineLlm;

    #[async_trait]
    impl TextGenerator for OfflineLlm {
        async fn generate(
            &self,
            _system: &str,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 401,
                message: "invalid x-api-key".to_string(),
            })
        }
    }

    /// JSON store that can be told to fail, to exercise save retries.
    struct FlakyStore {
        inner: JsonFileStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl CandidateStore for FlakyStore {
        async fn save(&self, profile: &CandidateProfile) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::other("disk unavailable")));
            }
            self.inner.save(profile).await
        }

        async fn list(&self) -> Result<Vec<CandidateProfile>, StorageError> {
            self.inner.list().await
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    fn test_config() -> Config {
        Config {
            anthropic_api_key: "sk-test".to_string(),
            model_name: "claude-sonnet-4-5".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            llm_timeout: Duration::from_secs(5),
            company_name: "TalentScout".to_string(),
            database_url: None,
            data_storage_path: "unused.json".into(),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn app_with_store(store: Arc<dyn CandidateStore>) -> Router {
        let config = test_config();
        build_router(AppState {
            llm: Arc::new(OfflineLlm),
            store,
            sessions: SessionRegistry::new(
                PromptBuilder::new(config.company_name.clone()),
                config.generation_options(),
            ),
            config,
        })
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, bytes.to_vec())
    }

    async fn call_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, bytes) = call(app, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn start(app: &Router) -> String {
        let (status, body) = call_json(app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn say(app: &Router, id: &str, message: &str) -> (StatusCode, Value) {
        call_json(
            app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/messages"),
            Some(json!({ "message": message })),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        let (status, body) = call_json(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "screener");
    }

    #[tokio::test]
    async fn test_start_session_greets() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        let (status, body) = call_json(&app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["reply"].as_str().unwrap().contains("Welcome to TalentScout"));
        assert_eq!(body["state"], json!({"stage": "collecting", "index": 0}));
    }

    #[tokio::test]
    async fn test_unknown_session_is_404_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        let id = uuid::Uuid::new_v4();
        let (status, body) = say(&app, &id.to_string(), "hello").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_full_session_is_saved_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        let id = start(&app).await;

        for input in INTAKE {
            let (status, body) = say(&app, &id, input).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.get("saved").is_none());
        }
        let (_, summary) =
            call_json(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(summary["questions_generated"], 3);
        assert_eq!(summary["state"]["stage"], "asking_question");
        assert_eq!(summary["save_status"]["status"], "not_attempted");

        for answer in ["first answer", "second answer", "third answer"] {
            say(&app, &id, answer).await;
        }
        let (_, summary) =
            call_json(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(summary["state"]["stage"], "ended");
        assert_eq!(summary["answers_provided"], 3);
        assert_eq!(summary["save_status"]["status"], "saved");

        let (status, list) = call_json(&app, Method::GET, "/api/v1/candidates", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["backend"], "json_file");
        assert_eq!(list["candidates"][0]["full_name"], "Jane Doe");
        assert_eq!(list["candidates"][0]["technical_answers"][2], "third answer");

        let (_, found) = call_json(
            &app,
            Method::GET,
            "/api/v1/candidates?email=JANE@X.COM",
            None,
        )
        .await;
        assert_eq!(found["candidates"].as_array().unwrap().len(), 1);

        let (_, stats) = call_json(&app, Method::GET, "/api/v1/candidates/stats", None).await;
        assert_eq!(stats["total_candidates"], 1);
        assert_eq!(stats["experience_distribution"]["mid_level"], 1);

        let (status, headers, csv) =
            call(&app, Method::GET, "/api/v1/candidates/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let csv = String::from_utf8(csv).unwrap();
        assert!(csv.starts_with("full_name,email,"));
        assert!(csv.contains("question_3,answer_3"));
        assert!(csv.contains("third answer"));
    }

    #[tokio::test]
    async fn test_exit_saves_partial_profile_once() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        let id = start(&app).await;
        say(&app, &id, "Jane Doe").await;

        let (_, body) = say(&app, &id, "bye").await;
        assert_eq!(body["state"]["stage"], "ended");
        assert_eq!(body["saved"], true);
        assert!(body["reply"].as_str().unwrap().contains("Jane Doe"));

        let (_, again) = say(&app, &id, "hello?").await;
        assert!(again.get("saved").is_none());
        assert!(again["reply"].as_str().unwrap().contains("already ended"));

        let (_, list) = call_json(&app, Method::GET, "/api/v1/candidates", None).await;
        assert_eq!(list["candidates"].as_array().unwrap().len(), 1);
        assert!(list["candidates"][0]["email"].is_null());
    }

    #[tokio::test]
    async fn test_failed_save_reports_notice_and_can_retry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FlakyStore {
            inner: JsonFileStore::new(dir.path().join("c.json")),
            failing: AtomicBool::new(true),
        });
        let app = app_with_store(store.clone());
        let id = start(&app).await;

        let (status, _) =
            call_json(&app, Method::POST, &format!("/api/v1/sessions/{id}/save"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        say(&app, &id, "Jane Doe").await;
        let (status, body) = say(&app, &id, "quit").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], false);
        assert!(body["notice"].as_str().unwrap().contains("try saving again"));
        assert!(body["reply"].as_str().unwrap().contains("Jane Doe"));

        let (_, summary) =
            call_json(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(summary["save_status"]["status"], "failed");

        store.failing.store(false, Ordering::SeqCst);
        let (status, body) =
            call_json(&app, Method::POST, &format!("/api/v1/sessions/{id}/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], true);

        call_json(&app, Method::POST, &format!("/api/v1/sessions/{id}/save"), None).await;
        let (_, list) = call_json(&app, Method::GET, "/api/v1/candidates", None).await;
        assert_eq!(list["candidates"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        let id = start(&app).await;
        let uri = format!("/api/v1/sessions/{id}");

        let (status, _) = call_json(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call_json(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call_json(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        let id = start(&app).await;
        let (status, body) = say(&app, &id, &"x".repeat(6000)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_diagnostics_reports_unreachable_llm() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_store(Arc::new(JsonFileStore::new(dir.path().join("c.json"))));
        start(&app).await;

        let (status, body) = call_json(&app, Method::GET, "/api/v1/diagnostics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], false);
        assert_eq!(body["llm"]["reachable"], false);
        assert!(body["llm"]["error"].as_str().unwrap().contains("invalid x-api-key"));
        assert_eq!(body["config"]["valid"], true);
        assert_eq!(body["storage"]["reachable"], true);
        assert_eq!(body["storage"]["candidate_count"], 0);
        assert_eq!(body["active_sessions"], 1);
    }
}
