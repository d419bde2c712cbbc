//! In-memory registry of live screening sessions.
//!
//! Each session sits behind its own mutex so concurrent messages to one session
//! are serialized while different sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::llm_client::GenerationOptions;
use crate::screening::machine::Conversation;
use crate::screening::prompts::PromptBuilder;

/// Outcome of handing the finished profile to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    /// The conversation has not ended yet.
    NotAttempted,
    Saved,
    Failed { error: String },
}

pub struct Session {
    pub conversation: Conversation,
    pub save_status: SaveStatus,
}

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    prompts: PromptBuilder,
    options: GenerationOptions,
}

impl SessionRegistry {
    pub fn new(prompts: PromptBuilder, options: GenerationOptions) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            prompts,
            options,
        }
    }

    /// Creates a fresh conversation and registers it under its session id.
    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let conversation = Conversation::new(self.prompts.clone(), self.options.clone());
        let session_id = conversation.session_id();
        let handle = Arc::new(Mutex::new(Session {
            conversation,
            save_status: SaveStatus::NotAttempted,
        }));

        self.sessions
            .write()
            .await
            .insert(session_id, handle.clone());
        (session_id, handle)
    }

    pub async fn get(&self, session_id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn remove(&self, session_id: &Uuid) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::machine::ConversationState;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(PromptBuilder::default(), GenerationOptions::default())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = registry();
        let (id, handle) = registry.create().await;

        let fetched = registry.get(&id).await.expect("session registered");
        assert!(Arc::ptr_eq(&handle, &fetched));

        let session = fetched.lock().await;
        assert_eq!(session.conversation.session_id(), id);
        assert_eq!(session.conversation.state(), ConversationState::Greeting);
        assert_eq!(session.save_status, SaveStatus::NotAttempted);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let registry = registry();
        let (a, _) = registry.create().await;
        let (b, _) = registry.create().await;
        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);

        registry
            .get(&a)
            .await
            .unwrap()
            .lock()
            .await
            .conversation
            .start();

        let b_state = registry.get(&b).await.unwrap().lock().await.conversation.state();
        assert_eq!(b_state, ConversationState::Greeting);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = registry();
        let (id, _) = registry.create().await;
        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.get(&id).await.is_none());
        assert!(registry.get(&Uuid::new_v4()).await.is_none());
    }

    #[test]
    fn test_save_status_serializes_with_tag() {
        let json = serde_json::to_value(SaveStatus::Failed {
            error: "disk full".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "failed", "error": "disk full"})
        );
    }
}
