//! Session Management
//!
//! A session owns one conversation. `ChatSession` pairs it with a shared
//! [`Agent`] and is the `send` / `reset` surface front ends talk to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::memory::Conversation;
use crate::message::Role;
use crate::reasoning::{Agent, TurnReport};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session metadata
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Session title (auto-generated or user-set)
    pub title: Option<String>,

    /// User/owner ID
    pub user_id: Option<String>,

    /// Model used for this session
    pub model: String,
}

/// A complete agent session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Session metadata
    pub metadata: SessionMetadata,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,

    /// Whether session is active
    pub active: bool,
}

impl Session {
    /// Create a new session
    pub fn new() -> Self {
        Self::with_conversation(Conversation::new(), "")
    }

    pub fn with_conversation(conversation: Conversation, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            conversation,
            metadata: SessionMetadata {
                model: model.into(),
                ..SessionMetadata::default()
            },
            created_at: now,
            updated_at: now,
            active: true,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Set session title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
        self.touch();
    }

    /// Get or generate title
    pub fn title(&self) -> String {
        self.metadata.title.clone().unwrap_or_else(|| {
            // Generate from first user message
            self.conversation
                .turns()
                .iter()
                .find(|t| t.role() == Role::User)
                .map(|t| {
                    let preview: String = t.content().chars().take(50).collect();
                    if t.content().chars().count() > 50 {
                        format!("{preview}...")
                    } else {
                        preview
                    }
                })
                .unwrap_or_else(|| {
                    let short: String = self.id.as_str().chars().take(8).collect();
                    format!("Session {short}")
                })
        })
    }

    /// End the session
    pub fn end(&mut self) {
        self.active = false;
        self.touch();
    }

    /// Turn count, pinned turns included
    pub fn turn_count(&self) -> usize {
        self.conversation.len()
    }

    /// Duration since creation
    pub fn duration(&self) -> chrono::Duration {
        self.updated_at - self.created_at
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-facing session: one conversation driven by a shared agent
pub struct ChatSession {
    agent: Arc<Agent>,
    session: Session,
}

impl ChatSession {
    pub fn new(agent: Arc<Agent>) -> Self {
        let session = agent.start_session();
        Self { agent, session }
    }

    /// Continue a previously stored session under this agent's configuration
    pub fn resume(agent: Arc<Agent>, mut session: Session) -> Self {
        agent.adopt(&mut session);
        Self { agent, session }
    }

    /// Send a user message and return the assistant's answer
    pub async fn send(&mut self, user_text: &str) -> Result<String> {
        self.send_with_report(user_text).await.map(|report| report.answer)
    }

    /// Like `send`, but also reports the tool rounds taken
    pub async fn send_with_report(&mut self, user_text: &str) -> Result<TurnReport> {
        let report = self
            .agent
            .run_turn(&mut self.session.conversation, user_text)
            .await?;
        self.session.touch();
        Ok(report)
    }

    /// Clear memory, keeping the system prompt
    pub fn reset(&mut self) {
        self.agent.reset(&mut self.session.conversation);
        self.session.touch();
        tracing::info!(session = %self.session.id, "Session reset");
    }

    /// Start over under new instructions; tool descriptions are appended
    pub fn change_instructions(&mut self, instructions: &str) {
        let conversation = &mut self.session.conversation;
        conversation.clear();
        conversation.set_system_prompt(self.agent.compose_system_prompt(instructions));
        self.session.touch();
        tracing::info!(session = %self.session.id, "System prompt replaced");
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}

/// Session store trait for persistence
pub trait SessionStore: Send + Sync {
    /// Save a session
    fn save(&self, session: &Session) -> Result<()>;

    /// Load a session by ID
    fn load(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a session
    fn delete(&self, id: &SessionId) -> Result<()>;

    /// List sessions for a user, most recently active first
    fn list(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<Session>>;
}

fn newest_first(mut sessions: Vec<Session>, user_id: Option<&str>, limit: usize) -> Vec<Session> {
    sessions.retain(|s| user_id.is_none_or(|uid| s.metadata.user_id.as_deref() == Some(uid)));
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sessions.truncate(limit);
    sessions
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Session("session store lock poisoned".into())
}

/// In-memory session store (for development/testing)
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.remove(id);
        Ok(())
    }

    fn list(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(newest_first(sessions.values().cloned().collect(), user_id, limit))
    }
}

/// Stores each session as `<id>.json` in a directory
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open (and create if needed) a store directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SessionId) -> Result<PathBuf> {
        let name = id.as_str();
        let valid = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if name.is_empty() || !name.chars().all(valid) {
            return Err(AgentError::Session(format!("invalid session id: {name}")));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let path = self.path_for(&session.id)?;
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        let path = self.path_for(id)?;
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        match std::fs::remove_file(self.path_for(id)?) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn list(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(AgentError::from)
                .and_then(|json| serde_json::from_str::<Session>(&json).map_err(AgentError::from))
            {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session");
                }
            }
        }
        Ok(newest_first(sessions, user_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLimits;
    use crate::message::Turn;

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert!(session.active);
        assert_eq!(session.turn_count(), 0);
    }

    #[test]
    fn test_title_from_first_user_turn() {
        let mut conversation = Conversation::with_system_prompt("sys", MemoryLimits::default());
        conversation.append(Turn::user("é".repeat(60)));
        let session = Session::with_conversation(conversation, "llama3");

        let title = session.title();
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        let session = Session::new();
        let id = session.id.clone();

        store.save(&session).unwrap();

        let loaded = store.load(&id).unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().id, id);

        store.delete(&id).unwrap();
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();

        let mut conversation = Conversation::with_system_prompt("sys", MemoryLimits::default());
        conversation.append(Turn::user("hello"));
        conversation.append(Turn::tool("add", "5"));
        let session = Session::with_conversation(conversation, "llama3");
        store.save(&session).unwrap();

        let loaded = store.load(&session.id).unwrap().unwrap();
        assert_eq!(loaded.conversation.turns(), session.conversation.turns());
        assert_eq!(loaded.conversation.system_prompt(), Some("sys"));
        assert_eq!(store.list(None, 10).unwrap().len(), 1);

        store.delete(&session.id).unwrap();
        assert!(store.load(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let err = store.load(&SessionId::from_string("../etc/passwd")).unwrap_err();
        assert!(matches!(err, AgentError::Session(_)));
    }
}
