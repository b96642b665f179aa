//! The conversation manager: session/message lifecycle, context
//! assembly, summarization, and the search-service delegation that
//! turns a user's message into a persisted exchange.

use crate::context::{get_context, ConversationContext};
use crate::enhance::enhance_question;
use crate::error::ConversationError;
use crate::message::{ConversationMessage, MessageRole, MessageType};
use crate::session::{ConversationSession, SessionStatus};
use crate::summary::{render, ConversationSummary, SummarizationStrategy};
use layer0::content::Content;
use layer0::effect::Scope;
use layer0::id::{CollectionId, SessionId, UserId};
use layer0::state::StateStore;
use quarry_search::{SearchInput, SearchOutput, SearchService};
use quarry_tokens::estimate_tokens;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

const SESSION_KEY: &str = "session";
const SESSION_INDEX_KEY: &str = "session_index";
const MESSAGE_PREFIX: &str = "message:";
const SUMMARY_PREFIX: &str = "summary:";

/// Default sweep TTL: 30 days of inactivity.
pub const DEFAULT_TTL_SECS: u64 = 30 * 24 * 60 * 60;

fn message_key(id: &str) -> String {
    format!("{MESSAGE_PREFIX}{id}")
}

fn summary_key(id: &str) -> String {
    format!("{SUMMARY_PREFIX}{id}")
}

/// Milliseconds since the Unix epoch, used for session/message timestamps.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Owns session/message/summary persistence and implements spec.md
/// §4.H's operation list. Question-answering is delegated to a
/// [`SearchService`]; this crate owns the state machine, context
/// assembly, summarization, and enhancement around it.
pub struct ConversationManager {
    state: Arc<dyn StateStore>,
    search: Arc<SearchService>,
    model: String,
    ttl_secs: u64,
    context_window_threshold: f64,
    session_locks: RwLock<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl ConversationManager {
    /// Build a manager over `state` for persistence and `search` for
    /// answering. `model` is the model family token accounting is
    /// estimated against when a message doesn't already carry one.
    pub fn new(state: Arc<dyn StateStore>, search: Arc<SearchService>, model: impl Into<String>) -> Self {
        Self {
            state,
            search,
            model: model.into(),
            ttl_secs: DEFAULT_TTL_SECS,
            context_window_threshold: 0.8,
            session_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Override the idle TTL `cleanup_expired_sessions` sweeps against.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Override the fraction of `context_window_size` that triggers
    /// `summarize_if_needed`. Default 0.8, matching `Settings::context_window_threshold`.
    pub fn with_context_window_threshold(mut self, threshold: f64) -> Self {
        self.context_window_threshold = threshold;
        self
    }

    async fn session_lock(&self, session: &SessionId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.session_locks.read().await.get(session) {
            return lock.clone();
        }
        self.session_locks.write().await.entry(session.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    async fn read_value<T: serde::de::DeserializeOwned>(&self, scope: &Scope, key: &str) -> Result<Option<T>, ConversationError> {
        match self.state.read(scope, key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ConversationError::ValidationError(format!("corrupt state at '{key}': {e}"))),
            None => Ok(None),
        }
    }

    async fn write_value<T: serde::Serialize>(&self, scope: &Scope, key: &str, value: &T) -> Result<(), ConversationError> {
        let json = serde_json::to_value(value).map_err(|e| ConversationError::ValidationError(e.to_string()))?;
        self.state.write(scope, key, json).await?;
        Ok(())
    }

    async fn put_session(&self, session: &ConversationSession) -> Result<(), ConversationError> {
        self.write_value(&Scope::Session(session.id.clone()), SESSION_KEY, session).await
    }

    async fn put_message(&self, message: &ConversationMessage) -> Result<(), ConversationError> {
        self.write_value(&Scope::Session(message.session.clone()), &message_key(&message.id), message).await
    }

    async fn put_summary(&self, summary: &ConversationSummary) -> Result<(), ConversationError> {
        self.write_value(&Scope::Session(summary.session.clone()), &summary_key(&summary.id), summary).await
    }

    /// spec.md §4.H `create_session`: validates a non-empty name,
    /// persists the session, and records it in the global index
    /// `cleanup_expired_sessions` sweeps.
    pub async fn create_session(
        &self,
        id: SessionId,
        user: UserId,
        collection: CollectionId,
        name: impl Into<String>,
        context_window_size: u64,
    ) -> Result<ConversationSession, ConversationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConversationError::ValidationError("session name must not be empty".into()));
        }

        let session = ConversationSession::new(id.clone(), user, collection, name, context_window_size, now_ms());
        self.put_session(&session).await?;

        let mut index: Vec<SessionId> = self.read_value(&Scope::Global, SESSION_INDEX_KEY).await?.unwrap_or_default();
        if !index.contains(&id) {
            index.push(id);
            self.write_value(&Scope::Global, SESSION_INDEX_KEY, &index).await?;
        }

        tracing::debug!(session = %session.id, user = %session.user, "conversation session created");
        Ok(session)
    }

    /// Load a session by id.
    pub async fn get_session(&self, session: &SessionId) -> Result<ConversationSession, ConversationError> {
        self.read_value(&Scope::Session(session.clone()), SESSION_KEY).await?.ok_or_else(|| ConversationError::NotFound(session.clone()))
    }

    /// Every message in a session, chronologically, including ones a
    /// summary has marked `subsumed` (callers that need the live window
    /// only want `get_context` instead).
    pub async fn list_messages(&self, session: &SessionId) -> Result<Vec<ConversationMessage>, ConversationError> {
        let scope = Scope::Session(session.clone());
        let keys = self.state.list(&scope, MESSAGE_PREFIX).await?;
        let mut messages = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(message) = self.read_value::<ConversationMessage>(&scope, &key).await? {
                messages.push(message);
            }
        }
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    /// Every summary recorded for a session, in creation order.
    pub async fn list_summaries(&self, session: &SessionId) -> Result<Vec<ConversationSummary>, ConversationError> {
        let scope = Scope::Session(session.clone());
        let keys = self.state.list(&scope, SUMMARY_PREFIX).await?;
        let mut summaries = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(summary) = self.read_value::<ConversationSummary>(&scope, &key).await? {
                summaries.push(summary);
            }
        }
        summaries.sort_by_key(|s| s.created_at);
        Ok(summaries)
    }

    /// spec.md §4.H `add_message`: appends immutably, filling in
    /// `token_count` from the session's model family if the caller
    /// didn't supply one, and updates `updated_at`.
    pub async fn add_message(&self, session: &SessionId, mut message: ConversationMessage) -> Result<ConversationMessage, ConversationError> {
        let mut current = self.get_session(session).await?;
        if current.status == SessionStatus::Expired {
            return Err(ConversationError::SessionExpired(session.clone()));
        }
        if !current.status.accepts_messages() {
            return Err(ConversationError::MessagesNotAccepted(session.clone()));
        }

        if message.token_count.is_none() {
            if let Some(text) = message.text() {
                message.token_count = Some(estimate_tokens(text, &self.model));
            }
        }

        let lock = self.session_lock(session).await;
        let _guard = lock.lock().await;

        self.put_message(&message).await?;
        current.updated_at = now_ms();
        if current.status == SessionStatus::Created {
            current.status = SessionStatus::Active;
        }
        self.put_session(&current).await?;

        Ok(message)
    }

    /// spec.md §4.H `get_context`.
    pub async fn get_context(&self, session: &SessionId, up_to_message: Option<&str>) -> Result<ConversationContext, ConversationError> {
        let meta = self.get_session(session).await?;
        let messages = self.list_messages(session).await?;
        let summaries = self.list_summaries(session).await?;

        let cutoff = up_to_message.and_then(|id| messages.iter().find(|m| m.id == id).map(|m| m.created_at));

        Ok(get_context(session, &messages, &summaries, meta.context_window_size, cutoff))
    }

    /// spec.md §4.H `enhance_question`.
    pub async fn enhance_question(&self, session: &SessionId, question: &str) -> Result<String, ConversationError> {
        let history = self.list_messages(session).await?;
        Ok(enhance_question(&history, question))
    }

    /// spec.md §4.H `process_user_message`: enhances the question,
    /// delegates to the search service, and persists both messages
    /// atomically with propagated token accounting.
    ///
    /// The session lock is acquired only around the persistence step —
    /// never across the `search` call — so a slow LLM response never
    /// blocks other appends to the same session (spec.md §5).
    pub async fn process_user_message(
        &self,
        session: &SessionId,
        user_message_id: impl Into<String>,
        assistant_message_id: impl Into<String>,
        raw_question: &str,
    ) -> Result<(ConversationMessage, ConversationMessage, SearchOutput), ConversationError> {
        let mut meta = self.get_session(session).await?;
        if meta.status == SessionStatus::Expired {
            return Err(ConversationError::SessionExpired(session.clone()));
        }
        if !meta.status.accepts_messages() {
            return Err(ConversationError::MessagesNotAccepted(session.clone()));
        }

        let history = self.list_messages(session).await?;
        let enhanced = enhance_question(&history, raw_question);
        if enhanced != raw_question {
            tracing::debug!(session = %session, "enhanced an ambiguous follow-up question");
        }

        let input = SearchInput::new(enhanced, meta.collection.clone(), meta.user.clone());
        let output = self.search.search(input, None).await?;

        let now = now_ms();
        let user_message = ConversationMessage::new(
            user_message_id,
            session.clone(),
            MessageRole::User,
            MessageType::Question,
            Content::text(raw_question),
            now,
        )
        .with_token_count(estimate_tokens(raw_question, &self.model));

        let assistant_message = ConversationMessage::new(
            assistant_message_id,
            session.clone(),
            MessageRole::Assistant,
            MessageType::Answer,
            Content::text(output.answer.clone()),
            now,
        )
        .with_token_count(output.metadata.token_usage)
        .with_execution_time(output.metadata.execution_time);

        let lock = self.session_lock(session).await;
        let _guard = lock.lock().await;

        self.put_message(&user_message).await?;
        self.put_message(&assistant_message).await?;

        meta.updated_at = now;
        if meta.status == SessionStatus::Created {
            meta.status = SessionStatus::Active;
        }
        self.put_session(&meta).await?;

        Ok((user_message, assistant_message, output))
    }

    /// spec.md §4.H `summarize_if_needed`: runs when active-message
    /// tokens exceed `context_window_threshold * context_window_size`,
    /// marking the subsumed messages rather than deleting them.
    pub async fn summarize_if_needed(
        &self,
        session: &SessionId,
        strategy: SummarizationStrategy,
        keep_recent: usize,
        summary_id: impl Into<String>,
    ) -> Result<Option<ConversationSummary>, ConversationError> {
        let meta = self.get_session(session).await?;
        let messages = self.list_messages(session).await?;

        let active: Vec<&ConversationMessage> = messages.iter().filter(|m| !m.subsumed).collect();
        let total_tokens: u64 = active.iter().map(|m| m.token_count.unwrap_or(0)).sum();
        let threshold = (self.context_window_threshold * meta.context_window_size as f64) as u64;

        if total_tokens <= threshold || active.len() <= keep_recent {
            return Ok(None);
        }

        let subsume_count = active.len() - keep_recent;
        let to_subsume: Vec<ConversationMessage> = active.into_iter().take(subsume_count).cloned().collect();
        if to_subsume.is_empty() {
            return Ok(None);
        }

        let (text, key_topics, important_decisions, unresolved_questions) = render(&to_subsume, strategy, keep_recent);

        let subsumed_tokens: u64 = to_subsume.iter().map(|m| m.token_count.unwrap_or(0)).sum();
        let summary_tokens = estimate_tokens(&text, &self.model);
        let tokens_saved = subsumed_tokens as i64 - summary_tokens as i64;
        let covers_from = to_subsume.iter().map(|m| m.created_at).min().unwrap_or(0);

        let summary = ConversationSummary {
            id: summary_id.into(),
            session: session.clone(),
            summary: text,
            summarized_message_count: to_subsume.len(),
            tokens_saved,
            key_topics,
            important_decisions,
            unresolved_questions,
            strategy,
            covers_from,
            created_at: now_ms(),
        };

        let subsumed_ids: HashSet<&str> = to_subsume.iter().map(|m| m.id.as_str()).collect();

        let lock = self.session_lock(session).await;
        let _guard = lock.lock().await;

        self.put_summary(&summary).await?;
        for mut message in messages {
            if subsumed_ids.contains(message.id.as_str()) {
                message.subsumed = true;
                self.put_message(&message).await?;
            }
        }

        tracing::debug!(
            session = %session,
            subsumed = summary.summarized_message_count,
            tokens_saved = summary.tokens_saved,
            "session history summarized"
        );
        Ok(Some(summary))
    }

    /// spec.md §4.H `export_session`: `json`, `markdown`, or `text`.
    pub async fn export_session(&self, session: &SessionId, format: &str) -> Result<String, ConversationError> {
        let meta = self.get_session(session).await?;
        let messages = self.list_messages(session).await?;

        match format {
            "json" => {
                let payload = serde_json::json!({ "session": meta, "messages": messages });
                serde_json::to_string_pretty(&payload).map_err(|e| ConversationError::ValidationError(e.to_string()))
            }
            "markdown" => {
                let mut out = format!("# {}\n\n", meta.name);
                for message in &messages {
                    out.push_str(&format!("**{:?}**: {}\n\n", message.role, message.text().unwrap_or_default()));
                }
                Ok(out)
            }
            "text" => {
                let mut out = String::new();
                for message in &messages {
                    out.push_str(&format!("{:?}: {}\n", message.role, message.text().unwrap_or_default()));
                }
                Ok(out)
            }
            other => Err(ConversationError::ValidationError(format!("unknown export format '{other}'"))),
        }
    }

    /// spec.md §4.H `cleanup_expired_sessions`: sweeps every session in
    /// the global index and sets `expired` in bulk for idle, unpinned ones.
    pub async fn cleanup_expired_sessions(&self) -> Result<usize, ConversationError> {
        let index: Vec<SessionId> = self.read_value(&Scope::Global, SESSION_INDEX_KEY).await?.unwrap_or_default();
        let now = now_ms();
        let mut swept = 0;

        for session_id in &index {
            let Some(mut session) = self.read_value::<ConversationSession>(&Scope::Session(session_id.clone()), SESSION_KEY).await? else {
                continue;
            };
            if session.is_due_for_expiry(now, self.ttl_secs) {
                session.status = SessionStatus::Expired;
                self.put_session(&session).await?;
                swept += 1;
            }
        }

        tracing::debug!(swept, checked = index.len(), "expired session sweep complete");
        Ok(swept)
    }
}
