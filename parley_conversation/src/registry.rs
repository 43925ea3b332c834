//! Per-user session registry.
//!
//! Maps each user to their preference record and to at most one dialogue
//! session. Both maps are sharded (`DashMap`), so different users never
//! contend on a global lock; each session sits behind its own async mutex,
//! which serializes the calls of a single user. Map guards are released
//! before any `.await`.

use std::sync::Arc;

use dashmap::DashMap;
use parley_core::{DialogueLength, LLMProvider, SelectionStep, Topic, UserId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ConversationError, Result};
use crate::history::Turn;
use crate::preferences::PreferenceRecord;
use crate::session::{DialogueSession, Reply, SessionSettings};

pub type SessionHandle = Arc<Mutex<DialogueSession>>;

/// Outcome of [`SessionRegistry::get_or_create`].
pub enum Readiness {
    Ready(SessionHandle),
    Pending(SelectionStep),
}

pub struct SessionRegistry {
    provider: Arc<dyn LLMProvider>,
    settings: SessionSettings,
    defaults: PreferenceRecord,
    preferences: DashMap<UserId, PreferenceRecord>,
    sessions: DashMap<UserId, SessionHandle>,
}

impl SessionRegistry {
    /// Create a registry whose users start with topic `Casual` and the shortest length.
    #[must_use]
    pub fn new(provider: Arc<dyn LLMProvider>, settings: SessionSettings) -> Self {
        Self {
            provider,
            settings,
            defaults: PreferenceRecord::new(Some(Topic::default()), Some(DialogueLength::default())),
            preferences: DashMap::new(),
            sessions: DashMap::new(),
        }
    }

    /// Preferences new users start with. `None` fields must be selected explicitly.
    #[must_use]
    pub const fn with_defaults(mut self, defaults: PreferenceRecord) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The user's preference record, created from the defaults on first contact.
    #[must_use]
    pub fn preferences(&self, user: UserId) -> PreferenceRecord {
        *self.preferences.entry(user).or_insert_with(|| {
            debug!("First contact from user {user}, seeding preferences");
            self.defaults
        })
    }

    /// Remember a topic for the user's next session.
    pub fn select_topic(&self, user: UserId, raw: &str) -> Result<Topic> {
        let topic: Topic = raw
            .parse()
            .map_err(|_| ConversationError::InvalidSelection(raw.trim().to_string()))?;
        self.preferences.entry(user).or_insert(self.defaults).topic = Some(topic);
        info!("User {user} selected topic {topic}");
        Ok(topic)
    }

    /// Remember a dialogue length for the user's next session.
    pub fn select_length(&self, user: UserId, raw: &str) -> Result<DialogueLength> {
        let length: DialogueLength = raw
            .parse()
            .map_err(|_| ConversationError::InvalidSelection(raw.trim().to_string()))?;
        self.preferences.entry(user).or_insert(self.defaults).length = Some(length);
        info!("User {user} selected dialogue length {length}");
        Ok(length)
    }

    /// The user's session, materialized from their preferences when missing.
    ///
    /// Returns the next selection step instead while preferences are incomplete.
    pub fn get_or_create(&self, user: UserId) -> Readiness {
        if let Some(handle) = self.get(user) {
            return Readiness::Ready(handle);
        }

        let preferences = self.preferences(user);
        let Some((topic, length)) = preferences.selection() else {
            let step = preferences
                .next_step()
                .unwrap_or(SelectionStep::SelectTopic);
            debug!("User {user} not ready, next step: {step}");
            return Readiness::Pending(step);
        };

        let handle = self
            .sessions
            .entry(user)
            .or_insert_with(|| self.new_session(topic, length.turns()))
            .value()
            .clone();
        Readiness::Ready(handle)
    }

    /// Replace any session of the user with a fresh active one.
    pub fn initialize(&self, user: UserId, topic: Topic, turn_budget: usize) -> SessionHandle {
        let handle = self.new_session(topic, turn_budget);
        if self.sessions.insert(user, Arc::clone(&handle)).is_some() {
            info!("Replaced previous session of user {user}");
        }
        handle
    }

    /// Initialize a session from the user's preferences.
    pub fn start(&self, user: UserId) -> Result<SessionHandle> {
        let preferences = self.preferences(user);
        match (preferences.selection(), preferences.next_step()) {
            (Some((topic, length)), _) => Ok(self.initialize(user, topic, length.turns())),
            (None, step) => Err(ConversationError::NotReady(
                step.unwrap_or(SelectionStep::SelectTopic),
            )),
        }
    }

    #[must_use]
    pub fn get(&self, user: UserId) -> Option<SessionHandle> {
        self.sessions.get(&user).map(|entry| Arc::clone(entry.value()))
    }

    /// Submit a user turn, creating the session lazily when preferences allow it.
    pub async fn submit(&self, user: UserId, text: &str) -> Result<Reply> {
        let handle = match self.get_or_create(user) {
            Readiness::Ready(handle) => handle,
            Readiness::Pending(step) => return Err(ConversationError::NotReady(step)),
        };
        let mut session = handle.lock().await;
        session.submit(text).await
    }

    /// End the user's current dialogue early.
    ///
    /// Without a session this reports the missing selection step first, and
    /// `NoSession` only once preferences are complete.
    pub async fn request_termination(&self, user: UserId, final_note: &str) -> Result<Reply> {
        let Some(handle) = self.get(user) else {
            return Err(self
                .preferences(user)
                .next_step()
                .map_or(ConversationError::NoSession, ConversationError::NotReady));
        };
        let mut session = handle.lock().await;
        session.request_termination(final_note).await
    }

    /// Transcript of the user's current session.
    pub async fn history(&self, user: UserId) -> Option<Vec<Turn>> {
        let handle = self.get(user)?;
        let session = handle.lock().await;
        Some(session.history())
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn new_session(&self, topic: Topic, turn_budget: usize) -> SessionHandle {
        Arc::new(Mutex::new(DialogueSession::new(
            Arc::clone(&self.provider),
            topic,
            turn_budget,
            &self.settings,
        )))
    }
}
