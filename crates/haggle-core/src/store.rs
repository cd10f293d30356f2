//! In-memory handshake state
//!
//! The store is owned by a seller service instance and passed into the
//! handshake components explicitly; there is no process-wide global state.
//! All session mutation goes through `DashMap` entry locking, so concurrent
//! requests bearing the same session id serialize on that key instead of
//! racing on a read-modify-write.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use haggle_types::{
    AccessKey, CompletedTransaction, DownloadArtifact, HaggleError, NegotiationSession,
    PaymentToken, Price, ResourceId, Result, SessionId,
};

/// State for active sessions, completed transactions, and released artifacts
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, NegotiationSession>,
    completed: DashMap<PaymentToken, CompletedTransaction>,
    artifacts: DashMap<AccessKey, DownloadArtifact>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an offer against a session, creating it on first touch.
    ///
    /// Returns the session state after the update. The whole read-modify-
    /// write happens under the entry lock for the session key.
    pub fn record_offer(
        &self,
        session_id: &SessionId,
        resource_id: &ResourceId,
        offer: Price,
    ) -> NegotiationSession {
        match self.sessions.entry(session_id.clone()) {
            Entry::Occupied(mut occupied) => {
                let session = occupied.get_mut();
                session.resource_id = resource_id.clone();
                session.record_offer(offer);
                session.clone()
            }
            Entry::Vacant(vacant) => vacant
                .insert(NegotiationSession::open(
                    session_id.clone(),
                    resource_id.clone(),
                    offer,
                ))
                .clone(),
        }
    }

    /// Attach an issued payment token to a session, creating it on first touch.
    ///
    /// Sessions carry at most one live token; a re-issue replaces the
    /// previous one.
    pub fn attach_token(
        &self,
        session_id: &SessionId,
        resource_id: &ResourceId,
        agreed_price: Price,
        token: PaymentToken,
    ) {
        match self.sessions.entry(session_id.clone()) {
            Entry::Occupied(mut occupied) => {
                let session = occupied.get_mut();
                if session.payment_token.is_some() {
                    tracing::warn!(session = %session_id, "replacing live payment token");
                }
                session.resource_id = resource_id.clone();
                session.current_offer = agreed_price;
                session.payment_token = Some(token);
            }
            Entry::Vacant(vacant) => {
                let mut session = NegotiationSession::open(
                    session_id.clone(),
                    resource_id.clone(),
                    agreed_price,
                );
                session.payment_token = Some(token);
                vacant.insert(session);
            }
        }
    }

    /// Snapshot of a session's current state
    pub fn session(&self, session_id: &SessionId) -> Option<NegotiationSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Scan active sessions for one carrying the given payment token
    pub fn find_by_token(&self, token: &PaymentToken) -> Option<NegotiationSession> {
        self.sessions
            .iter()
            .find(|entry| entry.payment_token.as_ref() == Some(token))
            .map(|entry| entry.clone())
    }

    /// Whether a completed transaction exists for the token
    pub fn is_completed(&self, token: &PaymentToken) -> bool {
        self.completed.contains_key(token)
    }

    /// Record a completed transaction and delete its session.
    ///
    /// The insert is atomic per token: of two racing release attempts,
    /// exactly one wins and the other fails `AlreadyCompleted`.
    pub fn complete(&self, transaction: CompletedTransaction) -> Result<()> {
        let session_key = self
            .find_by_token(&transaction.payment_token)
            .map(|s| s.session_id);

        match self.completed.entry(transaction.payment_token.clone()) {
            Entry::Occupied(_) => Err(HaggleError::AlreadyCompleted {
                token: transaction.payment_token.0.clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(transaction);
                if let Some(key) = session_key {
                    self.sessions.remove(&key);
                }
                Ok(())
            }
        }
    }

    /// Look up a completed transaction by token
    pub fn completed_transaction(&self, token: &PaymentToken) -> Option<CompletedTransaction> {
        self.completed.get(token).map(|t| t.clone())
    }

    /// Register a released artifact under its access key
    pub fn insert_artifact(&self, artifact: DownloadArtifact) {
        self.artifacts.insert(artifact.access_key.clone(), artifact);
    }

    /// Look up a released artifact by access key
    pub fn artifact(&self, key: &AccessKey) -> Option<DownloadArtifact> {
        self.artifacts.get(key).map(|a| a.clone())
    }

    /// Number of active sessions
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Number of completed transactions
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}
