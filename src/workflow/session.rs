use super::draft::DraftListing;
use super::steps::DraftStep;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Which step groups an edit re-enters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    /// Plan image and seller contact (workflow steps 2-3)
    Media,
    /// Flat details and rooms (workflow steps 4 onward)
    Details,
}

/// Whether the session builds a new listing or edits a persisted one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WorkflowMode {
    Create,
    Edit {
        advertisement_id: i64,
        flat_id: i64,
        scope: EditScope,
    },
}

/// One in-progress draft-collection session. A session belongs to exactly
/// one operator; there is no shared mutable draft state across sessions.
#[derive(Debug, Clone)]
pub struct DraftSession {
    pub operator_id: i64,
    pub draft_id: Uuid,
    pub mode: WorkflowMode,
    pub current_step: DraftStep,
    pub draft: DraftListing,
    pub updated_at: DateTime<Utc>,
}

/// Session store keyed by (operator id, draft id). Abandoned sessions are
/// reclaimed by [`SessionStore::purge_expired`] after the configured TTL.
pub struct SessionStore {
    sessions: DashMap<(i64, Uuid), DraftSession>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Start a fresh session for the operator at the given entry step
    pub fn create(
        &self,
        operator_id: i64,
        mode: WorkflowMode,
        entry_step: DraftStep,
        draft: DraftListing,
    ) -> DraftSession {
        let session = DraftSession {
            operator_id,
            draft_id: Uuid::new_v4(),
            mode,
            current_step: entry_step,
            draft,
            updated_at: Utc::now(),
        };
        self.sessions
            .insert((operator_id, session.draft_id), session.clone());
        session
    }

    pub fn get(&self, operator_id: i64, draft_id: Uuid) -> Option<DraftSession> {
        self.sessions
            .get(&(operator_id, draft_id))
            .map(|entry| entry.clone())
    }

    /// Persist the session back after a step, refreshing its TTL clock
    pub fn save(&self, mut session: DraftSession) {
        session.updated_at = Utc::now();
        self.sessions
            .insert((session.operator_id, session.draft_id), session);
    }

    /// Discard the session without persisting the draft
    pub fn remove(&self, operator_id: i64, draft_id: Uuid) -> Option<DraftSession> {
        self.sessions.remove(&(operator_id, draft_id)).map(|(_, s)| s)
    }

    /// Drop sessions idle for longer than the TTL. Returns how many were
    /// reclaimed.
    pub fn purge_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.updated_at >= cutoff);
        let purged = before - self.sessions.len();
        if purged > 0 {
            debug!(purged, "Purged expired draft sessions");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new(Duration::minutes(30));
        let session = store.create(
            1,
            WorkflowMode::Create,
            DraftStep::SubmitUrl,
            DraftListing::default(),
        );
        let fetched = store.get(1, session.draft_id).unwrap();
        assert_eq!(fetched.current_step, DraftStep::SubmitUrl);
        // Another operator cannot see the session
        assert!(store.get(2, session.draft_id).is_none());
    }

    #[test]
    fn test_purge_expired() {
        let store = SessionStore::new(Duration::minutes(30));
        let mut session = store.create(
            1,
            WorkflowMode::Create,
            DraftStep::SubmitUrl,
            DraftListing::default(),
        );
        session.updated_at = Utc::now() - Duration::hours(2);
        store
            .sessions
            .insert((session.operator_id, session.draft_id), session);

        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_discards_draft() {
        let store = SessionStore::new(Duration::minutes(30));
        let session = store.create(
            1,
            WorkflowMode::Create,
            DraftStep::SubmitUrl,
            DraftListing::default(),
        );
        assert!(store.remove(1, session.draft_id).is_some());
        assert!(store.get(1, session.draft_id).is_none());
    }
}
