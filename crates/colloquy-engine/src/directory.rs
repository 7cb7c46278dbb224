//! Chat directory: the session list and its activity ordering

use colloquy_chat::{Session, SessionId};

/// Holds the set of conversation sessions and their summary metadata.
///
/// Sessions are never removed. The list is kept sorted by `last_message_at`
/// descending; the sort is stable, so equal timestamps preserve prior
/// relative order (which for fresh directories is insertion order).
#[derive(Debug, Default)]
pub struct ChatDirectory {
    sessions: Vec<Session>,
}

impl ChatDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directory contents, e.g. from an initial collaborator load
    pub fn seed(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
        self.resort();
    }

    /// Add a session if its id is not already present
    pub fn insert(&mut self, session: Session) {
        if self.get(&session.id).is_some() {
            tracing::debug!(session_id = %session.id, "session already present, skipping insert");
            return;
        }
        self.sessions.push(session);
        self.resort();
    }

    /// Ordered view: most recent activity first
    pub fn list(&self) -> &[Session] {
        &self.sessions
    }

    /// Look up a session by id
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// Record activity on a session: update its timestamp and snippet, then
    /// re-sort.
    ///
    /// No-op for an unknown session. `last_message_at` never decreases, so a
    /// touch carrying an older timestamp than the current one only updates
    /// the snippet.
    pub fn touch(&mut self, id: &SessionId, last_message_at: i64, snippet: impl Into<String>) {
        let Some(session) = self.sessions.iter_mut().find(|s| &s.id == id) else {
            tracing::debug!(session_id = %id, "touch on unknown session, ignoring");
            return;
        };
        session.last_message_at = session.last_message_at.max(last_message_at);
        session.last_snippet = Some(snippet.into());
        self.resort();
    }

    // Vec::sort_by is stable, which the tie-break rule relies on.
    fn resort(&mut self) {
        self.sessions
            .sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, last_message_at: i64) -> Session {
        let mut s = Session::new(SessionId::from(id), format!("session {id}"));
        s.last_message_at = last_message_at;
        s
    }

    fn ids(dir: &ChatDirectory) -> Vec<&str> {
        dir.list().iter().map(|s| s.id.0.as_str()).collect()
    }

    #[test]
    fn test_list_sorted_by_activity_descending() {
        let mut dir = ChatDirectory::new();
        dir.seed(vec![session("a", 10), session("b", 30), session("c", 20)]);
        assert_eq!(ids(&dir), ["b", "c", "a"]);
    }

    #[test]
    fn test_touch_moves_session_to_top() {
        let mut dir = ChatDirectory::new();
        dir.seed(vec![session("a", 10), session("b", 30)]);
        dir.touch(&SessionId::from("a"), 40, "hello");
        assert_eq!(ids(&dir), ["a", "b"]);
        assert_eq!(dir.get(&SessionId::from("a")).unwrap().last_snippet.as_deref(), Some("hello"));
    }

    #[test]
    fn test_touch_unknown_session_is_noop() {
        let mut dir = ChatDirectory::new();
        dir.seed(vec![session("a", 10)]);
        dir.touch(&SessionId::from("zzz"), 99, "ghost");
        assert_eq!(ids(&dir), ["a"]);
        assert_eq!(dir.get(&SessionId::from("a")).unwrap().last_message_at, 10);
    }

    #[test]
    fn test_equal_timestamps_preserve_relative_order() {
        let mut dir = ChatDirectory::new();
        dir.seed(vec![session("a", 10), session("b", 10), session("c", 10)]);
        assert_eq!(ids(&dir), ["a", "b", "c"]);

        // A tying touch must not reshuffle the others
        dir.touch(&SessionId::from("b"), 10, "tie");
        assert_eq!(ids(&dir), ["a", "b", "c"]);
    }

    #[test]
    fn test_last_message_at_never_decreases() {
        let mut dir = ChatDirectory::new();
        dir.seed(vec![session("a", 50)]);
        dir.touch(&SessionId::from("a"), 20, "stale");
        let s = dir.get(&SessionId::from("a")).unwrap();
        assert_eq!(s.last_message_at, 50);
        // Snippet still updates
        assert_eq!(s.last_snippet.as_deref(), Some("stale"));
    }

    #[test]
    fn test_insert_ignores_duplicate_id() {
        let mut dir = ChatDirectory::new();
        dir.insert(session("a", 10));
        dir.insert(session("a", 99));
        assert_eq!(dir.list().len(), 1);
        assert_eq!(dir.get(&SessionId::from("a")).unwrap().last_message_at, 10);
    }
}
