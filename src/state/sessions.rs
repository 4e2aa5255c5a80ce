use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    dao::models::UserId,
    state::play::{PlayError, PlaySession},
};

/// Version stamp of a stored session. Never reused, even after the session is discarded.
pub type Generation = u64;

struct StoredSession {
    session: PlaySession,
    generation: Generation,
    touched_at: Instant,
}

/// Session copied out of the registry together with the generation it was read at.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Copy of the stored session.
    pub session: PlaySession,
    /// Generation to hand back to [`PlaySessions::store_if_current`].
    pub generation: Generation,
}

/// Storage for play sessions, keyed by the identity of the player.
///
/// Entries are copied out on read and replaced wholesale on write, so no guard is ever held
/// across an `.await`. Writes are conditional on the generation observed when reading: a request
/// that lost a race against another one for the same player fails with
/// [`PlayError::StaleSession`] instead of overwriting the newer state. Sessions nobody touched
/// for longer than the idle TTL are dropped by [`PlaySessions::purge_idle`].
#[derive(Default)]
pub struct PlaySessions {
    sessions: DashMap<UserId, StoredSession>,
    next_generation: AtomicU64,
}

impl PlaySessions {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the session owned by `player`, if any.
    #[cfg(test)]
    pub(crate) fn get(&self, player: UserId) -> Option<PlaySession> {
        self.sessions
            .get(&player)
            .map(|entry| entry.session.clone())
    }

    /// Copy of the session owned by `player` along with its current generation.
    pub fn snapshot(&self, player: UserId) -> Option<SessionSnapshot> {
        self.sessions.get(&player).map(|entry| SessionSnapshot {
            session: entry.session.clone(),
            generation: entry.generation,
        })
    }

    /// Install `session` for `player` if the stored one is still at `expected`.
    ///
    /// `expected == None` means the caller saw no session at all.
    pub fn store_if_current(
        &self,
        player: UserId,
        expected: Option<Generation>,
        session: PlaySession,
    ) -> Result<(), PlayError> {
        self.commit(player, expected, Some(session))
    }

    /// Drop the session of `player` if the stored one is still at `expected`.
    pub fn discard_if_current(
        &self,
        player: UserId,
        expected: Option<Generation>,
    ) -> Result<(), PlayError> {
        self.commit(player, expected, None)
    }

    fn commit(
        &self,
        player: UserId,
        expected: Option<Generation>,
        next: Option<PlaySession>,
    ) -> Result<(), PlayError> {
        match self.sessions.entry(player) {
            Entry::Occupied(mut entry) if Some(entry.get().generation) == expected => match next {
                Some(session) => {
                    entry.insert(self.stamp(session));
                }
                None => {
                    entry.remove();
                }
            },
            Entry::Vacant(entry) if expected.is_none() => {
                if let Some(session) = next {
                    entry.insert(self.stamp(session));
                }
            }
            _ => return Err(PlayError::StaleSession),
        }
        Ok(())
    }

    fn stamp(&self, session: PlaySession) -> StoredSession {
        StoredSession {
            session,
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            touched_at: Instant::now(),
        }
    }

    /// Drop every session idle for at least `ttl`, returning how many were removed.
    pub fn purge_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, stored| stored.touched_at.elapsed() < ttl);
        before.saturating_sub(self.sessions.len())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no player has a session.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_get_and_discard() {
        let sessions = PlaySessions::new();
        assert!(sessions.get(1).is_none());

        sessions
            .store_if_current(1, None, PlaySession::new().deal(7))
            .unwrap();
        assert_eq!(sessions.get(1).unwrap().pending(), Some(7));
        assert!(sessions.get(2).is_none());

        let generation = sessions.snapshot(1).unwrap().generation;
        sessions.discard_if_current(1, Some(generation)).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn stale_generation_is_refused() {
        let sessions = PlaySessions::new();
        sessions.store_if_current(1, None, PlaySession::new()).unwrap();
        let seen = sessions.snapshot(1).unwrap().generation;

        sessions
            .store_if_current(1, Some(seen), PlaySession::new().deal(3))
            .unwrap();
        assert_eq!(
            sessions.store_if_current(1, Some(seen), PlaySession::new().deal(9)),
            Err(PlayError::StaleSession)
        );
        assert_eq!(
            sessions.discard_if_current(1, Some(seen)),
            Err(PlayError::StaleSession)
        );
        assert_eq!(sessions.get(1).unwrap().pending(), Some(3));
    }

    #[test]
    fn discarded_session_cannot_be_resurrected() {
        let sessions = PlaySessions::new();
        sessions
            .store_if_current(1, None, PlaySession::new().deal(3))
            .unwrap();
        let seen = sessions.snapshot(1).unwrap().generation;
        sessions.discard_if_current(1, Some(seen)).unwrap();

        assert_eq!(
            sessions.store_if_current(1, Some(seen), PlaySession::new().deal(3)),
            Err(PlayError::StaleSession)
        );
        assert!(sessions.get(1).is_none());

        sessions.store_if_current(1, None, PlaySession::new()).unwrap();
        assert_ne!(sessions.snapshot(1).unwrap().generation, seen);
        assert_eq!(
            sessions.store_if_current(1, None, PlaySession::new()),
            Err(PlayError::StaleSession)
        );
    }

    #[test]
    fn purge_only_drops_idle_sessions() {
        let sessions = PlaySessions::new();
        sessions.store_if_current(1, None, PlaySession::new()).unwrap();
        sessions.store_if_current(2, None, PlaySession::new()).unwrap();

        assert_eq!(sessions.purge_idle(Duration::from_secs(3600)), 0);
        assert_eq!(sessions.len(), 2);

        assert_eq!(sessions.purge_idle(Duration::ZERO), 2);
        assert!(sessions.is_empty());
    }
}
