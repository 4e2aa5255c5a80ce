pub mod play;
pub mod sessions;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::quiz_store::QuizStore, error::ServiceError};

pub use self::play::{AnswerOutcome, DealStep, PlayError, PlaySession};
pub use self::sessions::{Generation, PlaySessions, SessionSnapshot};

pub type SharedState = Arc<AppState>;

/// Central application state storing the storage handle and per-player play sessions.
pub struct AppState {
    quiz_store: RwLock<Option<Arc<dyn QuizStore>>>,
    play_sessions: PlaySessions,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            quiz_store: RwLock::new(None),
            play_sessions: PlaySessions::new(),
            degraded: degraded_tx,
            config,
        })
    }

    /// Obtain a handle to the current quiz store, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.quiz_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current quiz store or fail with [`ServiceError::Degraded`].
    pub async fn require_quiz_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new quiz store implementation and leave degraded mode.
    pub async fn set_quiz_store(&self, store: Arc<dyn QuizStore>) {
        {
            let mut guard = self.quiz_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Play sessions of every connected player.
    pub fn play_sessions(&self) -> &PlaySessions {
        &self.play_sessions
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
