use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{quiz_store::QuizStore, storage::StorageError},
    services::seed_service,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect and seed the storage backend, then keep the shared state in degraded mode whenever it
/// becomes unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn QuizStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        if let Err(err) = seed_service::seed(store.as_ref(), state.config()).await {
            warn!(error = %err, "failed to seed storage; retrying");
            sleep(delay).await;
            delay = (delay * 2).min(MAX_DELAY);
            continue;
        }

        state.set_quiz_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");
        delay = INITIAL_DELAY;

        if !watch_health(&state, store.as_ref()).await {
            warn!("exhausted storage reconnect attempts; staying in degraded mode");
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the store until it fails and cannot be reconnected. Returns `false` once given up.
async fn watch_health(state: &SharedState, store: &dyn QuizStore) -> bool {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        let mut reconnect_delay = INITIAL_DELAY;
        let mut reconnected = false;
        for attempt in 0..MAX_RECONNECT_ATTEMPTS {
            match store.try_reconnect().await {
                Ok(()) => {
                    info!("storage reconnection succeeded after health check failure");
                    reconnected = true;
                    break;
                }
                Err(reconnect_err) => {
                    if attempt == 0 {
                        warn!(
                            attempt, error = %reconnect_err,
                            "storage reconnect first attempt failed; entering in degraded mode"
                        );
                        state.update_degraded(true);
                    } else {
                        warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                    }
                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                }
            }
        }

        if !reconnected {
            return false;
        }
        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::quiz_store::memory::MemoryQuizStore, state::AppState};

    #[tokio::test]
    async fn installs_and_seeds_the_store() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());

        let mut ready = state.degraded_watcher();
        let supervised = state.clone();
        let task = tokio::spawn(run(supervised, || async {
            Ok(Arc::new(MemoryQuizStore::new()) as Arc<dyn QuizStore>)
        }));

        ready.wait_for(|degraded| !degraded).await.unwrap();
        let store = state.require_quiz_store().await.unwrap();
        assert_eq!(
            store.list_users().await.unwrap().len(),
            AppConfig::default().seed_users().len()
        );
        task.abort();
    }
}
