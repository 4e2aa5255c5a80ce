use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::state::SharedState;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically forget play sessions idle for longer than the configured TTL.
pub async fn run(state: SharedState) {
    let ttl = state.config().play_session_ttl();
    let mut ticker = interval(sweep_interval(ttl));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let purged = state.play_sessions().purge_idle(ttl);
        if purged > 0 {
            debug!(purged, remaining = state.play_sessions().len(), "expired idle play sessions");
        }
    }
}

fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 4).clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_interval_is_bounded() {
        assert_eq!(sweep_interval(Duration::ZERO), MIN_SWEEP_INTERVAL);
        assert_eq!(sweep_interval(Duration::from_secs(20)), Duration::from_secs(5));
        assert_eq!(sweep_interval(Duration::from_secs(3600)), MAX_SWEEP_INTERVAL);
    }
}
