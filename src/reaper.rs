use crate::store::DocumentStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Periodic cleanup of expired change records and exam windows. Every query
/// path already filters on expiry, so this task only bounds storage growth;
/// reads stay correct even if it never runs. A single looping task, so
/// sweeps never overlap.
pub async fn run<S: DocumentStore>(store: Arc<S>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        sweep(store.as_ref()).await;
    }
}

/// One sweep. Failures are logged and retried on the next tick, never
/// propagated.
pub async fn sweep<S: DocumentStore>(store: &S) {
    let now = Utc::now();

    match store.delete_expired_changes(now).await {
        Ok(deleted) if deleted > 0 => {
            log::info!("cleaned up {} expired temporary changes", deleted)
        }
        Ok(_) => {}
        Err(e) => log::error!("expired temp change cleanup failed: {}", e),
    }

    match store.delete_expired_exams(now).await {
        Ok(deleted) if deleted > 0 => log::info!("cleaned up {} expired exam schedules", deleted),
        Ok(_) => {}
        Err(e) => log::error!("expired exam cleanup failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Change;
    use crate::store::{ChangeFilter, MemoryStore};
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_sweep_removes_only_expired_records() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .upsert_change(Change::bulk(
                "b1",
                "KT - 9",
                vec![],
                "admin_incoming",
                now - TimeDelta::seconds(5),
            ))
            .await
            .unwrap();
        store
            .upsert_change(Change::bulk(
                "b2",
                "KT - 9",
                vec![],
                "admin_incoming",
                now + TimeDelta::hours(1),
            ))
            .await
            .unwrap();

        sweep(&store).await;
        // Repeat sweeps are no-ops.
        sweep(&store).await;

        let remaining = store
            .find_changes(ChangeFilter::ActiveInCollection {
                collection: "admin_incoming",
                now,
            })
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source_bus_id, "b2");
    }
}
