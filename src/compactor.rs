use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;

/// Background task that rewrites the WAL once enough appends have piled up
/// since the last compaction. The threshold is checked once a minute; the
/// rewrite itself runs through the engine so live commits stay ordered
/// against the swap.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let appends = engine.wal_appends_since_compact().await;
        if appends <= threshold {
            continue;
        }
        match engine.compact_wal().await {
            Ok(()) => info!("compacted WAL after {appends} appends"),
            Err(e) => tracing::warn!("WAL compaction failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::{parse_date, Actor, Role};

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("vaxd_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn append_counter_resets_on_compaction() {
        let engine = Engine::new(test_wal_path("append_counter.wal")).unwrap();
        engine.register_caregiver("bob", "Str0ng!pw").await.unwrap();
        let bob = Actor::new(Role::Caregiver, "bob");
        engine
            .upload_availability(&bob, parse_date("2022-05-01").unwrap())
            .await
            .unwrap();
        engine.add_doses(&bob, "Pfizer", 5).await.unwrap();

        assert_eq!(engine.wal_appends_since_compact().await, 3);

        engine.compact_wal().await.unwrap();
        assert_eq!(engine.wal_appends_since_compact().await, 0);

        // The next commit counts against the fresh file.
        engine.add_doses(&bob, "Pfizer", 1).await.unwrap();
        assert_eq!(engine.wal_appends_since_compact().await, 1);
    }
}
