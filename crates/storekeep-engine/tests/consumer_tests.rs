// Integration tests for the consumer: worker pool, settlement, redelivery bound

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storekeep_core::errors::{ExError, ExErrorKind, Result};
use storekeep_core::model::{NewStore, NewStoreVersion, Store, StoreFields, StoreVersion};
use storekeep_core::StoreBackend;
use storekeep_engine::config::ConsumerConfig;
use storekeep_engine::{Consumer, ConsumerStats, Dispatcher, MemoryQueue, MessageQueue, StoreService};
use storekeep_store::{DatabaseConfig, RetryPolicy, SqliteBackend};
use tempfile::TempDir;

fn consumer_config(workers: usize, max_redeliveries: u32) -> ConsumerConfig {
    ConsumerConfig {
        workers,
        queue_capacity: 64,
        max_redeliveries,
    }
}

fn publish_json(queue: &MemoryQueue, message: serde_json::Value) {
    queue.publish(serde_json::to_vec(&message).unwrap()).unwrap();
}

/// Backend whose appends always lose the serialization race
#[derive(Default)]
struct ConflictingBackend {
    appends: AtomicUsize,
}

impl StoreBackend for ConflictingBackend {
    fn create_store(&self, _: &NewStore) -> Result<String> {
        Ok("s1".to_string())
    }

    fn append_version(&self, store_id: &str, _: &NewStoreVersion) -> Result<StoreVersion> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        Err(ExError::new(ExErrorKind::Conflict).with_store_id(store_id))
    }

    fn delete_store(&self, _: &str) -> Result<()> {
        Ok(())
    }

    fn delete_version(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn get_store(&self, _: &str) -> Result<Option<Store>> {
        Ok(None)
    }

    fn get_version_history(&self, _: &str) -> Result<Vec<StoreVersion>> {
        Ok(Vec::new())
    }

    fn get_version_for_store(&self, _: &str, _: &str) -> Result<Option<StoreVersion>> {
        Ok(None)
    }

    fn get_current_version(&self, _: &str) -> Result<Option<StoreVersion>> {
        Ok(None)
    }
}

#[test]
fn test_conflict_requeued_until_bound_then_rejected() {
    // Given: A dispatcher whose backend always conflicts
    let dispatcher = Arc::new(Dispatcher::new(StoreService::new(
        ConflictingBackend::default(),
    )));
    let queue = Arc::new(MemoryQueue::new(8));
    publish_json(
        &queue,
        json!({
            "action": "create_store_version",
            "storeId": "s1",
            "data": {"storeOwnerName": "Al", "openingTime": "09:00", "closingTime": "21:00"}
        }),
    );
    queue.close();

    // When: The consumer drains the queue allowing two redeliveries
    let consumer = Consumer::new(
        Arc::clone(&dispatcher),
        Arc::clone(&queue),
        &consumer_config(2, 2),
    );
    let stats = consumer.run().unwrap();

    // Then: The message was tried three times and then dead-lettered
    assert_eq!(
        stats,
        ConsumerStats {
            acked: 0,
            requeued: 2,
            rejected: 1,
            ignored: 0,
        }
    );
    assert_eq!(dispatcher.service().backend().appends.load(Ordering::SeqCst), 3);
    let dead = queue.dead_letters();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].redelivered, 2);
}

#[test]
fn test_mixed_batch_is_settled_per_outcome() {
    let dir = TempDir::new().unwrap();
    let backend =
        SqliteBackend::open(&DatabaseConfig::for_path(dir.path().join("c.db")), RetryPolicy::default())
            .unwrap();
    let dispatcher = Arc::new(Dispatcher::new(StoreService::new(backend)));
    let queue = Arc::new(MemoryQueue::new(8));

    publish_json(
        &queue,
        json!({
            "action": "create_store",
            "userLogin": "jo",
            "data": {"name": "Acme", "address": "1 Main St", "ownerName": "Jo",
                     "openingTime": "08:00", "closingTime": "20:00"}
        }),
    );
    publish_json(&queue, json!({"action": "rename_store", "storeId": "s1"}));
    queue.publish(b"not json".to_vec()).unwrap();
    publish_json(&queue, json!({"action": "delete_store", "storeId": "missing"}));
    queue.close();

    let stats = Consumer::new(dispatcher, Arc::clone(&queue), &consumer_config(3, 3))
        .run()
        .unwrap();

    // create succeeds, decode and not-found failures are acked, unknown is ignored
    assert_eq!(stats.acked, 3);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.requeued, 0);
    assert_eq!(stats.rejected, 0);
    assert!(queue.is_drained());
    assert!(queue.dead_letters().is_empty());
}

#[test]
fn test_parallel_workers_keep_one_current_version() {
    // Given: A store and a burst of version messages for it
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        busy_timeout_ms: 2_000,
        ..DatabaseConfig::for_path(dir.path().join("burst.db"))
    };
    let backend = SqliteBackend::open(&config, RetryPolicy::default()).unwrap();
    let service = StoreService::new(backend);
    let store_id = service
        .create_store(
            StoreFields {
                name: "Acme".to_string(),
                address: "1 Main St".to_string(),
                owner_name: "Jo".to_string(),
                opening_time: "08:00".to_string(),
                closing_time: "20:00".to_string(),
            },
            "jo",
        )
        .unwrap();
    let dispatcher = Arc::new(Dispatcher::new(service));
    let queue = Arc::new(MemoryQueue::new(64));

    const MESSAGES: u32 = 24;
    for n in 0..MESSAGES {
        publish_json(
            &queue,
            json!({
                "action": "create_store_version",
                "storeId": store_id,
                "userLogin": format!("user-{}", n),
                "data": {"storeOwnerName": format!("Owner {}", n),
                         "openingTime": "09:00", "closingTime": "21:00"}
            }),
        );
    }
    queue.close();

    // When: Four workers drain the queue
    let stats = Consumer::new(Arc::clone(&dispatcher), queue, &consumer_config(4, 3))
        .run()
        .unwrap();

    // Then: Every message landed as its own version
    assert_eq!(stats.acked, u64::from(MESSAGES));
    let history = dispatcher
        .service()
        .get_store_history(&store_id, "jo")
        .unwrap();
    assert_eq!(history.len() as u32, MESSAGES + 1);
    assert_eq!(history.iter().filter(|v| v.is_current).count(), 1);
    let mut numbers: Vec<u32> = history.iter().map(|v| v.version_number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=MESSAGES + 1).collect::<Vec<_>>());
}
