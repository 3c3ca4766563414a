//! Stress tests for the sync engine.
//!
//! These drive one node from many tokio tasks at once to check that
//! find-or-create and the event log hold up under concurrent delivery.

use crate::fixtures::TestNode;
use edgesync_core::{EntityId, TenantId};
use edgesync_engine::{ApplyOutcome, SyncEventAction, SyncEventType};
use edgesync_protocol::{AssetUpdateMsg, DeviceUpdateMsg, SyncMessage, UpdateMsgType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Operations that created a record.
    pub created: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, created: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            created,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Created: {}", self.created);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Messages each task sends.
    pub operations: usize,
    /// Number of concurrent tasks.
    pub tasks: usize,
    /// Number of distinct entities the messages target.
    pub entity_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            tasks: 8,
            entity_count: 50,
        }
    }
}

#[derive(Default)]
struct Counters {
    successful: AtomicUsize,
    failed: AtomicUsize,
    created: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: &edgesync_engine::SyncResult<ApplyOutcome>) {
        match outcome {
            Ok(outcome) => {
                self.successful.fetch_add(1, Ordering::Relaxed);
                if *outcome == ApplyOutcome::Created {
                    self.created.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn finish(&self, start: Instant) -> StressTestResult {
        StressTestResult::new(
            self.successful.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            self.created.load(Ordering::Relaxed),
            start.elapsed(),
        )
    }
}

/// Stable ID of the `index`-th stress entity.
pub fn stress_entity_id(index: usize) -> EntityId {
    EntityId::from_halves(0x5157_2e55, index as u64 + 1)
}

async fn run_concurrent<F>(
    node: Arc<TestNode>,
    tenant_id: TenantId,
    config: &StressConfig,
    message: F,
) -> StressTestResult
where
    F: Fn(usize, usize) -> SyncMessage + Send + Sync + 'static,
{
    let counters = Arc::new(Counters::default());
    let message = Arc::new(message);
    let start = Instant::now();

    let handles: Vec<_> = (0..config.tasks)
        .map(|t| {
            let node = Arc::clone(&node);
            let counters = Arc::clone(&counters);
            let message = Arc::clone(&message);
            let operations = config.operations;
            let entity_count = config.entity_count;

            tokio::spawn(async move {
                for i in 0..operations {
                    let idx = (t * operations + i) % entity_count;
                    let outcome = node.engine.apply_inbound(tenant_id, message(idx, i)).await;
                    counters.record(&outcome);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("Task panicked");
    }

    counters.finish(start)
}

/// Sends CREATE and UPDATE messages for the same assets from many tasks.
///
/// Every asset must end up stored once and be reported created once.
pub async fn stress_concurrent_asset_creates(
    node: Arc<TestNode>,
    tenant_id: TenantId,
    config: &StressConfig,
) -> StressTestResult {
    run_concurrent(node, tenant_id, config, |idx, i| {
        let (id_msb, id_lsb) = stress_entity_id(idx).halves();
        SyncMessage::Asset(AssetUpdateMsg {
            msg_type: if i % 2 == 0 {
                UpdateMsgType::EntityCreated
            } else {
                UpdateMsgType::EntityUpdated
            },
            id_msb,
            id_lsb,
            name: Some(format!("asset-{idx}")),
            asset_type: Some("stress".to_string()),
            ..Default::default()
        })
    })
    .await
}

/// Sends device CREATEs from many tasks.
///
/// Each device must queue exactly one credentials request.
pub async fn stress_concurrent_device_creates(
    node: Arc<TestNode>,
    tenant_id: TenantId,
    config: &StressConfig,
) -> StressTestResult {
    run_concurrent(node, tenant_id, config, |idx, _| {
        let (id_msb, id_lsb) = stress_entity_id(idx).halves();
        SyncMessage::Device(DeviceUpdateMsg {
            msg_type: UpdateMsgType::EntityCreated,
            id_msb,
            id_lsb,
            name: Some(format!("device-{idx}")),
            device_type: Some("sensor".to_string()),
            ..Default::default()
        })
    })
    .await
}

/// Enqueues events for distinct entities from many tasks.
pub async fn stress_concurrent_enqueue(
    node: Arc<TestNode>,
    tenant_id: TenantId,
    config: &StressConfig,
) -> StressTestResult {
    let counters = Arc::new(Counters::default());
    let start = Instant::now();

    let handles: Vec<_> = (0..config.tasks)
        .map(|t| {
            let node = Arc::clone(&node);
            let counters = Arc::clone(&counters);
            let operations = config.operations;

            tokio::spawn(async move {
                for i in 0..operations {
                    let appended = node
                        .engine
                        .event_log()
                        .enqueue(
                            tenant_id,
                            SyncEventType::Asset,
                            SyncEventAction::Updated,
                            stress_entity_id(t * operations + i),
                            None,
                        )
                        .await;
                    let counter = match appended {
                        Ok(()) => &counters.successful,
                        Err(_) => &counters.failed,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("Task panicked");
    }

    counters.finish(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> StressConfig {
        StressConfig {
            operations: 200,
            tasks: 8,
            entity_count: 20,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_asset_creates_converge() {
        let node = Arc::new(TestNode::quiet());
        let tenant = TenantId::new();
        let config = small();

        let result = stress_concurrent_asset_creates(Arc::clone(&node), tenant, &config).await;
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, config.tasks * config.operations);
        assert_eq!(result.created, config.entity_count);
        assert_eq!(node.memory.assets.len(), config.entity_count);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_device_creates_request_credentials_once() {
        let node = Arc::new(TestNode::quiet());
        let tenant = TenantId::new();
        let config = small();

        let result = stress_concurrent_device_creates(Arc::clone(&node), tenant, &config).await;
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.created, config.entity_count);
        let requests = node
            .queued(tenant)
            .into_iter()
            .filter(|(_, action)| action == SyncEventAction::CredentialsRequest.as_str())
            .count();
        assert_eq!(requests, config.entity_count);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_enqueue_keeps_every_event() {
        let node = Arc::new(TestNode::quiet());
        let tenant = TenantId::new();
        let config = StressConfig {
            operations: 100,
            tasks: 4,
            entity_count: 1,
        };

        let result = stress_concurrent_enqueue(Arc::clone(&node), tenant, &config).await;
        assert_eq!(result.failed_ops, 0);
        assert_eq!(node.events.len(), config.tasks * config.operations);
    }
}
