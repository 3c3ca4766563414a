//! Edge↔cloud integration harness.
//!
//! Wires two [`TestNode`]s together through the CBOR batch encoding so
//! tests can exercise both directions the way a transport would.

use crate::fixtures::TestNode;
use edgesync_core::TenantId;
use edgesync_engine::{ApplyOutcome, SyncConfig, SyncError};
use edgesync_protocol::MessageBatch;

/// Which way a pump moves batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Cloud log drained into the edge.
    CloudToEdge,
    /// Edge log drained into the cloud.
    EdgeToCloud,
}

/// What one pump moved.
#[derive(Debug, Default)]
pub struct PumpStats {
    /// Batches delivered to the receiver.
    pub delivered: usize,
    /// Events acknowledged as stale without delivery.
    pub stale: usize,
    /// Outcomes reported by the receiver, in delivery order.
    pub outcomes: Vec<ApplyOutcome>,
    /// Receiver-side failures, tagged with the message kind.
    pub failures: Vec<(&'static str, SyncError)>,
    /// Events the sender could not construct.
    pub undeliverable: usize,
}

/// An edge and a cloud sharing one tenant.
pub struct EdgeCloudHarness {
    /// Cloud side.
    pub cloud: TestNode,
    /// Edge side.
    pub edge: TestNode,
    /// Tenant both sides serve.
    pub tenant: TenantId,
}

impl EdgeCloudHarness {
    /// Creates both sides with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Creates both sides with `config`.
    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            cloud: TestNode::with_config(config.clone()),
            edge: TestNode::with_config(config),
            tenant: TenantId::new(),
        }
    }

    fn sides(&self, direction: Direction) -> (&TestNode, &TestNode) {
        match direction {
            Direction::CloudToEdge => (&self.cloud, &self.edge),
            Direction::EdgeToCloud => (&self.edge, &self.cloud),
        }
    }

    /// Drains the sender's log into the receiver until it is empty.
    ///
    /// Undeliverable events stay in the sender's log; draining stops once
    /// only those remain.
    pub async fn pump(&self, direction: Direction) -> PumpStats {
        let (sender, receiver) = self.sides(direction);
        let mut stats = PumpStats::default();
        let mut link = sender.engine.drain_page_link();
        loop {
            let report = sender
                .engine
                .drain(self.tenant, &link)
                .await
                .expect("draining the in-memory log cannot fail");
            stats.undeliverable += report.failed.len();
            stats.stale += report.stale.len();

            for (_, batch) in &report.batches {
                let bytes = batch.encode().expect("batch encodes");
                let received = MessageBatch::decode(&bytes).expect("batch decodes");
                let applied = receiver.engine.apply_batch(self.tenant, received).await;
                for (kind, outcome) in applied.outcomes {
                    match outcome {
                        Ok(outcome) => stats.outcomes.push(outcome),
                        Err(e) => stats.failures.push((kind, e)),
                    }
                }
                stats.delivered += 1;
            }
            sender
                .engine
                .acknowledge(self.tenant, &report.settled_ids())
                .await
                .expect("acknowledging in-memory events cannot fail");

            // Failed events remain; step past them instead of re-reading them.
            match (report.failed.is_empty(), report.next) {
                (true, _) if report.batches.is_empty() && report.stale.is_empty() => break,
                (true, _) => link = sender.engine.drain_page_link(),
                (false, Some(cursor)) => link = link.with_cursor(Some(cursor)),
                (false, None) => break,
            }
        }
        stats
    }

    /// Pumps both directions until neither side has anything left to send.
    pub async fn settle(&self) -> Vec<PumpStats> {
        let mut rounds = Vec::new();
        loop {
            let to_edge = self.pump(Direction::CloudToEdge).await;
            let to_cloud = self.pump(Direction::EdgeToCloud).await;
            let idle = to_edge.delivered + to_edge.stale + to_cloud.delivered + to_cloud.stale == 0;
            rounds.push(to_edge);
            rounds.push(to_cloud);
            if idle {
                return rounds;
            }
        }
    }
}

impl Default for EdgeCloudHarness {
    fn default() -> Self {
        Self::new()
    }
}
