//! Fuzz testing harnesses for the sync engine.
//!
//! These targets can be driven by cargo-fuzz or by the seeded loops in
//! this module's tests. None of them may panic on any input.

use crate::fixtures::TestNode;
use edgesync_core::{EntityId, EntityRef, EntityType, TenantId};
use edgesync_engine::SyncError;
use edgesync_protocol::{
    AssetUpdateMsg, MessageBatch, RelationUpdateMsg, SyncMessage, UpdateMsgType,
};

/// Fuzz target for batch decoding.
///
/// Arbitrary bytes either decode into a batch that re-encodes, or
/// produce a protocol error.
pub fn fuzz_batch_decode(data: &[u8]) {
    let Ok(batch) = MessageBatch::decode(data) else {
        return;
    };
    let encoded = batch.encode().expect("decoded batch must re-encode");
    let decoded = MessageBatch::decode(&encoded).expect("re-encoded batch must decode");
    assert_eq!(batch, decoded, "batch changed across re-encoding");
}

/// Fuzz target for message type codes.
pub fn fuzz_msg_type_codes(data: &[u8]) {
    for chunk in data.chunks_exact(4) {
        let code = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        assert_eq!(UpdateMsgType::from_code(code).to_code(), code);
    }
}

/// Fuzz target for applying decoded batches.
///
/// Whatever decodes is applied to a fresh node. Malformed content must be
/// reported per message, never by panicking.
pub fn fuzz_inbound_batch(data: &[u8]) {
    let Ok(batch) = MessageBatch::decode(data) else {
        return;
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(_) => return,
    };
    let node = TestNode::quiet();
    let expected = batch.len();
    let report = runtime.block_on(node.engine.apply_batch(TenantId::new(), batch));
    assert_eq!(report.outcomes.len(), expected);
}

/// Structured inbound operation over a small ID space, so that creates,
/// deletes and relations collide often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzOp {
    /// Create or update asset `slot`.
    UpsertAsset {
        /// Slot selecting the asset ID.
        slot: u8,
        /// Whether the message is a CREATE.
        create: bool,
    },
    /// Delete asset `slot`.
    DeleteAsset {
        /// Slot selecting the asset ID.
        slot: u8,
    },
    /// Relate two asset slots.
    Relate {
        /// Source slot.
        from: u8,
        /// Target slot.
        to: u8,
    },
    /// Remove the relation between two asset slots.
    Unrelate {
        /// Source slot.
        from: u8,
        /// Target slot.
        to: u8,
    },
}

const SLOTS: u8 = 8;

fn slot_id(slot: u8) -> EntityId {
    EntityId::from_halves(0x0123_4567, u64::from(slot % SLOTS) + 1)
}

impl FuzzOp {
    /// Parses operations from fuzzer input, two bytes each.
    pub fn parse_sequence(data: &[u8]) -> Vec<FuzzOp> {
        data.chunks_exact(2)
            .map(|pair| {
                let (op, arg) = (pair[0], pair[1]);
                let (a, b) = (arg & 0x0F, arg >> 4);
                match op % 5 {
                    0 => FuzzOp::UpsertAsset { slot: a, create: true },
                    1 => FuzzOp::UpsertAsset { slot: a, create: false },
                    2 => FuzzOp::DeleteAsset { slot: a },
                    3 => FuzzOp::Relate { from: a, to: b },
                    _ => FuzzOp::Unrelate { from: a, to: b },
                }
            })
            .collect()
    }

    /// Converts the operation into the inbound message a peer would send.
    pub fn to_message(&self) -> SyncMessage {
        match *self {
            FuzzOp::UpsertAsset { slot, create } => {
                let (id_msb, id_lsb) = slot_id(slot).halves();
                SyncMessage::Asset(AssetUpdateMsg {
                    msg_type: if create {
                        UpdateMsgType::EntityCreated
                    } else {
                        UpdateMsgType::EntityUpdated
                    },
                    id_msb,
                    id_lsb,
                    name: Some(format!("asset-{}", slot % SLOTS)),
                    asset_type: Some("default".to_string()),
                    ..Default::default()
                })
            }
            FuzzOp::DeleteAsset { slot } => {
                let (id_msb, id_lsb) = slot_id(slot).halves();
                SyncMessage::Asset(AssetUpdateMsg {
                    msg_type: UpdateMsgType::EntityDeleted,
                    id_msb,
                    id_lsb,
                    ..Default::default()
                })
            }
            FuzzOp::Relate { from, to } => relation_message(from, to, UpdateMsgType::EntityCreated),
            FuzzOp::Unrelate { from, to } => {
                relation_message(from, to, UpdateMsgType::EntityDeleted)
            }
        }
    }

    /// Applies `ops` to `node`, returning every failure reported.
    pub async fn execute_sequence(
        ops: &[FuzzOp],
        node: &TestNode,
        tenant_id: TenantId,
    ) -> Vec<SyncError> {
        let mut failures = Vec::new();
        for op in ops {
            if let Err(e) = node.engine.apply_inbound(tenant_id, op.to_message()).await {
                failures.push(e);
            }
        }
        failures
    }
}

fn relation_message(from: u8, to: u8, msg_type: UpdateMsgType) -> SyncMessage {
    let from = EntityRef::new(EntityType::Asset, slot_id(from));
    let to = EntityRef::new(EntityType::Asset, slot_id(to));
    let (from_id_msb, from_id_lsb) = from.id.halves();
    let (to_id_msb, to_id_lsb) = to.id.halves();
    SyncMessage::Relation(RelationUpdateMsg {
        msg_type,
        from_id_msb,
        from_id_lsb,
        from_entity_type: from.entity_type.as_str().to_string(),
        to_id_msb,
        to_id_lsb,
        to_entity_type: to.entity_type.as_str().to_string(),
        relation_type: "Contains".to_string(),
        type_group: None,
        additional_info: None,
    })
}

/// Fuzz target for structured operation sequences.
///
/// Well-formed messages never fail, and every stored asset is one the
/// sequence upserted.
pub fn fuzz_operation_sequence(data: &[u8]) {
    let ops = FuzzOp::parse_sequence(data);
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(_) => return,
    };
    let node = TestNode::quiet();
    let tenant = TenantId::new();
    let failures = runtime.block_on(FuzzOp::execute_sequence(&ops, &node, tenant));
    assert!(failures.is_empty(), "well-formed messages failed: {failures:?}");
    assert!(node.memory.assets.len() <= usize::from(SLOTS));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{DefaultHasher, Hash, Hasher};

    /// Generate pseudo-random data for fuzzing based on a seed.
    fn generate_random_data(seed: u64, len: usize) -> Vec<u8> {
        let mut hasher = DefaultHasher::new();
        let mut result = Vec::with_capacity(len);
        let mut state = seed;

        for _ in 0..len {
            state.hash(&mut hasher);
            state = hasher.finish();
            hasher = DefaultHasher::new();
            result.push((state & 0xFF) as u8);
        }

        result
    }

    #[test]
    fn batch_decode_empty_and_garbage() {
        fuzz_batch_decode(&[]);
        fuzz_batch_decode(&[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn batch_decode_real_batch() {
        let mut batch = MessageBatch::new();
        batch.asset_update_msgs.push(AssetUpdateMsg {
            id_lsb: 7,
            name: Some("Pump".into()),
            ..Default::default()
        });
        let bytes = batch.encode().unwrap();
        fuzz_batch_decode(&bytes);
        fuzz_inbound_batch(&bytes);
    }

    #[test]
    fn parse_ops() {
        let ops = FuzzOp::parse_sequence(&[0, 3, 3, 0x21, 9]);
        assert_eq!(
            ops,
            vec![
                FuzzOp::UpsertAsset { slot: 3, create: true },
                FuzzOp::Relate { from: 1, to: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn relate_before_create_is_skipped() {
        let node = TestNode::quiet();
        let tenant = TenantId::new();
        let ops = [
            FuzzOp::Relate { from: 1, to: 2 },
            FuzzOp::UpsertAsset { slot: 1, create: true },
            FuzzOp::UpsertAsset { slot: 2, create: true },
            FuzzOp::Relate { from: 1, to: 2 },
            FuzzOp::Relate { from: 1, to: 2 },
        ];
        assert!(FuzzOp::execute_sequence(&ops, &node, tenant).await.is_empty());
        assert_eq!(node.memory.assets.len(), 2);
        assert_eq!(node.memory.relations.len(), 1);
    }

    // Extended randomized fuzz tests for CI

    #[test]
    fn batch_decode_random_iterations() {
        for seed in 0..1000u64 {
            let len = ((seed % 256) + 1) as usize;
            fuzz_batch_decode(&generate_random_data(seed, len));
        }
    }

    #[test]
    fn msg_type_codes_random_iterations() {
        for seed in 0..200u64 {
            fuzz_msg_type_codes(&generate_random_data(seed, 64));
        }
    }

    #[test]
    fn operation_sequence_random_iterations() {
        for seed in 0..100u64 {
            let len = ((seed % 64) + 2) as usize;
            fuzz_operation_sequence(&generate_random_data(seed, len));
        }
    }
}
