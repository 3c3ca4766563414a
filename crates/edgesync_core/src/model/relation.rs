use crate::entity_type::EntityRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    /// Group a relation type belongs to.
    pub enum RelationTypeGroup ("type_group") {
        /// Ordinary entity relations.
        Common => "COMMON",
        /// Alarm propagation relations.
        Alarm => "ALARM",
        /// Dashboard grouping.
        Dashboard => "DASHBOARD",
        /// Rule chain wiring.
        RuleChain => "RULE_CHAIN",
        /// Rule node wiring.
        RuleNode => "RULE_NODE",
        /// Edge assignment.
        Edge => "EDGE",
    }
}

impl Default for RelationTypeGroup {
    fn default() -> Self {
        Self::Common
    }
}

/// Directed relation between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelation {
    /// Source endpoint.
    pub from: EntityRef,
    /// Target endpoint.
    pub to: EntityRef,
    /// Relation type, e.g. "Contains".
    #[serde(rename = "type")]
    pub relation_type: String,
    /// Relation type group.
    #[serde(default)]
    pub type_group: RelationTypeGroup,
    /// Free-form additional info.
    pub additional_info: Option<Value>,
}

impl EntityRelation {
    /// Creates a common relation without additional info.
    pub fn new(from: EntityRef, to: EntityRef, relation_type: impl Into<String>) -> Self {
        Self {
            from,
            to,
            relation_type: relation_type.into(),
            type_group: RelationTypeGroup::Common,
            additional_info: None,
        }
    }

    /// Returns the key identifying this relation.
    pub fn key(&self) -> RelationKey {
        RelationKey {
            from: self.from,
            to: self.to,
            relation_type: self.relation_type.clone(),
            type_group: self.type_group,
        }
    }
}

/// Identity of a relation: (from, to, type, group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationKey {
    /// Source endpoint.
    pub from: EntityRef,
    /// Target endpoint.
    pub to: EntityRef,
    /// Relation type.
    pub relation_type: String,
    /// Relation type group.
    pub type_group: RelationTypeGroup,
}
