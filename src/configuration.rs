use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::context::ContextValue;

/// Environment configuration, as served by the bucketing file endpoint.
///
/// `Configuration` is an immutable snapshot: a refresh replaces the whole structure, it is never
/// patched in place. See [`crate::configuration_store::ConfigurationStore`].
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Environment-wide kill switch. When set, every decision returns zero campaigns.
    #[serde(default)]
    pub panic: bool,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
}

/// A single experiment with one or more variation groups.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub custom_id: String,
    #[serde(rename = "type", default)]
    pub campaign_type: String,
    #[serde(default)]
    pub variation_groups: Vec<VariationGroup>,
}

/// A set of variations governed by one targeting tree.
///
/// Group order within a campaign is significant: the first group whose targeting matches wins.
/// Variation order within a group is significant too: it is the allocation walk order.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VariationGroup {
    pub id: String,
    #[serde(default)]
    pub targeting: TargetingTree,
    #[serde(default)]
    pub variations: Vec<Variation>,
}

/// One treatment arm: an allocation weight and the flag values it carries.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub id: String,
    #[serde(default)]
    pub modifications: Modification,
    /// Percentage (0..=100) of matched visitors assigned to this variation. Weights within one
    /// group sum to at most 100; the remainder is the share of visitors with no allocation.
    #[serde(default)]
    pub allocation: u32,
    #[serde(default)]
    pub reference: bool,
}

/// Flag-key/value modifications defined by a variation.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    #[serde(rename = "type", default)]
    pub modification_type: String,
    #[serde(default)]
    pub value: HashMap<String, serde_json::Value>,
}

/// A targeting tree: an ordered list of OR-linked groups of AND-linked conditions.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TargetingTree {
    #[serde(default)]
    pub targeting_groups: Vec<TargetingGroup>,
}

/// One OR-branch of a targeting tree. All conditions inside must be satisfied.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TargetingGroup {
    #[serde(default)]
    pub targetings: Vec<Targeting>,
}

/// A single targeting condition comparing a context value against an operand.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Targeting {
    pub operator: TargetingOperator,
    pub key: String,
    pub value: ContextValue,
}

/// The closed set of targeting operators understood by the matcher.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum TargetingOperator {
    Null,
    Equals,
    NotEquals,
    LowerThan,
    LowerThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
}
