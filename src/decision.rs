use serde::{Deserialize, Serialize};

use crate::configuration::Modification;

/// The outcome of one decision call: the campaigns the visitor takes part in, with the variation
/// resolved for each.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub visitor_id: String,
    pub campaigns: Vec<DecidedCampaign>,
}

/// One campaign the visitor was assigned into.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecidedCampaign {
    pub id: String,
    #[serde(skip)]
    pub custom_id: String,
    pub variation_group_id: String,
    pub variation: DecidedVariation,
}

/// The variation resolved for a campaign, with the flag modifications it carries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecidedVariation {
    pub id: String,
    pub reference: bool,
    pub modifications: Modification,
}
