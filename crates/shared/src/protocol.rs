use serde::{Deserialize, Serialize};

use crate::domain::{TierField, TierId, TierRecord};

pub const TIER_OBJECT_API_NAME: &str = "account_maturity_tier";

pub fn tiers_route() -> &'static str {
    "/tiers"
}

pub fn tier_describe_route() -> &'static str {
    "/tiers/describe"
}

pub fn tier_route(tier_id: TierId) -> String {
    format!("{}/{}", tiers_route(), tier_id.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertTierRequest {
    pub tier: TierRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTiersRequest {
    pub tiers: Vec<TierRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub api_name: String,
    pub label: String,
}

/// Schema description of the tier object, used for column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub api_name: String,
    pub label: String,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

impl ObjectInfo {
    pub fn for_tiers(label: impl Into<String>) -> Self {
        Self {
            api_name: TIER_OBJECT_API_NAME.to_string(),
            label: label.into(),
            fields: TierField::ALL
                .into_iter()
                .map(|field| FieldInfo {
                    api_name: field.api_name().to_string(),
                    label: field.default_label().to_string(),
                })
                .collect(),
        }
    }
}
