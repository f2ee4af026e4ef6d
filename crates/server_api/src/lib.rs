use std::collections::HashSet;

use shared::{
    domain::{TierId, TierRecord},
    error::{ApiError, ErrorCode},
    protocol::ObjectInfo,
};
use storage::{NewTier, Storage, TierUpdate};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_OBJECT_LABEL: &str = "Account Maturity Tier";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub object_label: String,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            object_label: DEFAULT_OBJECT_LABEL.to_string(),
        }
    }
}

/// Every problem found with a request. Validation collects all of them so a
/// bulk update can report each bad row at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.0))]
pub struct Rejected(pub Vec<ApiError>);

impl Rejected {
    /// The most severe code among the errors: Internal, then NotFound,
    /// then Validation. Row order never changes the outcome.
    pub fn code(&self) -> ErrorCode {
        [ErrorCode::Internal, ErrorCode::NotFound, ErrorCode::Validation]
            .into_iter()
            .find(|code| self.0.iter().any(|err| err.code == *code))
            .unwrap_or(ErrorCode::Internal)
    }
}

impl From<ApiError> for Rejected {
    fn from(value: ApiError) -> Self {
        Self(vec![value])
    }
}

fn summary(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn list_tiers(ctx: &ApiContext) -> Result<Vec<TierRecord>, Rejected> {
    Ok(ctx.storage.list_tiers().await.map_err(internal)?)
}

pub async fn insert_tier(ctx: &ApiContext, tier: TierRecord) -> Result<Vec<TierRecord>, Rejected> {
    let mut issues = Vec::new();
    if tier.id.is_some() {
        issues.push(validation("a new tier must not carry an id"));
    }
    if tier.level == 0 {
        issues.push(validation("level must be at least 1"));
    }
    issues.extend(field_issues(&tier));

    let existing = ctx.storage.list_tiers().await.map_err(internal)?;
    if existing.iter().any(|t| same_name(&t.name, &tier.name)) {
        issues.push(validation(format!(
            "a tier named '{}' already exists",
            tier.name.trim()
        )));
    }
    if existing.iter().any(|t| t.level == tier.level) {
        issues.push(validation(format!("level {} is already taken", tier.level)));
    }
    if !issues.is_empty() {
        warn!(level = tier.level, issues = issues.len(), "rejected tier insert");
        return Err(Rejected(issues));
    }

    let new_tier = NewTier {
        level: tier.level,
        name: tier.name.trim().to_string(),
        label: tier.label.trim().to_string(),
        count_floor: tier.count_floor.unwrap_or_default(),
    };
    let tier_id = ctx
        .storage
        .insert_tier(&new_tier)
        .await
        .map_err(internal)?;
    info!(%tier_id, level = new_tier.level, "tier inserted");

    list_tiers(ctx).await
}

/// Writes name, label and count floor of every submitted tier. Submitted
/// levels are ignored; level never changes after creation.
pub async fn update_tiers(
    ctx: &ApiContext,
    tiers: Vec<TierRecord>,
) -> Result<Vec<TierRecord>, Rejected> {
    let existing = ctx.storage.list_tiers().await.map_err(internal)?;
    let submitted_ids: HashSet<TierId> = tiers.iter().filter_map(|t| t.id).collect();

    let mut issues = Vec::new();
    let mut seen_names = HashSet::new();
    for tier in &tiers {
        let Some(tier_id) = tier.id else {
            issues.push(validation(format!(
                "tier at level {} has no id; insert it instead",
                tier.level
            )));
            continue;
        };
        if !existing.iter().any(|t| t.id == Some(tier_id)) {
            issues.push(ApiError::new(
                ErrorCode::NotFound,
                format!("tier {tier_id} not found"),
            ));
            continue;
        }
        issues.extend(field_issues(tier));

        let name_key = tier.name.trim().to_lowercase();
        let clashes_with_untouched = existing.iter().any(|t| {
            t.id.is_some_and(|id| !submitted_ids.contains(&id)) && same_name(&t.name, &tier.name)
        });
        if !name_key.is_empty() && (!seen_names.insert(name_key) || clashes_with_untouched) {
            issues.push(validation(format!(
                "a tier named '{}' already exists",
                tier.name.trim()
            )));
        }
    }
    if !issues.is_empty() {
        warn!(issues = issues.len(), "rejected tier update");
        return Err(Rejected(issues));
    }

    let updates: Vec<TierUpdate> = tiers
        .iter()
        .filter_map(|tier| {
            Some(TierUpdate {
                tier_id: tier.id?,
                name: tier.name.trim().to_string(),
                label: tier.label.trim().to_string(),
                count_floor: tier.count_floor?,
            })
        })
        .collect();
    let touched = ctx
        .storage
        .update_tiers(&updates)
        .await
        .map_err(internal)?;
    info!(touched, "tiers updated");

    list_tiers(ctx).await
}

pub async fn delete_tier(ctx: &ApiContext, tier_id: TierId) -> Result<Vec<TierRecord>, Rejected> {
    let deleted = ctx
        .storage
        .delete_tier(tier_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, format!("tier {tier_id} not found")).into());
    }
    info!(%tier_id, "tier deleted");

    list_tiers(ctx).await
}

pub fn describe_tiers(ctx: &ApiContext) -> ObjectInfo {
    ObjectInfo::for_tiers(ctx.object_label.clone())
}

fn field_issues(tier: &TierRecord) -> Vec<ApiError> {
    let mut issues = Vec::new();
    if tier.name.trim().is_empty() {
        issues.push(validation(format!("name is required (level {})", tier.level)));
    }
    if tier.label.trim().is_empty() {
        issues.push(validation(format!("label is required (level {})", tier.level)));
    }
    match tier.count_floor {
        None => issues.push(validation(format!(
            "count floor is required (level {})",
            tier.level
        ))),
        Some(floor) if !floor.is_finite() || floor < 0.0 => issues.push(validation(format!(
            "count floor must not be negative (level {})",
            tier.level
        ))),
        Some(_) => {}
    }
    issues
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn validation(message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::Validation, message)
}

fn internal(err: anyhow::Error) -> Rejected {
    ApiError::new(ErrorCode::Internal, err.to_string()).into()
}
