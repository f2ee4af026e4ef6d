use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::domain::TierRecord;
use storage::{NewTier, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/tiers.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the starter tiers whose levels are still free.
    Seed,
    AddTier {
        #[arg(long)]
        level: u32,
        #[arg(long)]
        name: String,
        #[arg(long)]
        label: String,
        #[arg(long, default_value_t = 0.0)]
        count_floor: f64,
    },
    ListTiers,
}

fn starter_tiers() -> Vec<NewTier> {
    [("bronze", "Bronze", 0.0), ("silver", "Silver", 10.0), ("gold", "Gold", 50.0)]
        .into_iter()
        .zip(1..)
        .map(|((name, label, count_floor), level)| NewTier {
            level,
            name: name.into(),
            label: label.into(),
            count_floor,
        })
        .collect()
}

/// Why a starter tier cannot be inserted next to the stored ones.
fn seed_conflict(existing: &[TierRecord], tier: &NewTier) -> Option<String> {
    if existing.iter().any(|t| t.level == tier.level) {
        return Some(format!("level {} already taken", tier.level));
    }
    existing
        .iter()
        .find(|t| t.name.trim().eq_ignore_ascii_case(tier.name.trim()))
        .map(|t| format!("name already used at level {}", t.level))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed => {
            let existing = storage.list_tiers().await?;
            for tier in starter_tiers() {
                if let Some(reason) = seed_conflict(&existing, &tier) {
                    println!("{} skipped: {reason}", tier.name);
                    continue;
                }
                let tier_id = storage.insert_tier(&tier).await?;
                println!("created tier_id={} level={}", tier_id, tier.level);
            }
        }
        Command::AddTier {
            level,
            name,
            label,
            count_floor,
        } => {
            if level == 0 || !count_floor.is_finite() || count_floor < 0.0 {
                bail!("level must be at least 1 and count floor must not be negative");
            }
            let tier_id = storage
                .insert_tier(&NewTier {
                    level,
                    name,
                    label,
                    count_floor,
                })
                .await?;
            println!("created tier_id={tier_id}");
        }
        Command::ListTiers => {
            for tier in storage.list_tiers().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    tier.id.map(|id| id.to_string()).unwrap_or_default(),
                    tier.level,
                    tier.name,
                    tier.label,
                    tier.count_floor.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::TierId;

    fn stored(level: u32, name: &str) -> TierRecord {
        TierRecord {
            id: Some(TierId(i64::from(level))),
            level,
            name: name.into(),
            label: name.to_uppercase(),
            count_floor: Some(0.0),
        }
    }

    #[test]
    fn starter_tier_is_skipped_on_level_or_name_clash() {
        let starters = starter_tiers();
        let existing = vec![stored(1, "copper"), stored(7, "Silver")];

        let conflicts: Vec<_> = starters
            .iter()
            .map(|tier| seed_conflict(&existing, tier))
            .collect();
        assert_eq!(conflicts[0].as_deref(), Some("level 1 already taken"));
        assert_eq!(conflicts[1].as_deref(), Some("name already used at level 7"));
        assert_eq!(conflicts[2], None);
    }
}
