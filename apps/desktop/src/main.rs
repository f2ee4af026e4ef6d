use std::{fmt::Write as _, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client_core::{
    visible_rows, AutoConfirm, ChannelNotifier, Confirm, HeaderLabels, HttpSyncGateway,
    TierEditor, TierEditorState, Toast, ToastVariant,
};
use shared::domain::{TierField, TierId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    /// Skip the delete confirmation prompt.
    #[arg(long)]
    yes: bool,
    #[arg(long)]
    title: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tier table.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Stage a new tier and save it.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        label: String,
        #[arg(long)]
        count_floor: f64,
    },
    /// Change one field of a saved tier.
    Set {
        tier_id: TierId,
        field: TierField,
        value: String,
    },
    Delete {
        tier_id: TierId,
    },
}

/// Asks on the terminal; anything but "y" or "yes" declines.
struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        if stdout
            .write_all(format!("{prompt} [y/N] ").as_bytes())
            .await
            .is_err()
            || stdout.flush().await.is_err()
        {
            return false;
        }
        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut answer).await {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let gateway = HttpSyncGateway::new(&args.server_url)
        .with_context(|| format!("invalid server url '{}'", args.server_url))?;
    let (notifier, mut toasts) = ChannelNotifier::new();
    let confirm: Arc<dyn Confirm> = if args.yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(StdinConfirm)
    };
    let mut editor = TierEditor::new(Arc::new(gateway), Arc::new(notifier), confirm);
    if let Some(title) = args.title {
        editor = editor.with_title(title);
    }

    let outcome = run(&mut editor, args.command).await;
    drop(editor);
    while let Some(toast) = toasts.recv().await {
        print_toast(&toast);
    }
    outcome
}

async fn run(editor: &mut TierEditor, command: Command) -> Result<()> {
    editor.start().await?;

    match command {
        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(editor.state().records())?);
                return Ok(());
            }
        }
        Command::Add {
            name,
            label,
            count_floor,
        } => {
            editor.add();
            editor.edit(None, TierField::Name, &name)?;
            editor.edit(None, TierField::Label, &label)?;
            editor.edit(None, TierField::CountFloor, &count_floor.to_string())?;
            editor.save().await?;
        }
        Command::Set {
            tier_id,
            field,
            value,
        } => {
            editor.edit(Some(tier_id), field, &value)?;
            editor.save().await?;
        }
        Command::Delete { tier_id } => {
            if !editor.remove(tier_id).await? {
                info!(%tier_id, "delete cancelled");
                println!("Delete cancelled.");
                return Ok(());
            }
        }
    }

    print!(
        "{}",
        render_table(editor.title(), editor.labels(), editor.state())
    );
    Ok(())
}

fn print_toast(toast: &Toast) {
    match toast.variant {
        ToastVariant::Success => println!("{}: {}", toast.title, toast.message),
        ToastVariant::Error => eprintln!("{}: {}", toast.title, toast.message),
    }
}

fn render_table(title: &str, labels: &HeaderLabels, state: &TierEditorState) -> String {
    let header: Vec<String> = std::iter::once("Id".to_string())
        .chain(TierField::ALL.iter().map(|field| labels.label(*field).to_string()))
        .collect();
    let rows: Vec<Vec<String>> = visible_rows(state)
        .into_iter()
        .map(|record| {
            let id = record.id.map(|id| id.to_string()).unwrap_or_else(|| "new".into());
            std::iter::once(id)
                .chain(TierField::ALL.iter().map(|field| record.field_text(*field)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|column| {
            rows.iter()
                .map(|row| row[column].len())
                .chain(std::iter::once(header[column].len()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = format!("{title}\n");
    for line in std::iter::once(&header).chain(rows.iter()) {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", cells.join("  ").trim_end());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::TierRecord;

    #[test]
    fn table_uses_header_labels_and_marks_pending_row() {
        let mut state = TierEditorState::new();
        state.initialize(vec![TierRecord {
            id: Some(TierId(4)),
            level: 1,
            name: "bronze".into(),
            label: "Bronze".into(),
            count_floor: Some(2.5),
        }]);
        state.add_pending();

        let table = render_table("Tiers", &HeaderLabels::default(), &state);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Tiers");
        assert!(lines[1].starts_with("Id"));
        assert!(lines[1].contains("Count Floor"));
        assert!(lines[2].starts_with("4 "));
        assert!(lines[2].ends_with("2.5"));
        assert!(lines[3].starts_with("new"));
    }

    #[test]
    fn set_command_parses_field_names() {
        let args = Args::try_parse_from(["desktop", "set", "3", "count_floor", "12"])
            .expect("parse");
        let Command::Set {
            tier_id,
            field,
            value,
        } = args.command
        else {
            panic!("expected set");
        };
        assert_eq!(tier_id, TierId(3));
        assert_eq!(field, TierField::CountFloor);
        assert_eq!(value, "12");
    }
}
