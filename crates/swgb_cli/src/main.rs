use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde_json::{Map as JsonMap, Value as JsonValue};
use swgb_core::core_api::{Engine, PlayerEntry, Session};
use swgb_core::document::RESOURCE_NAMES;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVE.GA2")]
    path: PathBuf,
    /// Select one player by index (as listed) for display or edits.
    #[arg(long, value_name = "INDEX")]
    player: Option<usize>,
    #[arg(long = "set-carbon", value_name = "VALUE")]
    set_carbon: Option<f32>,
    #[arg(long = "set-food", value_name = "VALUE")]
    set_food: Option<f32>,
    #[arg(long = "set-nova", value_name = "VALUE")]
    set_nova: Option<f32>,
    #[arg(long = "set-ore", value_name = "VALUE")]
    set_ore: Option<f32>,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Skip the automatic .backup copy of an existing output file.
    #[arg(long = "no-backup")]
    no_backup: bool,
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let edits: [(usize, Option<f32>); 4] = [
        (0, cli.set_carbon),
        (1, cli.set_food),
        (2, cli.set_nova),
        (3, cli.set_ore),
    ];
    let has_edits = edits.iter().any(|(_, v)| v.is_some());

    if has_edits && cli.player.is_none() {
        eprintln!("--set-* flags require --player <INDEX>");
        process::exit(2);
    }
    if has_edits && cli.output.is_none() {
        eprintln!("--set-* flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one --set-* flag");
        process::exit(2);
    }

    let engine = Engine::new();
    let mut session = engine.open_path(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {e}", cli.path.display());
        process::exit(1);
    });

    let skipped = session.snapshot().skipped_markers;
    if skipped > 0 {
        eprintln!("Warning: skipped {skipped} malformed player marker match(es)");
    }

    if let Some(index) = cli.player {
        if session.player(index).is_none() {
            eprintln!(
                "Error: no player with index {index}, save has {} players",
                session.snapshot().player_count
            );
            process::exit(1);
        }
    }

    if has_edits {
        let index = cli.player.expect("checked above");
        for (slot, value) in edits {
            if let Some(v) = value {
                session.set_resource(index, slot, v).unwrap_or_else(|e| {
                    eprintln!("Error applying {} edit: {e}", RESOURCE_NAMES[slot]);
                    process::exit(1);
                });
            }
        }

        let out_path = cli.output.as_ref().expect("checked above");
        if !cli.no_backup {
            backup_existing(out_path).unwrap_or_else(|e| {
                eprintln!("Error creating backup of {}: {e}", out_path.display());
                process::exit(1);
            });
        }
        session.save_to_path(out_path).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
    }

    if cli.json {
        let rendered = serde_json::to_string_pretty(&to_json(&session, cli.player))
            .unwrap_or_else(|e| {
                eprintln!("Error rendering JSON output: {e}");
                process::exit(1);
            });
        println!("{rendered}");
        return;
    }

    if has_edits {
        let out_path = cli.output.as_ref().expect("checked above");
        println!("Wrote edited save to {}", out_path.display());
        return;
    }

    if let Some(index) = cli.player {
        let entry = session.player(index).expect("checked above");
        print_player(&entry);
        return;
    }

    print_players(&session);
}

/// Copies an existing output file to `<path>.backup` before it gets
/// overwritten. A backup that already exists is left alone, so repeated edits
/// keep the oldest version.
fn backup_existing(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut backup = path.as_os_str().to_os_string();
    backup.push(".backup");
    let backup = PathBuf::from(backup);
    if backup.exists() {
        return Ok(());
    }
    fs::copy(path, &backup)?;
    println!("Created backup: {}", backup.display());
    Ok(())
}

fn to_json(session: &Session, only: Option<usize>) -> JsonValue {
    let snapshot = session.snapshot();
    let players: Vec<PlayerEntry> = match only {
        Some(index) => session.player(index).into_iter().collect(),
        None => session.players(),
    };

    let mut out = JsonMap::new();
    out.insert(
        "framing".to_string(),
        JsonValue::String(snapshot.framing.label().to_string()),
    );
    out.insert(
        "decompressed_len".to_string(),
        JsonValue::from(snapshot.decompressed_len),
    );
    out.insert(
        "skipped_markers".to_string(),
        JsonValue::from(snapshot.skipped_markers),
    );
    out.insert(
        "players".to_string(),
        serde_json::to_value(players).unwrap_or(JsonValue::Null),
    );
    JsonValue::Object(out)
}

fn print_players(session: &Session) {
    let snapshot = session.snapshot();
    println!(
        "{} players ({} framing, {} bytes decompressed)",
        snapshot.player_count,
        snapshot.framing.label(),
        snapshot.decompressed_len
    );
    for entry in session.players() {
        print_player(&entry);
    }
}

fn print_player(entry: &PlayerEntry) {
    let mut line = format!("{:>2}. {:<18}", entry.index, entry.name);
    for (slot, name) in RESOURCE_NAMES.iter().enumerate() {
        line.push_str(&format!(
            "  {}: {:>9}",
            name,
            format_resource(entry.resources[slot])
        ));
    }
    println!("{line}");
}

fn format_resource(value: f32) -> String {
    let n = value.round() as i64;
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
