use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde_json::Value;
use swgb_core::document::PLAYER_MARKER;

fn push_player(buf: &mut Vec<u8>, name: &str, gap: usize, resources: [f32; 4]) {
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend(std::iter::repeat(0u8).take(gap));
    buf.extend_from_slice(&PLAYER_MARKER);
    for value in resources {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

fn fixture_bytes() -> Vec<u8> {
    let mut buf = vec![0u8; 16];
    push_player(&mut buf, "Han Solo", 7, [1000.0, 2000.0, 3000.0, 4000.0]);
    buf.extend_from_slice(&[0u8; 24]);
    push_player(&mut buf, "Leia Organa", 5, [500.0, 600.0, 700.0, 800.0]);
    buf.extend_from_slice(&[0u8; 24]);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&buf).expect("zlib encode failed");
    encoder.finish().expect("zlib finish failed")
}

fn temp_save_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.ga2", std::process::id(), nanos))
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_swgb-se"))
        .args(args)
        .output()
        .expect("failed to run swgb-se CLI")
}

fn players_of(path: &str) -> Vec<Value> {
    let output = run_cli(&["--json", path]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is not valid JSON");
    json["players"].as_array().expect("players missing").clone()
}

#[test]
fn cli_edit_to_fresh_output_keeps_source_unchanged() {
    let in_path = temp_save_path("swgb_cli_edit_in");
    let out_path = temp_save_path("swgb_cli_edit_out");
    fs::write(&in_path, fixture_bytes()).expect("failed to write fixture");

    let output = run_cli(&[
        "--player",
        "1",
        "--set-nova",
        "12345",
        "--output",
        out_path.to_string_lossy().as_ref(),
        in_path.to_string_lossy().as_ref(),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote edited save to"));

    // Fresh output: nothing to back up.
    let mut backup = out_path.as_os_str().to_os_string();
    backup.push(".backup");
    assert!(!PathBuf::from(backup).exists());

    let source_players = players_of(in_path.to_string_lossy().as_ref());
    assert_eq!(source_players[1]["resources"][2], 700.0);

    let edited_players = players_of(out_path.to_string_lossy().as_ref());
    assert_eq!(edited_players[1]["resources"][2], 12345.0);
    assert_eq!(edited_players[1]["resources"][0], 500.0);
    assert_eq!(edited_players[0]["resources"][0], 1000.0);

    let _ = fs::remove_file(in_path);
    let _ = fs::remove_file(out_path);
}

#[test]
fn cli_in_place_edit_backs_up_original_bytes() {
    let path = temp_save_path("swgb_cli_inplace");
    let original = fixture_bytes();
    fs::write(&path, &original).expect("failed to write fixture");
    let path_str = path.to_string_lossy().to_string();

    let output = run_cli(&[
        "--player",
        "0",
        "--set-ore",
        "9000",
        "--output",
        &path_str,
        &path_str,
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Created backup:"));

    let mut backup = path.as_os_str().to_os_string();
    backup.push(".backup");
    let backup = PathBuf::from(backup);
    assert_eq!(fs::read(&backup).expect("backup missing"), original);

    let players = players_of(&path_str);
    assert_eq!(players[0]["resources"][3], 9000.0);

    let _ = fs::remove_file(path);
    let _ = fs::remove_file(backup);
}

#[test]
fn cli_rejects_out_of_range_edit() {
    let path = temp_save_path("swgb_cli_range");
    let out_path = temp_save_path("swgb_cli_range_out");
    fs::write(&path, fixture_bytes()).expect("failed to write fixture");

    let output = run_cli(&[
        "--player",
        "0",
        "--set-carbon",
        "2000000",
        "--output",
        out_path.to_string_lossy().as_ref(),
        path.to_string_lossy().as_ref(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("out of range"));
    assert!(stderr.contains("Carbon"));
    assert!(!out_path.exists());

    let _ = fs::remove_file(path);
}

#[test]
fn cli_rejects_unknown_player_index() {
    let path = temp_save_path("swgb_cli_badindex");
    fs::write(&path, fixture_bytes()).expect("failed to write fixture");

    let output = run_cli(&["--player", "7", path.to_string_lossy().as_ref()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no player with index 7"));

    let _ = fs::remove_file(path);
}
