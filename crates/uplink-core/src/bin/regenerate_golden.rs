use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use uplink_core::{DecodeOutcome, ProfileRegistry, decode_with_registry};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;
    let registry = ProfileRegistry::builtin();

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() || !path.join("input.txt").exists() {
            continue;
        }
        regenerate_one(&registry, &path)?;
    }

    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("failed to read {}: {}", path.display(), err))
}

fn regenerate_one(registry: &ProfileRegistry, dir: &Path) -> Result<(), String> {
    let profile = read(&dir.join("profile.txt"))?;
    let input = read(&dir.join("input.txt"))?;

    let mut outcomes = Vec::new();
    for line in input.lines() {
        let mut outcome = decode_with_registry(registry, profile.trim(), Some(line))
            .map_err(|err| format!("{}: {}", dir.display(), err))?;
        if let DecodeOutcome::InvalidEncoding { reason } = &mut outcome {
            reason.clear();
        }
        outcomes.push(outcome);
    }

    let json = serde_json::to_string_pretty(&outcomes)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    let output = dir.join("expected.json");
    fs::write(&output, json + "\n")
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
