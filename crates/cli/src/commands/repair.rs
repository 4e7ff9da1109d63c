//! `vitalis repair` — Repair model output without calling a model.

use std::io::Read;
use std::path::PathBuf;

use vitalis_repair::{ParseStage, parse_with_stage};

pub async fn run(file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let input = match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let (parsed, stage) = parse_with_stage(&input);
    match stage {
        ParseStage::Direct => eprintln!("  ✅ Parsed after cleanup"),
        ParseStage::Balanced => eprintln!("  ⚠️  Parsed after closing truncated structure"),
        ParseStage::Failed => return Err("Could not recover a JSON object or array".into()),
    }
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
