//! One-shot team prediction shim. Takes a data path and a team size, prints
//! exactly one JSON object on stdout, and keeps every progress line on
//! stderr so the caller can parse the primary channel unconditionally.

use std::path::Path;
use std::process::ExitCode;

use student_team_formation::predict;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: predict_teams <data_path> <team_size>");
        return ExitCode::FAILURE;
    }

    let data_path = Path::new(&args[1]);
    let team_size: usize = match args[2].parse() {
        Ok(size) => size,
        Err(_) => {
            eprintln!("team size must be a positive integer, got {:?}", args[2]);
            eprintln!("Usage: predict_teams <data_path> <team_size>");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Predicting teams for {} with team size {team_size}.", data_path.display());
    let result = predict::predict_teams(data_path, team_size);
    if !result.success {
        if let Some(error) = &result.error {
            eprintln!("Team prediction failed: {error}");
        }
    }

    // the JSON contract: one object on stdout, exit 0 once it is emitted
    match serde_json::to_string(&result) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("failed to encode result as JSON: {error}");
            ExitCode::FAILURE
        }
    }
}
