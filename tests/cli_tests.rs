//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn toolkit() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("student-team-formation").unwrap()
}

fn predict_teams() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("predict_teams").unwrap()
}

fn write_raw_students(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("students.csv");
    let mut contents = String::from(
        "Student Id,name,current_course,technical_skills,programming_languages,soft_skills,Grade,Quiz,Midterm,Total\n",
    );
    let rows = [
        "1,Ada,Math,\"Data Analysis, SQL\",\"Python, C++\",\"Teamwork, Leadership\",A,8,70,92",
        "2,Grace,Physics,\"Machine Learning\",\"Python, Java\",Communication,B,6,,75",
        "3,Lin,Math,Cybersecurity,Go,Teamwork,,7,64,81",
        "4,Mary,Physics,\"Data Analysis\",\"Java, SQL\",Leadership,A,,58,68",
        "5,Alan,Math,\"Machine Learning, Cloud Computing\",Python,Teamwork,B,9,77,95",
        "6,Edsger,Physics,Cybersecurity,\"C++, Go\",Communication,A,5,49,60",
        "7,Barbara,Math,\"Data Analysis, Cloud Computing\",SQL,Leadership,B,8,71,88",
        "8,Donald,Physics,Machine Learning,\"Python, Java\",Teamwork,A,7,66,79",
    ];
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn pipeline_runs_end_to_end() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_students(&dir);
    let processed = dir.path().join("processed.csv");
    let leveled = dir.path().join("leveled.csv");
    let roster = dir.path().join("teams.csv");
    let report = dir.path().join("summary.md");

    toolkit()
        .arg("preprocess")
        .arg("--input")
        .arg(&raw)
        .arg("--out")
        .arg(&processed)
        .assert()
        .success()
        .stdout(predicate::str::contains("skill indicator columns"));

    toolkit()
        .arg("convert-levels")
        .arg("--input")
        .arg(&processed)
        .arg("--out")
        .arg(&leveled)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted columns"));

    toolkit()
        .arg("cluster")
        .arg("--input")
        .arg(&leveled)
        .arg("--out")
        .arg(&roster)
        .arg("--clusters")
        .arg("2")
        .arg("--team-size")
        .arg("4")
        .arg("--plot-dir")
        .arg(dir.path())
        .arg("--model-out")
        .arg(dir.path().join("team_model.bin"))
        .arg("--scaler-out")
        .arg(dir.path().join("scaler.bin"))
        .arg("--report-out")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Clustering complete using k=2."));

    for artifact in [
        "elbow_plot.svg",
        "pca_scatter_plot.svg",
        "team_skill_bar_charts.svg",
        "team_model.bin",
        "scaler.bin",
    ] {
        assert!(dir.path().join(artifact).exists(), "missing {artifact}");
    }

    let summary = std::fs::read_to_string(&report).unwrap();
    assert!(summary.contains("- Total students: 8"));

    // every student lands in exactly one team of at most four members
    let roster_contents = std::fs::read_to_string(&roster).unwrap();
    let mut reader = csv::Reader::from_reader(roster_contents.as_bytes());
    let headers = reader.headers().unwrap().clone();
    let id_index = headers.iter().position(|h| h == "Student Id").unwrap();
    let team_index = headers.iter().position(|h| h == "Team_Number").unwrap();

    let mut ids = Vec::new();
    let mut team_sizes: std::collections::HashMap<String, usize> = Default::default();
    for record in reader.records() {
        let record = record.unwrap();
        ids.push(record[id_index].to_string());
        *team_sizes.entry(record[team_index].to_string()).or_default() += 1;
    }
    ids.sort();
    assert_eq!(ids.len(), 8);
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert!(team_sizes.values().all(|&size| (1..=4).contains(&size)));
}

#[test]
fn cluster_runs_are_reproducible() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_students(&dir);
    let processed = dir.path().join("processed.csv");
    let leveled = dir.path().join("leveled.csv");

    toolkit()
        .arg("preprocess")
        .arg("--input")
        .arg(&raw)
        .arg("--out")
        .arg(&processed)
        .assert()
        .success();
    toolkit()
        .arg("convert-levels")
        .arg("--input")
        .arg(&processed)
        .arg("--out")
        .arg(&leveled)
        .assert()
        .success();

    let mut rosters = Vec::new();
    for run in 0..2 {
        let roster = dir.path().join(format!("teams_{run}.csv"));
        toolkit()
            .arg("cluster")
            .arg("--input")
            .arg(&leveled)
            .arg("--out")
            .arg(&roster)
            .arg("--clusters")
            .arg("2")
            .arg("--team-size")
            .arg("3")
            .arg("--seed")
            .arg("42")
            .arg("--plot-dir")
            .arg(dir.path())
            .assert()
            .success();
        rosters.push(std::fs::read_to_string(&roster).unwrap());
    }
    assert_eq!(rosters[0], rosters[1]);
}

#[test]
fn shim_rejects_wrong_arity_with_a_silent_stdout() {
    predict_teams()
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage: predict_teams"));

    predict_teams()
        .args(["only-one-argument"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());

    predict_teams()
        .args(["data.csv", "4", "extra"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn shim_rejects_non_numeric_team_sizes_before_processing() {
    predict_teams()
        .args(["data.csv", "four"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("positive integer"));
}

#[test]
fn shim_reports_missing_files_as_json_and_exits_zero() {
    let output = predict_teams()
        .args(["definitely-missing.csv", "4"])
        .assert()
        .success()
        .get_output()
        .clone();

    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["success"], Value::Bool(false));
    let error = payload["error"].as_str().unwrap();
    assert!(!error.is_empty());
}

#[test]
fn shim_emits_one_parseable_team_assignment() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_students(&dir);

    let output = predict_teams()
        .arg(&raw)
        .arg("4")
        .assert()
        .success()
        .get_output()
        .clone();

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim().lines().count(), 1);

    let payload: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(payload["success"], Value::Bool(true));
    assert_eq!(payload["total_students"], Value::from(8));
    let teams = payload["teams"].as_array().unwrap();
    assert_eq!(teams.len(), payload["total_teams"].as_u64().unwrap() as usize);
    assert!(payload["clusters_used"].as_u64().unwrap() >= 1);

    let mut seen = Vec::new();
    for team in teams {
        let members = team["members"].as_array().unwrap();
        assert!(!members.is_empty() && members.len() <= 4);
        assert!(team["justification"].as_str().unwrap().contains("Cluster"));
        for member in members {
            seen.push(member["Student Id"].as_f64().unwrap() as i64);
            assert!(member["cluster"].is_u64());
        }
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=8).collect::<Vec<_>>());
}

#[test]
fn shim_runs_are_reproducible() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_students(&dir);

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let output = predict_teams()
            .arg(&raw)
            .arg("3")
            .assert()
            .success()
            .get_output()
            .clone();
        outputs.push(String::from_utf8(output.stdout).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}
