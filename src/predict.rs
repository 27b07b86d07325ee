use std::path::Path;

use anyhow::bail;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cluster::{fit_clusters, DEFAULT_SEED};
use crate::models::{COURSE_COLUMN, TOTAL_COLUMN};
use crate::table::{is_null, Table};
use crate::teams::{form_teams, justification, MemberProfile};

const CLUSTER_FIELD: &str = "cluster";
const DUMMY_FEATURE: &str = "dummy_feature";

#[derive(Debug, Serialize)]
pub struct TeamPayload {
    pub team_number: usize,
    pub members: Vec<Map<String, Value>>,
    pub justification: String,
}

/// The one JSON object the shim prints. Success payloads carry the teams and
/// counts; failure payloads carry only the error string.
#[derive(Debug, Serialize)]
pub struct PredictionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_students: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_teams: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clusters_used: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    fn failure(error: String) -> PredictionResult {
        PredictionResult {
            success: false,
            teams: None,
            total_students: None,
            total_teams: None,
            clusters_used: None,
            error: Some(error),
        }
    }
}

/// Runs the reduced clustering + team formation pipeline. Every processing
/// failure is converted into a `success: false` payload so the caller always
/// receives parseable output.
pub fn predict_teams(path: &Path, team_size: usize) -> PredictionResult {
    match run(path, team_size) {
        Ok(result) => result,
        Err(error) => PredictionResult::failure(format!("{error:#}")),
    }
}

fn run(path: &Path, team_size: usize) -> anyhow::Result<PredictionResult> {
    if team_size == 0 {
        bail!("team size must be a positive integer");
    }

    let mut table = Table::from_path(path)?;
    eprintln!("Loaded data with {} students", table.len());
    if table.is_empty() {
        bail!("{} contains no student records", path.display());
    }

    let mut feature_columns: Vec<usize> = (0..table.headers.len())
        .filter(|&index| table.is_numeric_column(index))
        .collect();
    if feature_columns.is_empty() {
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
        let values: Vec<String> = (0..table.len())
            .map(|_| rng.gen::<f64>().to_string())
            .collect();
        table.push_column(DUMMY_FEATURE, values);
        feature_columns = vec![table.headers.len() - 1];
    }
    let names: Vec<&str> = feature_columns
        .iter()
        .map(|&index| table.headers[index].as_str())
        .collect();
    eprintln!("Using columns for features: {names:?}");

    // missing feature values count as zero in the reduced pipeline
    let features: Vec<Vec<f64>> = table
        .rows
        .iter()
        .map(|row| {
            feature_columns
                .iter()
                .map(|&index| row[index].trim().parse::<f64>().unwrap_or(0.0))
                .collect()
        })
        .collect();

    let clusters = (table.len() / team_size).max(2);
    let (_, labels) = fit_clusters(&features, clusters, DEFAULT_SEED)?;
    let mut distinct: Vec<u8> = labels.clone();
    distinct.sort_unstable();
    distinct.dedup();
    eprintln!("Clustering completed with {} clusters", distinct.len());

    let numeric_columns: Vec<bool> = (0..table.headers.len())
        .map(|index| table.is_numeric_column(index))
        .collect();
    let course_index = table.column_index(COURSE_COLUMN);
    let total_index = table.column_index(TOTAL_COLUMN);

    let teams: Vec<TeamPayload> = form_teams(&labels, team_size, DEFAULT_SEED)
        .into_iter()
        .map(|team| {
            let members: Vec<Map<String, Value>> = team
                .members
                .iter()
                .map(|&row| member_record(&table, &numeric_columns, row, labels[row]))
                .collect();
            let profiles: Vec<MemberProfile> = team
                .members
                .iter()
                .map(|&row| MemberProfile {
                    course: course_index
                        .map(|index| table.rows[row][index].trim())
                        .filter(|course| !course.is_empty())
                        .unwrap_or("Unknown")
                        .to_string(),
                    total: total_index
                        .and_then(|index| table.rows[row][index].trim().parse::<f64>().ok()),
                })
                .collect();
            TeamPayload {
                team_number: team.number,
                justification: justification(&profiles, team.cluster),
                members,
            }
        })
        .collect();

    Ok(PredictionResult {
        success: true,
        total_students: Some(table.len()),
        total_teams: Some(teams.len()),
        clusters_used: Some(distinct.len()),
        teams: Some(teams),
        error: None,
    })
}

/// One member as a JSON object: numeric columns become numbers, nulls become
/// JSON null, everything else stays a string; the cluster label is appended.
fn member_record(
    table: &Table,
    numeric_columns: &[bool],
    row: usize,
    label: u8,
) -> Map<String, Value> {
    let mut record = Map::new();
    for (index, header) in table.headers.iter().enumerate() {
        let cell = table.rows[row][index].as_str();
        let value = if is_null(cell) {
            Value::Null
        } else if numeric_columns[index] {
            cell.trim()
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or(Value::Null)
        } else {
            Value::String(cell.to_string())
        };
        record.insert(header.clone(), value);
    }
    record.insert(CLUSTER_FIELD.to_string(), Value::from(label as u64));
    record
}
