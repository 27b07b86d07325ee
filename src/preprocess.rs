use std::collections::BTreeSet;

use crate::models::{CATEGORICAL_COLUMNS, SCORE_COLUMNS, SKILL_SOURCE_COLUMNS};
use crate::table::{is_null, Table};

/// The skill indicator columns appended to the processed table, in output
/// order. The vocabulary is derived from the input at run time, so two runs
/// on different populations can produce different column sets; consumers
/// must not assume a stable schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillVocabulary {
    pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    pub score_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub vocabulary: SkillVocabulary,
}

/// Runs the full preprocessing pass in place: mean-fill the score columns,
/// fill the categorical columns with "Unknown", scale scores to [0,1], and
/// expand the free-text skill lists into indicator columns.
pub fn preprocess(table: &mut Table) -> PreprocessSummary {
    let score_columns = table.existing_columns(SCORE_COLUMNS);
    for name in &score_columns {
        if let Some(index) = table.column_index(name) {
            if let Some(mean) = table.column_mean(index) {
                table.fill_nulls(index, &mean.to_string());
            }
        }
    }

    let categorical_columns = table.existing_columns(CATEGORICAL_COLUMNS);
    for name in &categorical_columns {
        if let Some(index) = table.column_index(name) {
            table.fill_nulls(index, "Unknown");
        }
    }

    for name in &score_columns {
        if let Some(index) = table.column_index(name) {
            scale_to_unit_range(table, index);
        }
    }

    let vocabulary = encode_skills(table);

    PreprocessSummary {
        score_columns,
        categorical_columns,
        vocabulary,
    }
}

/// Min-max scales a numeric column in place. A constant column maps to 0.
fn scale_to_unit_range(table: &mut Table, index: usize) {
    let values = table.numeric_values(index);
    let (Some(min), Some(max)) = (
        values.iter().cloned().reduce(f64::min),
        values.iter().cloned().reduce(f64::max),
    ) else {
        return;
    };
    let range = max - min;
    for row in &mut table.rows {
        if let Ok(value) = row[index].trim().parse::<f64>() {
            let scaled = if range == 0.0 { 0.0 } else { (value - min) / range };
            row[index] = scaled.to_string();
        }
    }
}

/// Splits the comma-separated skill fields, pools the trimmed tokens per
/// student, and appends one "1"/"0" indicator column per distinct token
/// observed across the whole population (sorted). The source text columns
/// are dropped afterward.
pub fn encode_skills(table: &mut Table) -> SkillVocabulary {
    let source_columns = table.existing_columns(SKILL_SOURCE_COLUMNS);
    if source_columns.is_empty() {
        return SkillVocabulary { names: Vec::new() };
    }
    let indices: Vec<usize> = source_columns
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    let mut per_student: Vec<BTreeSet<String>> = Vec::with_capacity(table.len());
    let mut vocabulary: BTreeSet<String> = BTreeSet::new();
    for row in &table.rows {
        let mut tokens = BTreeSet::new();
        for &index in &indices {
            if is_null(&row[index]) {
                continue;
            }
            for token in row[index].split(',') {
                let token = token.trim();
                if !token.is_empty() {
                    tokens.insert(token.to_string());
                    vocabulary.insert(token.to_string());
                }
            }
        }
        per_student.push(tokens);
    }

    let names: Vec<String> = vocabulary.into_iter().collect();
    for name in &names {
        let values: Vec<String> = per_student
            .iter()
            .map(|tokens| if tokens.contains(name) { "1" } else { "0" }.to_string())
            .collect();
        table.push_column(name, values);
    }

    let drop: Vec<&str> = source_columns.iter().map(|s| s.as_str()).collect();
    table.drop_columns(&drop);

    SkillVocabulary { names }
}
