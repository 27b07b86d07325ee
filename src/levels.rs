use crate::models::{Level, ID_COLUMN, LEVEL_COLUMNS, QUIZ_COLUMN};
use crate::table::{is_null, Table};

/// What the conversion pass actually touched, for caller-side reporting.
#[derive(Debug, Clone)]
pub struct LevelingSummary {
    pub converted: Vec<String>,
    pub missing: Vec<String>,
    pub assigned_identifiers: usize,
}

/// Imputes remaining gaps and converts the allow-listed columns to
/// High/Medium/Low. The passes run in a fixed order: identifier back-fill,
/// quiz median fill, generic numeric median fill, generic categorical mode
/// fill, then level conversion, so the conversion sees fully imputed data.
pub fn convert_levels(table: &mut Table) -> LevelingSummary {
    let assigned_identifiers = backfill_identifiers(table);
    fill_quiz_with_median(table);
    fill_numeric_with_median(table);
    fill_categorical_with_mode(table);

    let converted = table.existing_columns(LEVEL_COLUMNS);
    let missing: Vec<String> = LEVEL_COLUMNS
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();

    for name in &converted {
        if let Some(index) = table.column_index(name) {
            for row in &mut table.rows {
                row[index] = Level::from_raw(&row[index]).as_str().to_string();
            }
        }
    }

    LevelingSummary {
        converted,
        missing,
        assigned_identifiers,
    }
}

/// Back-fills null identifiers with a contiguous run of integers starting one
/// above the current maximum. Returns how many identifiers were assigned.
pub fn backfill_identifiers(table: &mut Table) -> usize {
    let index = match table.column_index(ID_COLUMN) {
        Some(index) => index,
        None => return 0,
    };
    let mut next = table
        .rows
        .iter()
        .filter(|row| !is_null(&row[index]))
        .filter_map(|row| parse_identifier(&row[index]))
        .max()
        .unwrap_or(0)
        + 1;

    let mut assigned = 0;
    for row in &mut table.rows {
        if is_null(&row[index]) {
            row[index] = next.to_string();
            next += 1;
            assigned += 1;
        }
    }
    assigned
}

fn parse_identifier(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|v| v as i64))
}

fn fill_quiz_with_median(table: &mut Table) {
    if let Some(index) = table.column_index(QUIZ_COLUMN) {
        if let Some(median) = table.column_median(index) {
            table.fill_nulls(index, &median.to_string());
        }
    }
}

fn fill_numeric_with_median(table: &mut Table) {
    for index in 0..table.headers.len() {
        if LEVEL_COLUMNS.contains(&table.headers[index].as_str()) {
            continue;
        }
        if !table.is_numeric_column(index) {
            continue;
        }
        if let Some(median) = table.column_median(index) {
            table.fill_nulls(index, &median.to_string());
        }
    }
}

fn fill_categorical_with_mode(table: &mut Table) {
    for index in 0..table.headers.len() {
        if LEVEL_COLUMNS.contains(&table.headers[index].as_str()) {
            continue;
        }
        if table.is_numeric_column(index) {
            continue;
        }
        let fill = table
            .column_mode(index)
            .unwrap_or_else(|| "Unknown".to_string());
        table.fill_nulls(index, &fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(headers: &[&str], rows: &[&[&str]]) -> Table {
        let mut table = Table::new(headers.iter().map(|h| h.to_string()).collect());
        table.rows = rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        table
    }

    #[test]
    fn converts_allow_listed_columns_and_reports_missing() {
        let mut table = table_with(
            &["Student Id", "Python", "Grade"],
            &[
                &["1", "1", "A"],
                &["2", "no", "B"],
                &["3", "", "A"],
                &["4", "weird", "B"],
            ],
        );
        let summary = convert_levels(&mut table);

        assert_eq!(summary.converted, vec!["Python".to_string()]);
        assert!(summary.missing.contains(&"Java".to_string()));
        let python = table.column_index("Python").unwrap();
        let levels: Vec<&str> = table.rows.iter().map(|r| r[python].as_str()).collect();
        assert_eq!(levels, vec!["High", "Low", "Medium", "Medium"]);
    }

    #[test]
    fn rerunning_conversion_leaves_levels_unchanged() {
        let mut table = table_with(&["Python"], &[&["1"], &["0"], &["maybe"]]);
        convert_levels(&mut table);
        let first: Vec<Vec<String>> = table.rows.clone();
        convert_levels(&mut table);
        assert_eq!(table.rows, first);
    }

    #[test]
    fn identifiers_are_backfilled_above_the_maximum() {
        let mut table = table_with(
            &["Student Id"],
            &[&["7"], &[""], &["3"], &[""]],
        );
        let assigned = backfill_identifiers(&mut table);
        assert_eq!(assigned, 2);
        let ids: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["7", "8", "3", "9"]);
    }

    #[test]
    fn all_null_identifiers_start_from_one() {
        let mut table = table_with(&["Student Id"], &[&[""], &[""]]);
        backfill_identifiers(&mut table);
        let ids: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn quiz_gaps_use_the_column_median() {
        let mut table = table_with(
            &["Quiz"],
            &[&["10"], &[""], &["20"], &["30"]],
        );
        convert_levels(&mut table);
        assert_eq!(table.rows[1][0], "20");
    }

    #[test]
    fn numeric_gaps_use_median_and_categorical_gaps_use_mode() {
        let mut table = table_with(
            &["rating", "Grade"],
            &[
                &["4", "A"],
                &["", "B"],
                &["2", "A"],
                &["6", ""],
            ],
        );
        convert_levels(&mut table);
        assert_eq!(table.rows[1][0], "4");
        assert_eq!(table.rows[3][1], "A");
    }

    #[test]
    fn all_null_categorical_columns_become_unknown() {
        let mut table = table_with(&["Categories"], &[&[""], &[""]]);
        convert_levels(&mut table);
        assert_eq!(table.rows[0][0], "Unknown");
        assert_eq!(table.rows[1][0], "Unknown");
    }
}
