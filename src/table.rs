use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};
use calamine::{open_workbook, Reader, Xls, Xlsx};

/// An in-memory table: one header row plus string cells, with empty cells
/// standing in for missing values.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn is_null(value: &str) -> bool {
    value.trim().is_empty()
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    /// Loads a table from a CSV file or an Excel workbook, decided by the
    /// file extension. Workbooks read their first sheet.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("xlsx") | Some("xls") => Table::from_workbook(path, None),
            _ => Table::from_csv(path),
        }
    }

    pub fn from_csv(path: &Path) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("failed to read header row from {}", path.display()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut table = Table::new(headers);
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to read row from {}", path.display()))?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(table.headers.len(), String::new());
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Reads a sheet of an Excel workbook; `sheet` of None means the first
    /// sheet in the workbook.
    pub fn from_workbook(path: &Path, sheet: Option<&str>) -> anyhow::Result<Self> {
        let rows = match path.extension().and_then(|e| e.to_str()) {
            Some("xls") => {
                let mut workbook: Xls<_> = open_workbook(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                read_sheet(&mut workbook, sheet, path)?
            }
            _ => {
                let mut workbook: Xlsx<_> = open_workbook(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                read_sheet(&mut workbook, sheet, path)?
            }
        };

        let mut iter = rows.into_iter();
        let headers = match iter.next() {
            Some(header_row) => header_row,
            None => bail!("{} has no header row", path.display()),
        };
        let mut table = Table::new(headers);
        for mut row in iter {
            row.resize(table.headers.len(), String::new());
            table.rows.push(row);
        }
        Ok(table)
    }

    pub fn to_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Intersects a fixed allow-list with the columns actually present,
    /// preserving the allow-list order.
    pub fn existing_columns(&self, wanted: &[&str]) -> Vec<String> {
        wanted
            .iter()
            .filter(|name| self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&i| !names.contains(&self.headers[i].as_str()))
            .collect();
        self.headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| row[i].clone()).collect();
        }
    }

    pub fn fill_nulls(&mut self, index: usize, value: &str) {
        for row in &mut self.rows {
            if is_null(&row[index]) {
                row[index] = value.to_string();
            }
        }
    }

    /// Parses the non-null cells of a column as floats, skipping anything
    /// unparseable.
    pub fn numeric_values(&self, index: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|row| !is_null(&row[index]))
            .filter_map(|row| row[index].trim().parse::<f64>().ok())
            .collect()
    }

    /// A column counts as numeric when it has at least one non-null cell and
    /// every non-null cell parses as a float.
    pub fn is_numeric_column(&self, index: usize) -> bool {
        let mut seen = false;
        for row in &self.rows {
            let cell = row[index].trim();
            if cell.is_empty() {
                continue;
            }
            if cell.parse::<f64>().is_err() {
                return false;
            }
            seen = true;
        }
        seen
    }

    pub fn column_mean(&self, index: usize) -> Option<f64> {
        let values = self.numeric_values(index);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    pub fn column_median(&self, index: usize) -> Option<f64> {
        let mut values = self.numeric_values(index);
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }

    /// The most frequent non-null value; ties break toward the value seen
    /// first. None when every cell is null.
    pub fn column_mode(&self, index: usize) -> Option<String> {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, row) in self.rows.iter().enumerate() {
            let cell = row[index].as_str();
            if is_null(cell) {
                continue;
            }
            let entry = counts.entry(cell).or_insert((0, position));
            entry.0 += 1;
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
            .map(|(value, _)| value.to_string())
    }
}

fn read_sheet<R>(workbook: &mut R, sheet: Option<&str>, path: &Path) -> anyhow::Result<Vec<Vec<String>>>
where
    R: Reader<std::io::BufReader<std::fs::File>>,
    R::Error: std::error::Error + Send + Sync + 'static,
{
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => match workbook.sheet_names().first() {
            Some(name) => name.clone(),
            None => bail!("{} contains no sheets", path.display()),
        },
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet {sheet_name:?} from {}", path.display()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}
