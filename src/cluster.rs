use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use smartcore::cluster::kmeans::{KMeans, KMeansParameters};
use smartcore::decomposition::pca::{PCA, PCAParameters};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::models::{Level, SCORE_COLUMNS, SKILL_COLUMNS};
use crate::table::{is_null, Table};

pub const DEFAULT_CLUSTERS: usize = 4;
pub const DEFAULT_SEED: u64 = 42;
pub const MAX_ITER: usize = 300;

/// Diagnostic sweep bounds for the elbow curve. The sweep never feeds back
/// into the final cluster count.
pub const SWEEP_MIN: usize = 2;
pub const SWEEP_MAX: usize = 10;

pub type ClusterModel = KMeans<f64, u8, DenseMatrix<f64>, Vec<u8>>;

/// The numeric matrix fed to k-means, with the columns that produced it.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

/// Zero-mean/unit-variance standardization fitted on population statistics.
/// Zero-variance features scale by 1 so they pass through centered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(data: &[Vec<f64>]) -> StandardScaler {
        let columns = data.first().map(|row| row.len()).unwrap_or(0);
        let count = data.len() as f64;
        let mut means = vec![0.0; columns];
        for row in data {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= count;
        }

        let mut stds = vec![0.0; columns];
        for row in data {
            for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
                *std += (value - mean) * (value - mean);
            }
        }
        for std in &mut stds {
            *std = (*std / count).sqrt();
            if *std == 0.0 {
                *std = 1.0;
            }
        }

        StandardScaler { means, stds }
    }

    pub fn transform(&self, data: &[Vec<f64>]) -> Vec<Vec<f64>> {
        data.iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.stds))
                    .map(|(value, (mean, std))| (value - mean) / std)
                    .collect()
            })
            .collect()
    }
}

/// Selects the skill and performance columns present in the table and builds
/// the numeric feature matrix: levels encoded as Low 0 / Medium 1 / High 2,
/// performance scores parsed as floats.
pub fn build_feature_matrix(table: &Table) -> anyhow::Result<FeatureMatrix> {
    if table.is_empty() {
        bail!("no student records to cluster");
    }
    let mut columns = table.existing_columns(SKILL_COLUMNS);
    columns.extend(table.existing_columns(SCORE_COLUMNS));
    if columns.is_empty() {
        bail!("none of the clustering feature columns are present");
    }

    let indices: Vec<(usize, bool)> = columns
        .iter()
        .filter_map(|name| {
            let index = table.column_index(name)?;
            Some((index, SKILL_COLUMNS.contains(&name.as_str())))
        })
        .collect();

    let mut data = Vec::with_capacity(table.len());
    for (row_number, row) in table.rows.iter().enumerate() {
        let mut features = Vec::with_capacity(indices.len());
        for &(index, is_skill) in &indices {
            if is_skill {
                features.push(Level::from_raw(&row[index]).ordinal() as f64);
            } else {
                let value = row[index].trim().parse::<f64>().with_context(|| {
                    format!(
                        "row {}: column {:?} holds a non-numeric value {:?}",
                        row_number + 1,
                        table.headers[index],
                        row[index]
                    )
                })?;
                features.push(value);
            }
        }
        data.push(features);
    }

    Ok(FeatureMatrix { columns, data })
}

/// Fits k-means at a fixed k with a fixed seed and returns the model with its
/// cluster assignment. Reproducibility is best-effort: identical input and
/// seed give identical labels modulo floating-point differences across
/// environments.
pub fn fit_clusters(
    scaled: &[Vec<f64>],
    k: usize,
    seed: u64,
) -> anyhow::Result<(ClusterModel, Vec<u8>)> {
    if scaled.is_empty() {
        bail!("cannot cluster an empty population");
    }
    if k > scaled.len() {
        bail!(
            "cannot form {k} clusters from {} student records",
            scaled.len()
        );
    }
    let matrix = to_matrix(scaled);
    let mut parameters = KMeansParameters::default().with_k(k).with_max_iter(MAX_ITER);
    parameters.seed = Some(seed);
    let model: ClusterModel = KMeans::fit(&matrix, parameters)
        .with_context(|| format!("k-means failed for k={k}"))?;
    let labels = model
        .predict(&matrix)
        .context("k-means prediction failed")?;
    Ok((model, labels))
}

/// Within-cluster sum of squared distances to the label-wise centroids.
pub fn inertia(scaled: &[Vec<f64>], labels: &[u8]) -> f64 {
    let columns = scaled.first().map(|row| row.len()).unwrap_or(0);
    let k = labels.iter().copied().max().map(|m| m as usize + 1).unwrap_or(0);
    let mut sums = vec![vec![0.0; columns]; k];
    let mut counts = vec![0usize; k];
    for (row, &label) in scaled.iter().zip(labels) {
        counts[label as usize] += 1;
        for (sum, value) in sums[label as usize].iter_mut().zip(row) {
            *sum += value;
        }
    }
    let centroids: Vec<Vec<f64>> = sums
        .into_iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                sum
            } else {
                sum.into_iter().map(|v| v / count as f64).collect()
            }
        })
        .collect();

    scaled
        .iter()
        .zip(labels)
        .map(|(row, &label)| {
            row.iter()
                .zip(&centroids[label as usize])
                .map(|(value, centroid)| (value - centroid) * (value - centroid))
                .sum::<f64>()
        })
        .sum()
}

/// Sweeps k over the diagnostic range (capped at the population size) and
/// returns the inertia curve. Plot fodder only; the caller picks the final k
/// independently of this curve.
pub fn elbow_curve(scaled: &[Vec<f64>], seed: u64) -> anyhow::Result<Vec<(usize, f64)>> {
    let upper = SWEEP_MAX.min(scaled.len());
    let mut curve = Vec::new();
    for k in SWEEP_MIN..=upper {
        let (_, labels) = fit_clusters(scaled, k, seed)?;
        curve.push((k, inertia(scaled, &labels)));
    }
    Ok(curve)
}

/// Projects the standardized matrix onto its first two principal components.
/// Returns the projected points and the explained variance ratio of each
/// component, derived from the projected column variances over the total
/// feature variance.
pub fn pca_projection(scaled: &[Vec<f64>]) -> anyhow::Result<(Vec<(f64, f64)>, (f64, f64))> {
    let columns = scaled.first().map(|row| row.len()).unwrap_or(0);
    if scaled.len() < 2 || columns < 2 {
        bail!("PCA projection needs at least two rows and two feature columns");
    }
    let matrix = to_matrix(scaled);
    let pca = PCA::fit(&matrix, PCAParameters::default().with_n_components(2))
        .context("PCA fit failed")?;
    let projected = pca.transform(&matrix).context("PCA transform failed")?;

    let points: Vec<(f64, f64)> = (0..scaled.len())
        .map(|row| (*projected.get((row, 0)), *projected.get((row, 1))))
        .collect();

    let total: f64 = (0..columns)
        .map(|column| population_variance(scaled.iter().map(|row| row[column])))
        .sum();
    let ratio = |variance: f64| if total == 0.0 { 0.0 } else { variance / total };
    let first = ratio(population_variance(points.iter().map(|p| p.0)));
    let second = ratio(population_variance(points.iter().map(|p| p.1)));
    Ok((points, (first, second)))
}

fn population_variance(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        return 0.0;
    }
    let mean = collected.iter().sum::<f64>() / collected.len() as f64;
    collected.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / collected.len() as f64
}

/// Per-cluster average skill levels (Low 1, Medium 2, High 3) for the bar
/// charts. Clusters without members average to zero.
pub fn cluster_skill_means(
    table: &Table,
    labels: &[u8],
    k: usize,
) -> (Vec<String>, Vec<Vec<f64>>) {
    let skills = table.existing_columns(SKILL_COLUMNS);
    let indices: Vec<usize> = skills
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    let mut sums = vec![vec![0.0; skills.len()]; k];
    let mut counts = vec![0usize; k];
    for (row, &label) in table.rows.iter().zip(labels) {
        let cluster = label as usize;
        if cluster >= k {
            continue;
        }
        counts[cluster] += 1;
        for (slot, &index) in sums[cluster].iter_mut().zip(&indices) {
            if !is_null(&row[index]) {
                *slot += Level::from_raw(&row[index]).weight();
            }
        }
    }
    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            for slot in sum.iter_mut() {
                *slot /= count as f64;
            }
        }
    }
    (skills, sums)
}

pub fn save_model(path: &Path, model: &ClusterModel) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    bincode::serialize_into(BufWriter::new(file), model)
        .with_context(|| format!("failed to serialize model to {}", path.display()))?;
    Ok(())
}

pub fn save_scaler(path: &Path, scaler: &StandardScaler) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    bincode::serialize_into(BufWriter::new(file), scaler)
        .with_context(|| format!("failed to serialize scaler to {}", path.display()))?;
    Ok(())
}

pub fn load_model(path: &Path) -> anyhow::Result<ClusterModel> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let model = bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("failed to deserialize model from {}", path.display()))?;
    Ok(model)
}

pub fn load_scaler(path: &Path) -> anyhow::Result<StandardScaler> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let scaler = bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("failed to deserialize scaler from {}", path.display()))?;
    Ok(scaler)
}

fn to_matrix(data: &[Vec<f64>]) -> DenseMatrix<f64> {
    let rows: Vec<&[f64]> = data.iter().map(|row| row.as_slice()).collect();
    DenseMatrix::from_2d_array(&rows)
}
