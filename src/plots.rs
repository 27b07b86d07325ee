use std::path::Path;

use anyhow::anyhow;
use plotters::prelude::*;

/// One color per cluster, cycling past eight.
const CLUSTER_COLORS: [RGBColor; 8] = [
    RGBColor(214, 39, 40),   // red
    RGBColor(31, 119, 180),  // blue
    RGBColor(44, 160, 44),   // green
    RGBColor(255, 127, 14),  // orange
    RGBColor(148, 103, 189), // purple
    RGBColor(140, 86, 75),   // brown
    RGBColor(227, 119, 194), // pink
    RGBColor(127, 127, 127), // gray
];

fn cluster_color(cluster: usize) -> RGBColor {
    CLUSTER_COLORS[cluster % CLUSTER_COLORS.len()]
}

/// Renders the diagnostic inertia curve from the k sweep.
pub fn elbow_plot(path: &Path, curve: &[(usize, f64)]) -> anyhow::Result<()> {
    if curve.is_empty() {
        return Err(anyhow!("elbow curve has no points to plot"));
    }
    let k_min = curve.first().map(|(k, _)| *k).unwrap_or(0) as i32;
    let k_max = curve.last().map(|(k, _)| *k).unwrap_or(0) as i32;
    let top = curve
        .iter()
        .map(|(_, inertia)| *inertia)
        .fold(0.0f64, f64::max)
        .max(1.0);

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("elbow plot: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Elbow Method for Optimal k", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(70)
        .build_cartesian_2d(k_min..k_max + 1, 0f64..top * 1.05)
        .map_err(|e| anyhow!("elbow plot: {e}"))?;
    chart
        .configure_mesh()
        .x_desc("Number of Clusters (k)")
        .y_desc("Inertia")
        .draw()
        .map_err(|e| anyhow!("elbow plot: {e}"))?;

    let points: Vec<(i32, f64)> = curve.iter().map(|(k, v)| (*k as i32, *v)).collect();
    chart
        .draw_series(LineSeries::new(points.clone(), &CLUSTER_COLORS[1]))
        .map_err(|e| anyhow!("elbow plot: {e}"))?;
    chart
        .draw_series(
            points
                .iter()
                .map(|point| Circle::new(*point, 4, CLUSTER_COLORS[1].filled())),
        )
        .map_err(|e| anyhow!("elbow plot: {e}"))?;

    root.present().map_err(|e| anyhow!("elbow plot: {e}"))?;
    Ok(())
}

/// Renders the PCA projection colored by cluster, with the explained
/// variance of each component in the axis labels.
pub fn pca_scatter(
    path: &Path,
    points: &[(f64, f64)],
    labels: &[u8],
    clusters: usize,
    variance: (f64, f64),
) -> anyhow::Result<()> {
    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));

    let root = SVGBackend::new(path, (1100, 750)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("pca scatter: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("PCA Scatter Plot of Student Clusters", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| anyhow!("pca scatter: {e}"))?;
    chart
        .configure_mesh()
        .x_desc(format!(
            "First Principal Component (Explained Variance: {:.1}%)",
            variance.0 * 100.0
        ))
        .y_desc(format!(
            "Second Principal Component (Explained Variance: {:.1}%)",
            variance.1 * 100.0
        ))
        .draw()
        .map_err(|e| anyhow!("pca scatter: {e}"))?;

    for cluster in 0..clusters {
        let color = cluster_color(cluster);
        chart
            .draw_series(
                points
                    .iter()
                    .zip(labels)
                    .filter(|(_, &label)| label as usize == cluster)
                    .map(|(point, _)| Circle::new(*point, 5, color.mix(0.75).filled())),
            )
            .map_err(|e| anyhow!("pca scatter: {e}"))?
            .label(format!("Cluster {}", cluster + 1))
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()
        .map_err(|e| anyhow!("pca scatter: {e}"))?;

    root.present().map_err(|e| anyhow!("pca scatter: {e}"))?;
    Ok(())
}

/// Renders one bar chart of average skill levels per cluster, in a grid.
pub fn skill_bar_charts(
    path: &Path,
    skills: &[String],
    cluster_means: &[Vec<f64>],
) -> anyhow::Result<()> {
    if skills.is_empty() || cluster_means.is_empty() {
        return Err(anyhow!("no skill averages to plot"));
    }
    let clusters = cluster_means.len();
    let columns = 2usize;
    let rows = clusters.div_ceil(columns);

    let root = SVGBackend::new(path, (1400, (420 * rows) as u32)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("skill charts: {e}"))?;
    let areas = root.split_evenly((rows, columns));

    for (cluster, means) in cluster_means.iter().enumerate() {
        let area = &areas[cluster];
        let color = cluster_color(cluster);
        let mut chart = ChartBuilder::on(area)
            .caption(
                format!("Team {} Average Skills", cluster + 1),
                ("sans-serif", 22),
            )
            .margin(10)
            .x_label_area_size(90)
            .y_label_area_size(40)
            .build_cartesian_2d(0i32..skills.len() as i32, 0f64..3f64)
            .map_err(|e| anyhow!("skill charts: {e}"))?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(skills.len())
            .x_label_formatter(&|index| {
                skills
                    .get(*index as usize)
                    .cloned()
                    .unwrap_or_default()
            })
            .y_desc("Average Level")
            .draw()
            .map_err(|e| anyhow!("skill charts: {e}"))?;
        chart
            .draw_series(means.iter().enumerate().map(|(index, &mean)| {
                Rectangle::new(
                    [(index as i32, 0.0), (index as i32 + 1, mean)],
                    color.mix(0.7).filled(),
                )
            }))
            .map_err(|e| anyhow!("skill charts: {e}"))?;
    }

    root.present().map_err(|e| anyhow!("skill charts: {e}"))?;
    Ok(())
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        min = min.min(value);
        max = max.max(value);
    }
    if !min.is_finite() || !max.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(0.5);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_cycle_past_the_palette() {
        assert_eq!(cluster_color(0), cluster_color(8));
        assert_ne!(cluster_color(0), cluster_color(1));
    }

    #[test]
    fn padded_range_handles_empty_input() {
        assert_eq!(padded_range(std::iter::empty()), (-1.0, 1.0));
    }

    #[test]
    fn padded_range_widens_tight_spans() {
        let (min, max) = padded_range([1.0, 1.0].into_iter());
        assert!(min < 1.0 && max > 1.0);
    }

    #[test]
    fn elbow_plot_writes_an_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elbow.svg");
        elbow_plot(&path, &[(2, 10.0), (3, 6.0), (4, 5.0)]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<svg"));
    }

    #[test]
    fn charts_reject_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(elbow_plot(&dir.path().join("e.svg"), &[]).is_err());
        assert!(skill_bar_charts(&dir.path().join("s.svg"), &[], &[]).is_err());
    }
}
