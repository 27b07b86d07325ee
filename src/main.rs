use std::path::PathBuf;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};

use student_team_formation::cluster::{self, StandardScaler};
use student_team_formation::levels;
use student_team_formation::models::{CLUSTER_COLUMN, TEAM_COLUMN};
use student_team_formation::plots;
use student_team_formation::preprocess;
use student_team_formation::report;
use student_team_formation::table::Table;
use student_team_formation::teams::{form_teams, Team};

#[derive(Parser)]
#[command(name = "student-team-formation")]
#[command(about = "Student clustering and team formation toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Impute missing values, scale scores, and binarize skill lists
    Preprocess {
        /// Raw student records (.csv, .xlsx, or .xls)
        #[arg(long)]
        input: PathBuf,
        /// Sheet name when reading a workbook; defaults to the first sheet
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long, default_value = "processed_students.csv")]
        out: PathBuf,
    },
    /// Convert binary skill columns to High/Medium/Low levels
    ConvertLevels {
        /// Preprocessed student records
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "processed_students_levels.csv")]
        out: PathBuf,
    },
    /// Cluster students and slice each cluster into teams
    Cluster {
        /// Leveled student records
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "clustered_teams.csv")]
        out: PathBuf,
        #[arg(long, default_value_t = cluster::DEFAULT_CLUSTERS)]
        clusters: usize,
        #[arg(long, default_value_t = 4)]
        team_size: usize,
        #[arg(long, default_value_t = cluster::DEFAULT_SEED)]
        seed: u64,
        /// Directory for the elbow, PCA, and skill charts
        #[arg(long, default_value = ".")]
        plot_dir: PathBuf,
        /// Persist the trained k-means model to this path
        #[arg(long)]
        model_out: Option<PathBuf>,
        /// Persist the fitted feature scaler to this path
        #[arg(long)]
        scaler_out: Option<PathBuf>,
        /// Write a markdown summary report to this path
        #[arg(long)]
        report_out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess { input, sheet, out } => run_preprocess(&input, sheet.as_deref(), &out),
        Commands::ConvertLevels { input, out } => run_convert_levels(&input, &out),
        Commands::Cluster {
            input,
            out,
            clusters,
            team_size,
            seed,
            plot_dir,
            model_out,
            scaler_out,
            report_out,
        } => run_cluster(RunClusterArgs {
            input,
            out,
            clusters,
            team_size,
            seed,
            plot_dir,
            model_out,
            scaler_out,
            report_out,
        }),
    }
}

fn run_preprocess(input: &PathBuf, sheet: Option<&str>, out: &PathBuf) -> anyhow::Result<()> {
    let mut table = match sheet {
        Some(name) => Table::from_workbook(input, Some(name))?,
        None => Table::from_path(input)?,
    };
    println!(
        "Loaded {} students with {} columns from {}.",
        table.len(),
        table.headers.len(),
        input.display()
    );

    let summary = preprocess::preprocess(&mut table);
    println!("Using score columns: {:?}", summary.score_columns);
    println!(
        "Filled categorical columns: {:?}",
        summary.categorical_columns
    );
    println!(
        "Derived {} skill indicator columns: {:?}",
        summary.vocabulary.names.len(),
        summary.vocabulary.names
    );

    table.to_csv(out)?;
    println!("Processed data written to {}.", out.display());
    Ok(())
}

fn run_convert_levels(input: &PathBuf, out: &PathBuf) -> anyhow::Result<()> {
    let mut table = Table::from_path(input)?;
    println!("Loaded {} students from {}.", table.len(), input.display());

    let summary = levels::convert_levels(&mut table);
    if summary.assigned_identifiers > 0 {
        println!(
            "Assigned {} missing student identifiers.",
            summary.assigned_identifiers
        );
    }
    println!("Converted columns: {:?}", summary.converted);
    if !summary.missing.is_empty() {
        println!("Skipped absent columns: {:?}", summary.missing);
    }

    table.to_csv(out)?;
    println!("Leveled data written to {}.", out.display());
    Ok(())
}

struct RunClusterArgs {
    input: PathBuf,
    out: PathBuf,
    clusters: usize,
    team_size: usize,
    seed: u64,
    plot_dir: PathBuf,
    model_out: Option<PathBuf>,
    scaler_out: Option<PathBuf>,
    report_out: Option<PathBuf>,
}

fn run_cluster(args: RunClusterArgs) -> anyhow::Result<()> {
    if args.team_size == 0 {
        bail!("--team-size must be at least 1");
    }
    if args.clusters == 0 {
        bail!("--clusters must be at least 1");
    }

    let mut table = Table::from_path(&args.input)?;
    println!(
        "Loaded {} students from {}.",
        table.len(),
        args.input.display()
    );

    // any cell the earlier passes left empty defaults to Medium
    for index in 0..table.headers.len() {
        table.fill_nulls(index, "Medium");
    }

    let features = cluster::build_feature_matrix(&table)?;
    println!(
        "Clustering on {} feature columns: {:?}",
        features.columns.len(),
        features.columns
    );

    let scaler = StandardScaler::fit(&features.data);
    let scaled = scaler.transform(&features.data);

    let curve = cluster::elbow_curve(&scaled, args.seed)?;
    let elbow_path = args.plot_dir.join("elbow_plot.svg");
    plots::elbow_plot(&elbow_path, &curve)?;
    println!("Elbow plot saved to {}.", elbow_path.display());

    let (model, labels) = cluster::fit_clusters(&scaled, args.clusters, args.seed)?;
    println!("Clustering complete using k={}.", args.clusters);
    let sizes = report::cluster_sizes(&labels, args.clusters);
    for (cluster, size) in sizes.iter().enumerate() {
        println!("Cluster {}: {} students", cluster + 1, size);
    }

    let (points, variance) = cluster::pca_projection(&scaled)?;
    let pca_path = args.plot_dir.join("pca_scatter_plot.svg");
    plots::pca_scatter(&pca_path, &points, &labels, args.clusters, variance)?;
    println!("PCA scatter plot saved to {}.", pca_path.display());

    let (skills, means) = cluster::cluster_skill_means(&table, &labels, args.clusters);
    if skills.is_empty() {
        println!("No skill columns present; skipping the skill charts.");
    } else {
        let skills_path = args.plot_dir.join("team_skill_bar_charts.svg");
        plots::skill_bar_charts(&skills_path, &skills, &means)?;
        println!("Team skill bar charts saved to {}.", skills_path.display());
    }

    let teams = form_teams(&labels, args.team_size, args.seed);
    write_team_roster(&table, &labels, &teams, &args.out)?;
    println!(
        "Formed {} teams across {} students; roster written to {}.",
        teams.len(),
        table.len(),
        args.out.display()
    );

    if let Some(path) = &args.model_out {
        cluster::save_model(path, &model)?;
        println!("Cluster model saved to {}.", path.display());
    }
    if let Some(path) = &args.scaler_out {
        cluster::save_scaler(path, &scaler)?;
        println!("Feature scaler saved to {}.", path.display());
    }
    if let Some(path) = &args.report_out {
        let generated = Utc::now().date_naive();
        let summary = report::build_report(generated, table.len(), args.clusters, &sizes, &teams);
        std::fs::write(path, summary)?;
        println!("Summary report written to {}.", path.display());
    }

    Ok(())
}

/// Writes the roster CSV: the input columns plus the cluster label and team
/// number, rows grouped by team in formation order.
fn write_team_roster(
    table: &Table,
    labels: &[u8],
    teams: &[Team],
    out: &PathBuf,
) -> anyhow::Result<()> {
    let mut roster = Table::new(table.headers.clone());
    roster.headers.push(CLUSTER_COLUMN.to_string());
    roster.headers.push(TEAM_COLUMN.to_string());
    for team in teams {
        for &member in &team.members {
            let mut row = table.rows[member].clone();
            row.push(labels[member].to_string());
            row.push(team.number.to_string());
            roster.rows.push(row);
        }
    }
    roster.to_csv(out)
}
