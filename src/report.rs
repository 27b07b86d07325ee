use std::fmt::Write;

use chrono::NaiveDate;

use crate::teams::Team;

/// Cluster sizes in label order, computed from the final assignment.
pub fn cluster_sizes(labels: &[u8], clusters: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; clusters];
    for &label in labels {
        if (label as usize) < clusters {
            sizes[label as usize] += 1;
        }
    }
    sizes
}

pub fn build_report(
    generated: NaiveDate,
    total_students: usize,
    clusters: usize,
    sizes: &[usize],
    teams: &[Team],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Team Formation Summary");
    let _ = writeln!(output, "Generated on {generated}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Totals");
    let _ = writeln!(output, "- Total students: {total_students}");
    let _ = writeln!(output, "- Number of clusters: {clusters}");
    let _ = writeln!(output, "- Teams formed: {}", teams.len());
    let average = if teams.is_empty() {
        0.0
    } else {
        total_students as f64 / teams.len() as f64
    };
    let _ = writeln!(output, "- Average team size: {average:.1}");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cluster Characteristics");
    if sizes.is_empty() {
        let _ = writeln!(output, "No clusters were formed.");
    } else {
        for (cluster, size) in sizes.iter().enumerate() {
            let _ = writeln!(output, "- Cluster {}: {} students", cluster + 1, size);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Teams");
    if teams.is_empty() {
        let _ = writeln!(output, "No teams could be formed.");
    } else {
        for team in teams {
            let _ = writeln!(
                output,
                "- Team {}: {} members from cluster {}",
                team.number,
                team.members.len(),
                team.cluster as usize + 1
            );
        }
    }

    output
}
