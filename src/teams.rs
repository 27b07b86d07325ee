use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// One formed team: a chunk of a single cluster's members, numbered
/// strictly increasingly across the whole run.
#[derive(Debug, Clone)]
pub struct Team {
    pub number: usize,
    pub cluster: u8,
    /// Row indices into the source table, in post-shuffle order.
    pub members: Vec<usize>,
}

/// Partitions a cluster-labeled population into teams. Clusters are visited
/// in order of first appearance; each cluster's members are shuffled with a
/// fresh seeded generator and sliced into consecutive chunks of `team_size`.
/// The final chunk of a cluster may hold fewer members but is never dropped.
/// An empty population yields an empty result, not an error.
pub fn form_teams(labels: &[u8], team_size: usize, seed: u64) -> Vec<Team> {
    assert!(team_size > 0, "team size must be positive");

    let mut order: Vec<u8> = Vec::new();
    let mut groups: HashMap<u8, Vec<usize>> = HashMap::new();
    for (index, &label) in labels.iter().enumerate() {
        if !groups.contains_key(&label) {
            order.push(label);
        }
        groups.entry(label).or_default().push(index);
    }

    let mut teams = Vec::new();
    for label in order {
        let mut members = groups.remove(&label).unwrap_or_default();
        let mut rng = StdRng::seed_from_u64(seed);
        members.shuffle(&mut rng);
        for chunk in members.chunks(team_size) {
            teams.push(Team {
                number: teams.len() + 1,
                cluster: label,
                members: chunk.to_vec(),
            });
        }
    }
    teams
}

/// The member attributes the justification generator looks at. Missing
/// courses default to "Unknown"; missing or non-numeric totals are excluded
/// from the spread entirely.
#[derive(Debug, Clone)]
pub struct MemberProfile {
    pub course: String,
    pub total: Option<f64>,
}

/// Fills the four-sentence team justification template: cluster basis,
/// course diversity, performance spread, and a fixed closing line.
pub fn justification(members: &[MemberProfile], cluster: u8) -> String {
    let mut parts = Vec::with_capacity(4);
    parts.push(format!(
        "Students grouped in Cluster {} based on similar academic performance and skill profiles.",
        cluster as usize + 1
    ));

    let mut courses: Vec<&str> = Vec::new();
    for member in members {
        if !courses.contains(&member.course.as_str()) {
            courses.push(&member.course);
        }
    }
    if courses.len() > 1 {
        parts.push(format!(
            "Team includes students from {} different courses ({}) for interdisciplinary collaboration.",
            courses.len(),
            courses.join(", ")
        ));
    } else {
        parts.push(format!(
            "Team consists of students from the same course ({}) for focused specialization.",
            courses.first().copied().unwrap_or("Unknown")
        ));
    }

    let totals: Vec<f64> = members.iter().filter_map(|m| m.total).collect();
    let spread = match (
        totals.iter().cloned().reduce(f64::max),
        totals.iter().cloned().reduce(f64::min),
    ) {
        (Some(max), Some(min)) => max - min,
        _ => 0.0,
    };
    if spread < 20.0 {
        parts.push(
            "Students have similar academic performance levels, ensuring balanced contribution."
                .to_string(),
        );
    } else if spread < 40.0 {
        parts.push(
            "Team includes students with complementary performance levels for peer learning."
                .to_string(),
        );
    } else {
        parts.push(
            "Team combines high and moderate performers to create learning opportunities."
                .to_string(),
        );
    }

    parts.push(
        "Members selected to complement each other's strengths and support areas for improvement."
            .to_string(),
    );
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(course: &str, total: Option<f64>) -> MemberProfile {
        MemberProfile {
            course: course.to_string(),
            total,
        }
    }

    fn sizes(teams: &[Team]) -> Vec<usize> {
        teams.iter().map(|t| t.members.len()).collect()
    }

    #[test]
    fn partitions_every_member_exactly_once() {
        let labels = vec![0, 1, 0, 1, 1, 0, 1, 1, 0, 2];
        let teams = form_teams(&labels, 3, 42);

        let mut seen: Vec<usize> = teams.iter().flat_map(|t| t.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..labels.len()).collect::<Vec<_>>());
        for team in &teams {
            assert!(team.members.len() >= 1 && team.members.len() <= 3);
        }
    }

    #[test]
    fn team_count_per_cluster_is_ceiling_of_size_over_team_size() {
        // cluster 0 has two members, cluster 1 has six
        let labels = vec![0, 0, 1, 1, 1, 1, 1, 1];
        let teams = form_teams(&labels, 4, 42);

        let cluster0: Vec<&Team> = teams.iter().filter(|t| t.cluster == 0).collect();
        let cluster1: Vec<&Team> = teams.iter().filter(|t| t.cluster == 1).collect();
        assert_eq!(cluster0.len(), 1);
        assert_eq!(cluster0[0].members.len(), 2);
        assert_eq!(cluster1.len(), 2);
        let mut cluster1_sizes: Vec<usize> =
            cluster1.iter().map(|t| t.members.len()).collect();
        cluster1_sizes.sort_unstable();
        assert_eq!(cluster1_sizes, vec![2, 4]);
    }

    #[test]
    fn team_numbers_increase_across_clusters() {
        let labels = vec![0, 0, 0, 1, 1, 1];
        let teams = form_teams(&labels, 2, 42);
        let numbers: Vec<usize> = teams.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn remainder_teams_are_kept_even_at_size_one() {
        let labels = vec![0, 0, 0, 0, 0];
        let teams = form_teams(&labels, 2, 42);
        assert_eq!(sizes(&teams), vec![2, 2, 1]);
    }

    #[test]
    fn empty_population_yields_no_teams() {
        let teams = form_teams(&[], 4, 42);
        assert!(teams.is_empty());
    }

    #[test]
    fn population_smaller_than_team_size_yields_one_team() {
        let labels = vec![0, 0];
        let teams = form_teams(&labels, 5, 42);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].members.len(), 2);
    }

    #[test]
    fn formation_is_deterministic_for_a_fixed_seed() {
        let labels = vec![0, 1, 2, 0, 1, 2, 0, 1, 2, 0];
        let first = form_teams(&labels, 3, 7);
        let second = form_teams(&labels, 3, 7);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.number, b.number);
            assert_eq!(a.cluster, b.cluster);
            assert_eq!(a.members, b.members);
        }
    }

    #[test]
    fn justification_notes_specialization_for_a_single_course() {
        let text = justification(
            &[member("Physics", Some(70.0)), member("Physics", Some(75.0))],
            0,
        );
        assert!(text.contains("Cluster 1"));
        assert!(text.contains("same course (Physics)"));
        assert!(text.contains("similar academic performance"));
    }

    #[test]
    fn justification_lists_distinct_courses_in_first_seen_order() {
        let text = justification(
            &[
                member("Math", Some(50.0)),
                member("Physics", Some(80.0)),
                member("Math", Some(60.0)),
            ],
            2,
        );
        assert!(text.contains("Cluster 3"));
        assert!(text.contains("2 different courses (Math, Physics)"));
        assert!(text.contains("complementary performance levels"));
    }

    #[test]
    fn wide_spreads_combine_high_and_moderate_performers() {
        let text = justification(
            &[member("Math", Some(30.0)), member("Math", Some(95.0))],
            0,
        );
        assert!(text.contains("combines high and moderate performers"));
    }

    #[test]
    fn missing_totals_are_excluded_from_the_spread() {
        let text = justification(
            &[
                member("Math", None),
                member("Math", Some(90.0)),
                member("Math", None),
            ],
            0,
        );
        // only one numeric total, so the spread is zero
        assert!(text.contains("similar academic performance"));
    }

    #[test]
    fn empty_team_still_produces_a_justification() {
        let text = justification(&[], 1);
        assert!(text.contains("Cluster 2"));
        assert!(text.contains("same course (Unknown)"));
    }
}
