use std::fmt;

/// Numeric assessment columns, matched by exact name when present.
pub const SCORE_COLUMNS: &[&str] = &[
    "Quiz",
    "Midterm",
    "Assignment_1",
    "Assignment_2",
    "Assignment_3",
    "Project",
    "Presentation",
    "Final_Exam",
    "Total",
];

/// Free-text categorical columns filled with "Unknown" when missing.
pub const CATEGORICAL_COLUMNS: &[&str] = &[
    "technical_skills",
    "programming_languages",
    "soft_skills",
    "Grade",
    "Categories",
];

/// Comma-separated skill list columns pooled into one vocabulary per student.
pub const SKILL_SOURCE_COLUMNS: &[&str] =
    &["technical_skills", "programming_languages", "soft_skills"];

/// Skill columns used as clustering features once converted to levels.
pub const SKILL_COLUMNS: &[&str] = &[
    "Adaptability",
    "Blockchain",
    "C#",
    "C++",
    "Cloud Computing",
    "Communication",
    "Cybersecurity",
    "Data Analysis",
    "Go",
    "Java",
    "JavaScript",
    "Leadership",
    "Machine Learning",
    "Problem-Solving",
    "Python",
    "R",
    "SQL",
    "Teamwork",
    "Time Management",
];

/// Columns eligible for High/Medium/Low conversion: the clustering skills
/// plus the standalone "projects" indicator.
pub const LEVEL_COLUMNS: &[&str] = &[
    "projects",
    "Adaptability",
    "Blockchain",
    "C#",
    "C++",
    "Cloud Computing",
    "Communication",
    "Cybersecurity",
    "Data Analysis",
    "Go",
    "Java",
    "JavaScript",
    "Leadership",
    "Machine Learning",
    "Problem-Solving",
    "Python",
    "R",
    "SQL",
    "Teamwork",
    "Time Management",
];

pub const ID_COLUMN: &str = "Student Id";
pub const QUIZ_COLUMN: &str = "Quiz";
pub const COURSE_COLUMN: &str = "current_course";
pub const TOTAL_COLUMN: &str = "Total";
pub const CLUSTER_COLUMN: &str = "Cluster";
pub const TEAM_COLUMN: &str = "Team_Number";

/// Coarse ordinal encoding of a skill or binary attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Converts a raw cell to a level. Total: every input maps to exactly one
    /// of the three variants, with Medium covering both missing and
    /// unrecognized values. Existing level strings map to themselves so the
    /// conversion is idempotent.
    pub fn from_raw(value: &str) -> Level {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Level::Medium;
        }
        match trimmed {
            "High" => return Level::High,
            "Medium" => return Level::Medium,
            "Low" => return Level::Low,
            "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" => return Level::High,
            "no" | "No" | "NO" | "false" | "False" | "FALSE" => return Level::Low,
            _ => {}
        }
        if let Ok(number) = trimmed.parse::<f64>() {
            if number == 1.0 {
                return Level::High;
            }
            if number == 0.0 {
                return Level::Low;
            }
        }
        Level::Medium
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
        }
    }

    /// Feature encoding used by the clustering engine.
    pub fn ordinal(&self) -> u8 {
        match self {
            Level::Low => 0,
            Level::Medium => 1,
            Level::High => 2,
        }
    }

    /// Weight used for the per-cluster skill averages (Low 1, Medium 2, High 3).
    pub fn weight(&self) -> f64 {
        match self {
            Level::Low => 1.0,
            Level::Medium => 2.0,
            Level::High => 3.0,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_unrecognized_default_to_medium() {
        assert_eq!(Level::from_raw(""), Level::Medium);
        assert_eq!(Level::from_raw("   "), Level::Medium);
        assert_eq!(Level::from_raw("maybe"), Level::Medium);
        assert_eq!(Level::from_raw("2"), Level::Medium);
        assert_eq!(Level::from_raw("0.5"), Level::Medium);
    }

    #[test]
    fn truthy_values_map_to_high() {
        for value in ["1", "1.0", "yes", "Yes", "YES", "true", "True", "TRUE"] {
            assert_eq!(Level::from_raw(value), Level::High, "value {value:?}");
        }
    }

    #[test]
    fn falsy_values_map_to_low() {
        for value in ["0", "0.0", "no", "No", "NO", "false", "False", "FALSE"] {
            assert_eq!(Level::from_raw(value), Level::Low, "value {value:?}");
        }
    }

    #[test]
    fn conversion_is_idempotent_on_levels() {
        for level in ["High", "Medium", "Low"] {
            assert_eq!(Level::from_raw(level).as_str(), level);
        }
    }

    #[test]
    fn every_input_yields_a_level() {
        for value in ["", "High", "no", "3.14", "C++", "YES", "null"] {
            let level = Level::from_raw(value);
            assert!(matches!(level, Level::Low | Level::Medium | Level::High));
        }
    }

    #[test]
    fn ordinal_and_weight_are_ordered() {
        assert!(Level::Low.ordinal() < Level::Medium.ordinal());
        assert!(Level::Medium.ordinal() < Level::High.ordinal());
        assert!(Level::Low.weight() < Level::High.weight());
    }
}
