use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};

/// One course to search for, as supplied by the upstream course export.
/// The JSON key names are the upstream producer's contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseQuery {
    #[serde(rename = "Insegnamento - codice")]
    pub code: String,
    #[serde(rename = "Insegnamento - descrizione")]
    pub description: String,
}

pub fn load_courses(path: &Path) -> anyhow::Result<Vec<CourseQuery>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read course list {}", path.display()))?;
    let courses: Vec<CourseQuery> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse course list {}", path.display()))?;
    Ok(courses)
}

/// Loads the optional filter file: one term per line, case-insensitive.
/// A missing or empty file yields an empty set, meaning "process all".
pub fn load_filter_terms(path: &Path) -> anyhow::Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read filter file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect())
}

pub fn apply_filter(courses: Vec<CourseQuery>, terms: &HashSet<String>) -> Vec<CourseQuery> {
    if terms.is_empty() {
        info!("filter file is empty or missing, no filtering applied");
        return courses;
    }
    let total = courses.len();
    let kept: Vec<CourseQuery> = courses
        .into_iter()
        .filter(|course| terms.contains(&course.description.to_lowercase()))
        .collect();
    info!("Filtered courses: {} of {}", kept.len(), total);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, description: &str) -> CourseQuery {
        CourseQuery {
            code: code.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn parses_upstream_key_names() {
        let json = r#"[
            {"Insegnamento - codice": "145101", "Insegnamento - descrizione": "ALGORITHMS", "Facoltà": "DISI"}
        ]"#;
        let courses: Vec<CourseQuery> = serde_json::from_str(json).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].code, "145101");
        assert_eq!(courses[0].description, "ALGORITHMS");
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let courses = vec![course("1", "X"), course("2", "Y")];
        let kept = apply_filter(courses, &HashSet::new());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let courses = vec![course("1", "X"), course("2", "Y")];
        let terms: HashSet<String> = ["y".to_string()].into_iter().collect();
        let kept = apply_filter(courses, &terms);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].description, "Y");
    }

    #[test]
    fn filter_terms_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specific.txt");
        fs::write(&path, "Machine Learning\n\n  \nALGORITHMS\n").unwrap();
        let terms = load_filter_terms(&path).unwrap();
        assert_eq!(terms.len(), 2);
        assert!(terms.contains("machine learning"));
        assert!(terms.contains("algorithms"));
    }

    #[test]
    fn missing_filter_file_means_no_filter() {
        let dir = tempfile::tempdir().unwrap();
        let terms = load_filter_terms(&dir.path().join("nope.txt")).unwrap();
        assert!(terms.is_empty());
    }
}
