use crate::types::WeeklyPlan;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid plan JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl WeeklyPlan {
    /// Export to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a plan; a missing file is a new, empty plan
    pub fn load_from_file(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Ok(WeeklyPlan::default());
        }
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Day, Exercise, ExerciseSet};

    fn sample_plan() -> WeeklyPlan {
        let mut plan = WeeklyPlan::new();
        plan.set_exercises(
            Day::Wednesday,
            vec![Exercise::new("ex-1", "Deadlift")
                .with_notes("hook grip")
                .with_sets(vec![ExerciseSet::new(3, 140.0, 240)])],
        );
        plan
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let plan = sample_plan();

        plan.save_to_file(&path).unwrap();
        let loaded = WeeklyPlan::load_from_file(&path).unwrap();
        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_json_uses_day_names_as_keys() {
        let json = sample_plan().to_json().unwrap();
        assert!(json.contains("\"wednesday\""));
    }

    #[test]
    fn test_missing_file_is_empty_plan() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = WeeklyPlan::load_from_file(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.days.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            WeeklyPlan::load_from_file(&path),
            Err(StorageError::Json(_))
        ));
    }
}
