use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day of the week a training session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 1,
            Day::Wednesday => 2,
            Day::Thursday => 3,
            Day::Friday => 4,
            Day::Saturday => 5,
            Day::Sunday => 6,
        }
    }

    pub fn from_index(index: usize) -> Option<Day> {
        Self::ALL.get(index).copied()
    }

    pub fn next(&self) -> Day {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Day {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Parse a day name, case-insensitive, accepting three-letter abbreviations
    pub fn parse(s: &str) -> Option<Day> {
        let lower = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|day| {
            let name = day.as_str().to_lowercase();
            name == lower || (lower.len() == 3 && name.starts_with(&lower))
        })
    }
}

/// One set of an exercise
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseSet {
    #[serde(default)]
    pub reps: u32,
    /// Load in kilograms
    #[serde(default)]
    pub weight: f64,
    /// Rest after the set, in seconds
    #[serde(default)]
    pub rest: u32,
}

impl ExerciseSet {
    pub fn new(reps: u32, weight: f64, rest: u32) -> Self {
        ExerciseSet { reps, weight, rest }
    }
}

/// An exercise within a day's session, owning its ordered sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Exercise {
            id: id.into(),
            name: name.into(),
            notes: String::new(),
            sets: Vec::new(),
        }
    }

    pub fn with_sets(mut self, sets: Vec<ExerciseSet>) -> Self {
        self.sets = sets;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// A client's weekly training plan, keyed by day
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyPlan {
    #[serde(default)]
    pub days: BTreeMap<Day, Vec<Exercise>>,
}

impl WeeklyPlan {
    pub fn new() -> Self {
        WeeklyPlan::default()
    }

    /// Exercises scheduled for a day; empty when the day has none
    pub fn exercises(&self, day: Day) -> &[Exercise] {
        self.days.get(&day).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Replace a day's exercises, leaving every other day untouched
    pub fn set_exercises(&mut self, day: Day, exercises: Vec<Exercise>) {
        self.days.insert(day, exercises);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_cycling() {
        assert_eq!(Day::Monday.next(), Day::Tuesday);
        assert_eq!(Day::Sunday.next(), Day::Monday);
        assert_eq!(Day::Monday.prev(), Day::Sunday);
        assert_eq!(Day::from_index(4), Some(Day::Friday));
        assert_eq!(Day::from_index(7), None);
    }

    #[test]
    fn test_day_parse() {
        assert_eq!(Day::parse("monday"), Some(Day::Monday));
        assert_eq!(Day::parse("  WED "), Some(Day::Wednesday));
        assert_eq!(Day::parse("Sun"), Some(Day::Sunday));
        assert_eq!(Day::parse("mo"), None);
        assert_eq!(Day::parse("someday"), None);
    }

    #[test]
    fn test_set_exercises_leaves_other_days() {
        let mut plan = WeeklyPlan::new();
        plan.set_exercises(Day::Monday, vec![Exercise::new("a", "Squat")]);
        plan.set_exercises(Day::Friday, vec![Exercise::new("b", "Row")]);
        plan.set_exercises(Day::Monday, Vec::new());

        assert!(plan.exercises(Day::Monday).is_empty());
        assert_eq!(plan.exercises(Day::Friday)[0].name, "Row");
        assert!(plan.exercises(Day::Sunday).is_empty());
    }
}
