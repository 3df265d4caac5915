use crate::grid::{Column, Row, RowKind};
use crate::types::{Day, Exercise, ExerciseSet, WeeklyPlan};

/// Rebuild the plan from the grid rows of `day`.
///
/// Each exercise row plus the set rows that follow it becomes one
/// exercise; empty rows are skipped. Exercises that came from `original`
/// keep their id. Metric cells that do not parse fall back to zero, so any
/// row state the editor can produce flushes. Other days are copied
/// unchanged.
pub fn flush(rows: &[Row], original: &WeeklyPlan, day: Day) -> WeeklyPlan {
    let mut exercises: Vec<Exercise> = Vec::new();

    for row in rows {
        match &row.kind {
            RowKind::Item { item_ref } => {
                exercises.push(Exercise {
                    id: item_ref.clone(),
                    name: row.value(Column::Exercise).to_string(),
                    notes: row.value(Column::Notes).to_string(),
                    sets: Vec::new(),
                });
            }
            RowKind::SubItem { item_ref, ordinal } => match exercises.last_mut() {
                Some(current) if current.id == *item_ref => current.sets.push(parse_set(row)),
                _ => log::warn!("dropping orphaned set {ordinal} of exercise {item_ref}"),
            },
            RowKind::Empty => {}
        }
    }

    let mut updated = original.clone();
    if !exercises.is_empty() || updated.days.contains_key(&day) {
        updated.set_exercises(day, exercises);
    }
    updated
}

fn parse_set(row: &Row) -> ExerciseSet {
    ExerciseSet {
        reps: parse_count(row.value(Column::Reps)),
        weight: parse_weight(row.value(Column::Weight)),
        rest: parse_count(row.value(Column::Rest)),
    }
}

/// Whole, non-negative number; decimals round, anything else is 0
pub fn parse_count(text: &str) -> u32 {
    let text = text.trim();
    if let Ok(n) = text.parse::<u32>() {
        return n;
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Finite decimal; anything else is 0.0
pub fn parse_weight(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::build_rows;
    use crate::config::GridSettings;
    use crate::grid::{CellPos, GridModel, IdAllocator};

    fn sample_plan() -> WeeklyPlan {
        let mut plan = WeeklyPlan::new();
        plan.set_exercises(
            Day::Monday,
            vec![
                Exercise::new("squat", "Squat")
                    .with_notes("low bar")
                    .with_sets(vec![
                        ExerciseSet::new(8, 60.0, 90),
                        ExerciseSet::new(8, 65.0, 90),
                        ExerciseSet::new(8, 70.0, 120),
                    ]),
                Exercise::new("plank", "Plank"),
                Exercise::new("curl", "Curl").with_sets(vec![ExerciseSet::new(12, 12.5, 45)]),
            ],
        );
        plan.set_exercises(
            Day::Friday,
            vec![Exercise::new("dl", "Deadlift").with_sets(vec![ExerciseSet::new(3, 140.0, 240)])],
        );
        plan
    }

    #[test]
    fn test_round_trip_without_edits() {
        let plan = sample_plan();
        for day in [Day::Monday, Day::Friday, Day::Sunday] {
            let rows = build_rows(&plan, day, &GridSettings::default());
            let flushed = flush(&rows, &plan, day);
            assert_eq!(flushed.exercises(day), plan.exercises(day));
        }

        let rows = build_rows(&plan, Day::Sunday, &GridSettings::default());
        assert_eq!(flush(&rows, &plan, Day::Sunday), plan);
    }

    #[test]
    fn test_other_days_untouched() {
        let plan = sample_plan();
        let rows = build_rows(&plan, Day::Monday, &GridSettings::default());
        let flushed = flush(&rows[..1], &plan, Day::Monday);
        assert_eq!(flushed.exercises(Day::Friday), plan.exercises(Day::Friday));
        assert_eq!(flushed.exercises(Day::Monday).len(), 1);
        assert!(flushed.exercises(Day::Monday)[0].sets.is_empty());
    }

    #[test]
    fn test_empty_rows_never_produce_exercises() {
        let plan = sample_plan();
        let settings = GridSettings::default();
        let mut grid = GridModel::new(build_rows(&plan, Day::Friday, &settings), settings);
        grid.write_cell(CellPos::new(5, Column::Exercise.index()), "Lunge");
        grid.write_cell(CellPos::new(5, Column::Reps.index()), "10");

        let flushed = flush(grid.rows(), &plan, Day::Friday);
        assert_eq!(flushed.exercises(Day::Friday), plan.exercises(Day::Friday));
    }

    #[test]
    fn test_malformed_metrics_fall_back_to_zero() {
        let plan = sample_plan();
        let settings = GridSettings::default();
        let mut grid = GridModel::new(build_rows(&plan, Day::Monday, &settings), settings);
        grid.write_cell(CellPos::new(1, Column::Reps.index()), "lots");
        grid.write_cell(CellPos::new(1, Column::Weight.index()), "");
        grid.write_cell(CellPos::new(1, Column::Rest.index()), "-30");
        grid.write_cell(CellPos::new(2, Column::Weight.index()), "NaN");
        grid.write_cell(CellPos::new(2, Column::Reps.index()), " 7.6 ");

        let flushed = flush(grid.rows(), &plan, Day::Monday);
        let sets = &flushed.exercises(Day::Monday)[0].sets;
        assert_eq!(sets[0], ExerciseSet::new(0, 0.0, 0));
        assert_eq!(sets[1], ExerciseSet::new(8, 0.0, 90));
        assert_eq!(sets[2], ExerciseSet::new(8, 70.0, 120));
    }

    #[test]
    fn test_item_row_placeholders_ignored() {
        let plan = sample_plan();
        let settings = GridSettings::default();
        let mut grid = GridModel::new(build_rows(&plan, Day::Monday, &settings), settings);
        grid.write_cell(CellPos::new(0, Column::Reps.index()), "99");
        grid.write_cell(CellPos::new(0, Column::Exercise.index()), "Front Squat");

        let flushed = flush(grid.rows(), &plan, Day::Monday);
        let squat = &flushed.exercises(Day::Monday)[0];
        assert_eq!(squat.id, "squat");
        assert_eq!(squat.name, "Front Squat");
        assert_eq!(squat.sets.len(), 3);
    }

    #[test]
    fn test_orphaned_set_rows_dropped() {
        let mut ids = IdAllocator::default();
        let rows = vec![
            Row::sub_item(&mut ids, "ghost", 1, ["5".into(), "5".into(), "5".into()]),
            Row::item(&mut ids, "a", "Row", 1, ""),
            Row::sub_item(&mut ids, "a", 1, ["10".into(), "40".into(), "60".into()]),
        ];
        let flushed = flush(&rows, &WeeklyPlan::new(), Day::Monday);
        let exercises = flushed.exercises(Day::Monday);
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].sets, vec![ExerciseSet::new(10, 40.0, 60)]);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count("2.5"), 3);
        assert_eq!(parse_count("-4"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_weight("62.5"), 62.5);
        assert_eq!(parse_weight("inf"), 0.0);
        assert_eq!(parse_weight("-5"), -5.0);
    }
}
