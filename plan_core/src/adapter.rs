use crate::config::GridSettings;
use crate::grid::{set_metrics, IdAllocator, Row};
use crate::types::{Day, WeeklyPlan};

/// Flatten one day of the plan into grid rows.
///
/// Each exercise yields an exercise row followed by one row per set, in
/// plan order. The result is padded with empty rows up to
/// `settings.min_rows`; longer content is never truncated. Ids restart
/// from 1 on every call.
pub fn build_rows(plan: &WeeklyPlan, day: Day, settings: &GridSettings) -> Vec<Row> {
    let mut ids = IdAllocator::default();
    let mut rows = Vec::new();

    for exercise in plan.exercises(day) {
        rows.push(Row::item(
            &mut ids,
            exercise.id.clone(),
            exercise.name.clone(),
            exercise.sets.len(),
            exercise.notes.clone(),
        ));
        for (i, set) in exercise.sets.iter().enumerate() {
            rows.push(Row::sub_item(
                &mut ids,
                exercise.id.clone(),
                i + 1,
                set_metrics(set),
            ));
        }
    }

    while rows.len() < settings.min_rows {
        rows.push(Row::empty(&mut ids));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Column, RowKind};
    use crate::types::{Exercise, ExerciseSet};

    fn plan_with(exercises: Vec<Exercise>) -> WeeklyPlan {
        let mut plan = WeeklyPlan::new();
        plan.set_exercises(Day::Tuesday, exercises);
        plan.set_exercises(Day::Thursday, vec![Exercise::new("other", "Pull Up")]);
        plan
    }

    #[test]
    fn test_rows_follow_plan_order() {
        let plan = plan_with(vec![
            Exercise::new("a", "Squat")
                .with_notes("belt")
                .with_sets(vec![ExerciseSet::new(8, 60.0, 90), ExerciseSet::new(6, 62.5, 90)]),
            Exercise::new("b", "Plank"),
        ]);
        let rows = build_rows(&plan, Day::Tuesday, &GridSettings::default());

        let squat = &rows[0];
        assert_eq!(squat.kind, RowKind::Item { item_ref: "a".to_string() });
        assert_eq!(squat.value(Column::Exercise), "Squat");
        assert_eq!(squat.value(Column::Sets), "2");
        assert_eq!(squat.value(Column::Reps), "-");
        assert_eq!(squat.value(Column::Notes), "belt");

        let second = &rows[2];
        assert_eq!(second.kind.ordinal(), Some(2));
        assert_eq!(second.kind.item_ref(), Some("a"));
        assert_eq!(second.value(Column::Exercise), "Set 2");
        assert_eq!(second.value(Column::Sets), "");
        assert_eq!(second.value(Column::Reps), "6");
        assert_eq!(second.value(Column::Weight), "62.5");
        assert_eq!(second.value(Column::Rest), "90");

        assert_eq!(rows[3].value(Column::Exercise), "Plank");
        assert_eq!(rows[3].value(Column::Sets), "0");
        assert_eq!(rows[4].kind, RowKind::Empty);
    }

    #[test]
    fn test_padding_to_min_rows() {
        let plan = plan_with(vec![Exercise::new("a", "Squat")]);
        let rows = build_rows(&plan, Day::Tuesday, &GridSettings::default());
        assert_eq!(rows.len(), 20);
        assert!(rows[1..].iter().all(|r| r.kind == RowKind::Empty));
        assert!(rows.iter().all(|r| r.cells.len() == Column::COUNT));

        let empty_day = build_rows(&plan, Day::Sunday, &GridSettings::default());
        assert_eq!(empty_day.len(), 20);
        assert!(empty_day.iter().all(|r| r.kind == RowKind::Empty));
    }

    #[test]
    fn test_no_padding_when_content_exceeds_min() {
        let sets = vec![ExerciseSet::new(10, 20.0, 60); 24];
        let plan = plan_with(vec![Exercise::new("a", "Curl").with_sets(sets)]);
        let rows = build_rows(&plan, Day::Tuesday, &GridSettings::default());
        assert_eq!(rows.len(), 25);
        assert!(rows.iter().all(|r| r.kind != RowKind::Empty));
    }

    #[test]
    fn test_build_is_deterministic() {
        let plan = plan_with(vec![
            Exercise::new("a", "Squat").with_sets(vec![ExerciseSet::new(5, 100.0, 180)])
        ]);
        let settings = GridSettings::default();
        assert_eq!(
            build_rows(&plan, Day::Tuesday, &settings),
            build_rows(&plan, Day::Tuesday, &settings)
        );
    }

    #[test]
    fn test_ids_unique_within_build() {
        let plan = plan_with(vec![
            Exercise::new("a", "Squat").with_sets(vec![ExerciseSet::default(); 3])
        ]);
        let rows = build_rows(&plan, Day::Tuesday, &GridSettings::default());
        let mut ids: Vec<u64> = rows
            .iter()
            .flat_map(|r| std::iter::once(r.id.0).chain(r.cells.iter().map(|c| c.id.0)))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
