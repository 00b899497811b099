// End-to-end behavior of the availability engine and toggle rules over the
// built-in catalog.

use correlatives::{
    available_ids, builtin_catalog, summarize, Catalog, CourseRecord, CourseStatus, Selection,
    ToggleOutcome,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn completed(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn all_ids() -> Vec<String> {
    builtin_catalog().iter().map(|c| c.id.clone()).collect()
}

#[test]
fn test_scenario_nothing_completed() {
    let available = available_ids(&completed(&[]), builtin_catalog());

    assert_eq!(available, vec!["INGM101", "INGM105", "ING6102", "ING6301"]);
}

#[test]
fn test_scenario_first_three_roots_completed() {
    let available = available_ids(
        &completed(&["INGM101", "INGM105", "ING6102"]),
        builtin_catalog(),
    );

    assert!(available.contains(&"ING6201".to_string()));
    assert!(available.contains(&"INGM107".to_string()));
    // Second-year courses still wait on first-year ones
    assert!(!available.contains(&"ING6202".to_string()));
    assert!(!available.contains(&"INGM108".to_string()));
}

#[test]
fn test_scenario_programacion_a_locked_without_informatica() {
    let catalog = builtin_catalog();
    let mut selection = Selection::with_completed(["INGM101", "INGM105"]);

    let available = available_ids(selection.completed(), catalog);
    assert!(!available.contains(&"ING6201".to_string()));

    let before = selection.completed().clone();
    let outcome = selection.toggle("ING6201", catalog);

    assert!(matches!(outcome, ToggleOutcome::Ignored { .. }));
    assert_eq!(selection.completed(), &before);
}

#[test]
fn test_scenario_teorias_needs_estadistica_and_programacion_b() {
    let catalog = builtin_catalog();
    let teorias = catalog.get("ING6203").unwrap();

    let mut selection = Selection::new();
    let report = selection.seed(
        ["INGM101", "INGM105", "ING6102", "INGM102", "INGM108"],
        catalog,
    );
    assert!(report.is_clean());
    assert_eq!(selection.status(teorias), CourseStatus::Locked);

    // Only Programación B
    let mut only_b = Selection::new();
    only_b.seed(
        ["INGM101", "INGM105", "ING6102", "ING6201", "INGM107", "ING6202"],
        catalog,
    );
    assert_eq!(only_b.status(teorias), CourseStatus::Locked);
    assert!(matches!(
        only_b.toggle("ING6203", catalog),
        ToggleOutcome::Ignored { ref missing } if missing == &vec!["INGM108".to_string()]
    ));

    // Both
    selection.seed(["ING6201", "INGM107", "ING6202"], catalog);
    assert_eq!(selection.status(teorias), CourseStatus::Available);
    assert_eq!(selection.toggle("ING6203", catalog), ToggleOutcome::Completed);
}

#[test]
fn test_whole_plan_can_be_completed() {
    let catalog = builtin_catalog();
    let mut selection = Selection::new();

    // Reverse catalog order forces several seeding passes
    let mut ids = all_ids();
    ids.reverse();
    let report = selection.seed(&ids, catalog);

    assert!(report.is_clean());
    let summary = summarize(selection.completed(), catalog);
    assert_eq!(summary.completed, 16);
    assert!(available_ids(selection.completed(), catalog).is_empty());
}

#[test]
fn test_file_catalog_with_dangling_prerequisite() {
    let catalog = Catalog::from_records(vec![
        CourseRecord {
            id: "A".to_string(),
            name: "Alpha".to_string(),
            prerequisites: None,
        },
        CourseRecord {
            id: "B".to_string(),
            name: "Beta".to_string(),
            prerequisites: Some(vec!["MISSING".to_string()]),
        },
    ]);
    let mut selection = Selection::new();

    selection.toggle("A", &catalog);
    let outcome = selection.toggle("B", &catalog);

    assert_eq!(
        outcome,
        ToggleOutcome::Ignored {
            missing: vec!["MISSING".to_string()]
        }
    );
    assert_eq!(selection.toggle("MISSING", &catalog), ToggleOutcome::Unknown);
}

fn completed_sets() -> impl Strategy<Value = BTreeSet<String>> {
    prop::sample::subsequence(all_ids(), 0..=16).prop_map(|ids| ids.into_iter().collect())
}

proptest! {
    #[test]
    fn available_and_completed_are_disjoint(done in completed_sets()) {
        for id in available_ids(&done, builtin_catalog()) {
            prop_assert!(!done.contains(&id));
        }
    }

    #[test]
    fn courses_without_prerequisites_available_unless_completed(done in completed_sets()) {
        let available = available_ids(&done, builtin_catalog());
        for course in builtin_catalog().iter().filter(|c| !c.has_prerequisites()) {
            prop_assert_eq!(available.contains(&course.id), !done.contains(&course.id));
        }
    }

    #[test]
    fn availability_is_idempotent(done in completed_sets()) {
        let catalog = builtin_catalog();
        prop_assert_eq!(available_ids(&done, catalog), available_ids(&done, catalog));
    }

    #[test]
    fn completing_a_course_never_locks_another(done in completed_sets(), extra in 0usize..16) {
        let catalog = builtin_catalog();
        let extra_id = catalog.courses()[extra].id.clone();

        let before = available_ids(&done, catalog);
        let mut more = done.clone();
        more.insert(extra_id.clone());
        let after = available_ids(&more, catalog);

        for id in before.iter().filter(|id| **id != extra_id) {
            prop_assert!(after.contains(id), "{} lost availability after completing {}", id, extra_id);
        }
    }

    #[test]
    fn toggle_on_locked_never_changes_selection(done in completed_sets(), pick in 0usize..16) {
        let catalog = builtin_catalog();
        let course = &catalog.courses()[pick];
        let mut selection = Selection::with_completed(done.iter().cloned());

        if selection.status(course) == CourseStatus::Locked {
            let before = selection.completed().clone();
            let outcome = selection.toggle(&course.id, catalog);
            prop_assert!(!outcome.changed());
            prop_assert_eq!(selection.completed(), &before);
        }
    }
}
