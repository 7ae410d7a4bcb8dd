mod common;

use catalog_pages::resolve::{PlannedPage, apply_action};
use catalog_pages::*;
use common::{catalog_book, ids};

fn titles(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_plan_dedups_in_first_seen_order() {
    let plan = plan_pages(
        &ids(&["LW-02", "LC-01", "LW-02", "LT-09", "LC-01"]),
        &[],
        &[],
        ConflictPolicy::Recreate,
    );
    assert_eq!(plan.canonical(), vec!["LW-02", "LC-01", "LT-09"]);
    assert!(plan.pages.iter().all(|p| p.action == PageAction::Create));
    assert!(plan.diagnostics.is_empty());
}

#[test]
fn test_plan_actions_follow_policy() {
    let identifiers = ids(&["LC-01", "LW-02"]);
    let existing = titles(&["Cover", "LC-01"]);

    let recreate = plan_pages(&identifiers, &existing, &[], ConflictPolicy::Recreate);
    assert_eq!(recreate.pages[0].action, PageAction::Recreate);
    assert_eq!(recreate.pages[1].action, PageAction::Create);

    let skip = plan_pages(&identifiers, &existing, &[], ConflictPolicy::Skip);
    assert_eq!(skip.pages[0].action, PageAction::Skip);
    assert_eq!(skip.pages[1].action, PageAction::Create);
    assert_eq!(skip.policy, ConflictPolicy::Skip);
}

#[test]
fn test_plan_rejects_protected_titles() {
    let options = CatalogOptions::default();
    let plan = plan_pages(
        &ids(&["Cover", "LC-01", "Template_EN"]),
        &titles(&["Cover", "Template_EN"]),
        &options.protected_titles("EN"),
        ConflictPolicy::Recreate,
    );

    assert_eq!(plan.canonical(), vec!["LC-01"]);
    assert_eq!(plan.diagnostics.len(), 2);
    assert!(plan.diagnostics.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn test_recreate_replaces_stale_page() {
    let assets = tempfile::tempdir().unwrap();
    let options = CatalogOptions::default();
    let mut book = catalog_book(&["LC-01"]);
    let id = Identifier::clean("LC-01").unwrap();

    clone_template(&mut book, "Template_EN", &id, assets.path(), &options).unwrap();
    book.sheet_mut("LC-01").unwrap().set("B3", "edited by hand").unwrap();

    let page = PlannedPage {
        identifier: id.clone(),
        action: PageAction::Recreate,
    };
    let cloned = apply_action(&mut book, &page, "Template_EN", assets.path(), &options)
        .unwrap()
        .unwrap();

    assert_eq!(cloned.identifier, id);
    assert_eq!(book.sheet("LC-01").unwrap().get("B3"), Some("LC-01"));
    assert_eq!(
        book.sheet_names().iter().filter(|n| *n == "LC-01").count(),
        1
    );
}

#[test]
fn test_skip_keeps_existing_page() {
    let assets = tempfile::tempdir().unwrap();
    let options = CatalogOptions::default();
    let mut book = catalog_book(&["LC-01"]);
    book.add_sheet("LC-01").set("A1", "hand made").unwrap();

    let page = PlannedPage {
        identifier: Identifier::clean("LC-01").unwrap(),
        action: PageAction::Skip,
    };
    let result = apply_action(&mut book, &page, "Template_EN", assets.path(), &options).unwrap();

    assert!(result.is_none());
    assert_eq!(book.sheet("LC-01").unwrap().get("A1"), Some("hand made"));
}

#[test]
fn test_failed_clone_leaves_no_page() {
    let assets = tempfile::tempdir().unwrap();
    let options = CatalogOptions::default();
    let mut book = catalog_book(&["LC-01"]);

    let page = PlannedPage {
        identifier: Identifier::clean("LC-01").unwrap(),
        action: PageAction::Create,
    };
    let result = apply_action(&mut book, &page, "Template_FR", assets.path(), &options);

    assert!(matches!(result, Err(CatalogError::MissingSheet(_))));
    assert!(!book.has_sheet("LC-01"));
}

#[test]
fn test_remove_generated_pages() {
    let assets = tempfile::tempdir().unwrap();
    let options = CatalogOptions::default();
    let mut book = catalog_book(&[]);
    for value in ["LC-01", "LW-02"] {
        let id = Identifier::clean(value).unwrap();
        clone_template(&mut book, "Template_EN", &id, assets.path(), &options).unwrap();
    }

    let removed = remove_generated_pages(
        &mut book,
        &ids(&["LC-01", "LC-01", "LT-09", "Cover", "LW-02"]),
        &options.protected_titles("EN"),
    )
    .unwrap();

    assert_eq!(removed, vec!["LC-01", "LW-02"]);
    assert_eq!(
        book.sheet_names(),
        vec!["Cover", "GenInfo+Contacts", "Schedule", "Template_EN", "Notes"]
    );
}
