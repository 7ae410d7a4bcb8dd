use catalog_pages::*;

fn entry(identifier: &str, status: EntryStatus) -> ReportEntry {
    ReportEntry {
        identifier: identifier.to_string(),
        action: PageAction::Create,
        status,
        placeholder: Some("B3".to_string()),
        image: None,
        image_fallback: false,
        message: "ok".to_string(),
    }
}

#[test]
fn test_count_by_status() {
    let report = RunReport {
        entries: vec![
            entry("LC-01", EntryStatus::Generated),
            entry("LW-02", EntryStatus::Failed),
            entry("LT-09", EntryStatus::Generated),
        ],
        ..RunReport::default()
    };

    assert_eq!(report.count(EntryStatus::Generated), 2);
    assert_eq!(report.count(EntryStatus::Failed), 1);
    assert_eq!(report.count(EntryStatus::Kept), 0);
}

#[test]
fn test_write_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");

    let mut kept = entry("LW-02", EntryStatus::Kept);
    kept.action = PageAction::Skip;
    kept.placeholder = None;
    kept.message = "existing page kept".to_string();

    let mut generated = entry("LC-01", EntryStatus::Generated);
    generated.image = Some("images/_blank.jpg".to_string());
    generated.image_fallback = true;

    let report = RunReport {
        entries: vec![generated, kept],
        ..RunReport::default()
    };
    report.write_csv(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "identifier,action,status,placeholder,image,image_fallback,message",
            "LC-01,create,generated,B3,images/_blank.jpg,true,ok",
            "LW-02,skip,kept,,,false,existing page kept",
        ]
    );
}
