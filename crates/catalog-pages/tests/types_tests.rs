use catalog_pages::*;

#[test]
fn test_clean_strips_reserved_characters() {
    let id = Identifier::clean("LC:07*").unwrap();
    assert_eq!(id, "LC07");

    let id = Identifier::clean("  [LW-02]  ").unwrap();
    assert_eq!(id.as_str(), "LW-02");

    let id = Identifier::clean("a/b\\c?d;e").unwrap();
    assert_eq!(id, "abcde");
}

#[test]
fn test_clean_rejects_empty() {
    assert!(matches!(
        Identifier::clean("   "),
        Err(InvalidIdentifier::Empty { .. })
    ));
    assert!(matches!(
        Identifier::clean("[*]"),
        Err(InvalidIdentifier::Empty { .. })
    ));
}

#[test]
fn test_clean_trims_after_stripping() {
    // Stripping can expose inner whitespace at the edges
    let id = Identifier::clean("* LT-09 *").unwrap();
    assert_eq!(id, "LT-09");
}

#[test]
fn test_clean_length_limit() {
    let exact = "A".repeat(MAX_TITLE_LEN);
    assert_eq!(Identifier::clean(&exact).unwrap().as_str().len(), 31);

    let long = "A".repeat(MAX_TITLE_LEN + 1);
    match Identifier::clean(&long) {
        Err(InvalidIdentifier::TooLong { len, .. }) => assert_eq!(len, 32),
        other => panic!("Expected TooLong, got {:?}", other),
    }

    // Reserved characters do not count toward the limit
    let padded = format!("{}::", "B".repeat(31));
    assert!(Identifier::clean(&padded).is_ok());
}

#[test]
fn test_cleaned_identifiers_are_valid_titles() {
    for raw in ["LC-01", " LJ-100 ", "LC:07*", "[LW]-2", "x?y"] {
        let id = Identifier::clean(raw).unwrap();
        assert!(is_valid_title(id.as_str()), "{:?} -> {:?}", raw, id);
        assert!(!id.as_str().contains(RESERVED_TITLE_CHARS));
    }
}

#[test]
fn test_identifier_serde() {
    let id: Identifier = serde_json::from_str("\"LC:07\"").unwrap();
    assert_eq!(id, "LC07");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"LC07\"");
    assert!(serde_json::from_str::<Identifier>("\"***\"").is_err());
}

#[test]
fn test_cell_pos_parse() {
    assert_eq!("A1".parse::<CellPos>().unwrap(), CellPos::new(1, 1));
    assert_eq!("D15".parse::<CellPos>().unwrap(), CellPos::new(15, 4));
    assert_eq!("$T$50".parse::<CellPos>().unwrap(), CellPos::new(50, 20));
    assert_eq!("aa3".parse::<CellPos>().unwrap(), CellPos::new(3, 27));

    assert!("A0".parse::<CellPos>().is_err());
    assert!("15".parse::<CellPos>().is_err());
    assert!("D".parse::<CellPos>().is_err());
    assert!("D1X".parse::<CellPos>().is_err());
}

#[test]
fn test_cell_pos_display() {
    assert_eq!(CellPos::new(15, 4).to_a1(), "D15");
    assert_eq!(CellPos::new(1, 26).to_string(), "Z1");
    assert_eq!(CellPos::new(2, 28).to_string(), "AB2");
    assert_eq!(column_letters(16_384), "XFD");
}

#[test]
fn test_region_cells_row_major() {
    let region: CellRegion = "A1:B2".parse().unwrap();
    let cells: Vec<String> = region.cells().map(|c| c.to_a1()).collect();
    assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);

    let full: CellRegion = "A1:T50".parse().unwrap();
    assert_eq!(full.cells().count(), 1000);
    assert!(full.contains(CellPos::new(50, 20)));
    assert!(!full.contains(CellPos::new(51, 1)));
}

#[test]
fn test_region_inverted() {
    let region: CellRegion = "C5:A1".parse().unwrap();
    assert!(region.is_inverted());
    assert_eq!(region.cells().count(), 0);
}

#[test]
fn test_named_range_parse() {
    let range = NamedRange::parse("'Schedule'!$A$11:$A$47").unwrap();
    assert_eq!(range.sheet, "Schedule");
    assert_eq!(range.region.start, CellPos::new(11, 1));
    assert_eq!(range.region.end, CellPos::new(47, 1));

    let range = NamedRange::parse("Sheet1!B2").unwrap();
    assert_eq!(range.sheet, "Sheet1");
    assert_eq!(range.region.start, range.region.end);

    assert!(NamedRange::parse("A1:A5").is_err());
}

#[test]
fn test_image_size_display() {
    assert_eq!(ImageSize::new(300, 200).to_string(), "300x200");
}
