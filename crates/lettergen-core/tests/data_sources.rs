//! Loading rows from data files

use lettergen_core::LetterGenError;
use lettergen_core::row::load_dataset;
use lettergen_testkit::{SheetCell, temp_dir_in_workspace, write_csv, write_xlsx};

#[test]
fn test_load_csv_file() {
    let temp = temp_dir_in_workspace();
    let path = write_csv(
        temp.path(),
        "people.csv",
        &["filename", "First Name", "amount"],
        &[&["ann", "Ann", "10"], &["", "", ""], &["ben", "Ben", "0042"]],
    );

    let dataset = load_dataset(&path).unwrap();

    assert_eq!(dataset.headers(), &["filename", "First Name", "amount"]);
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.rows()[1].get("First Name"), Some("Ben"));
    assert_eq!(dataset.rows()[1].get("amount"), Some("0042"));
    assert_eq!(dataset.rows()[1].index(), 1);
}

#[test]
fn test_load_xlsx_workbook() {
    use SheetCell::{Empty, Number, Text};

    let temp = temp_dir_in_workspace();
    let path = write_xlsx(
        temp.path(),
        "people.xlsx",
        &[
            &[Text(" filename "), Text("  "), Text("name"), Text("amount")],
            &[Text("ann"), Text("ignored"), Text("Ann & Co"), Number(42.0)],
            &[],
            &[Empty, Empty, Empty, Empty],
            &[Text("ben"), Empty, Text("Ben"), Number(12.5)],
        ],
    );

    let dataset = load_dataset(&path).unwrap();

    assert_eq!(dataset.headers(), &["filename", "name", "amount"]);
    assert_eq!(dataset.len(), 2);
    let first = &dataset.rows()[0];
    assert_eq!(first.index(), 0);
    assert_eq!(first.get("filename"), Some("ann"));
    assert_eq!(first.get("name"), Some("Ann & Co"));
    assert_eq!(first.get("amount"), Some("42"));
    assert_eq!(first.fields().len(), 3);
    let second = &dataset.rows()[1];
    assert_eq!(second.index(), 1);
    assert_eq!(second.get("name"), Some("Ben"));
    assert_eq!(second.get("amount"), Some("12.5"));
}

#[test]
fn test_missing_data_file() {
    let temp = temp_dir_in_workspace();
    match load_dataset(temp.path().join("nope.csv")) {
        Err(LetterGenError::DataReadFailed { reason, .. }) => {
            assert!(reason.contains("not found"))
        }
        other => panic!("Expected DataReadFailed, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn test_unsupported_extension() {
    let temp = temp_dir_in_workspace();
    let path = temp.path().join("people.json");
    std::fs::write(&path, "[]").unwrap();

    assert!(matches!(
        load_dataset(&path),
        Err(LetterGenError::DataUnsupportedFormat { .. })
    ));
}

#[test]
fn test_corrupt_xlsx_is_data_error() {
    let temp = temp_dir_in_workspace();
    let path = temp.path().join("people.xlsx");
    std::fs::write(&path, "not a zip").unwrap();

    assert!(matches!(
        load_dataset(&path),
        Err(LetterGenError::DataReadFailed { .. })
    ));
}
