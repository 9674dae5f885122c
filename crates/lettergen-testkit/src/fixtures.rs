//! Fixture files for tests

use lettergen_core::Row;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write an HTML template into `dir`
pub fn write_template(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write template fixture");
    path
}

/// Write a CSV file with a header row; cells are always quoted
pub fn write_csv(dir: &Path, name: &str, headers: &[&str], records: &[&[&str]]) -> PathBuf {
    fn line(cells: &[&str]) -> String {
        let quoted: Vec<String> = cells
            .iter()
            .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
            .collect();
        quoted.join(",") + "\n"
    }

    let mut content = line(headers);
    for record in records {
        content.push_str(&line(record));
    }

    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write CSV fixture");
    path
}

/// One cell of a [`write_xlsx`] worksheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SheetCell<'a> {
    Text(&'a str),
    Number(f64),
    Empty,
}

/// Write a single-sheet `.xlsx` workbook; the first row is the header
///
/// Text is stored as inline strings and numbers as plain values, so no
/// shared-string table or styles part is needed.
pub fn write_xlsx(dir: &Path, name: &str, sheet: &[&[SheetCell<'_>]]) -> PathBuf {
    const PARTS: [(&str, &str); 4] = [
        (
            "[Content_Types].xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
                r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                r#"</Types>"#,
            ),
        ),
        (
            "_rels/.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
                r#"</Relationships>"#,
            ),
        ),
        (
            "xl/workbook.xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<sheets><sheet name="People" sheetId="1" r:id="rId1"/></sheets>"#,
                r#"</workbook>"#,
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
                r#"</Relationships>"#,
            ),
        ),
    ];

    let mut sheet_xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    ));
    for (r, cells) in sheet.iter().enumerate() {
        let row = r + 1;
        sheet_xml.push_str(&format!(r#"<row r="{}">"#, row));
        for (c, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), row);
            match cell {
                SheetCell::Text(text) => sheet_xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    reference,
                    escape(text)
                )),
                SheetCell::Number(value) => {
                    sheet_xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value))
                }
                SheetCell::Empty => {}
            }
        }
        sheet_xml.push_str("</row>");
    }
    sheet_xml.push_str("</sheetData></worksheet>");

    let path = dir.join(name);
    let file = std::fs::File::create(&path).expect("Failed to create XLSX fixture");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (part, content) in PARTS {
        zip.start_file(part, options).expect("Failed to start XLSX part");
        zip.write_all(content.as_bytes()).expect("Failed to write XLSX part");
    }
    zip.start_file("xl/worksheets/sheet1.xml", options).expect("Failed to start worksheet");
    zip.write_all(sheet_xml.as_bytes()).expect("Failed to write worksheet");
    zip.finish().expect("Failed to finish XLSX fixture");
    path
}

fn column_letter(index: usize) -> char {
    assert!(index < 26, "fixture sheets are limited to columns A to Z");
    (b'A' + index as u8) as char
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Rows from `(field, value)` lists, indexed in order
pub fn rows(records: &[&[(&str, &str)]]) -> Vec<Row> {
    records
        .iter()
        .enumerate()
        .map(|(index, fields)| Row::new(index, fields.iter().copied()))
        .collect()
}

/// Write an executable shell script (a stand-in for an external converter)
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    let mut perms = std::fs::metadata(&path)
        .expect("Failed to stat script")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("Failed to make script executable");
    path
}

#[cfg(not(unix))]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(format!("{}.cmd", name));
    std::fs::write(&path, body).expect("Failed to write script");
    path
}
