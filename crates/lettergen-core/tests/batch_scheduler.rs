//! Batch scheduler behavior against fake backends

use lettergen_core::{
    BatchOptions, CancellationToken, ConversionKind, ExistingFilePolicy, JobResult, JobScheduler,
    Progress, ProgressObserver, Row, Stage, Template,
};
use lettergen_testkit::{
    FailingBackend, GatedBackend, PanickingBackend, RecordingBackend, rows, temp_dir_in_workspace,
};
use std::path::Path;
use std::sync::Mutex;

fn letter_template(dir: &Path) -> Template {
    Template::from_source(
        "<html><head></head><body><p>Dear {{name}},</p><p>{{ amount | required }}</p></body></html>",
        dir,
    )
    .unwrap()
}

fn names(results: &[JobResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| match r {
            JobResult::Success { name, .. } => name.clone(),
            JobResult::Failure { stage, .. } => format!("<{}>", stage),
        })
        .collect()
}

fn many_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new(
                i,
                [
                    ("filename", format!("letter-{:03}", i)),
                    ("name", format!("Person {}", i)),
                    ("amount", format!("{}.00", i * 10)),
                ],
            )
        })
        .collect()
}

#[test]
fn test_report_has_one_result_per_row_in_order() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let options = BatchOptions::new(temp.path().join("out")).workers(4);
    let scheduler = JobScheduler::new(&backend, options);

    let input = many_rows(25);
    let report = scheduler.run(&letter_template(temp.path()), &input).unwrap();

    assert_eq!(report.results.len(), input.len());
    assert_eq!(report.succeeded, 25);
    assert_eq!(report.failed, 0);
    for (i, result) in report.results.iter().enumerate() {
        assert_eq!(result.row_index(), i);
    }
}

#[test]
fn test_empty_batch_reports_nothing() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let scheduler = JobScheduler::new(&backend, BatchOptions::new(temp.path().join("out")));

    let report = scheduler.run(&letter_template(temp.path()), &[]).unwrap();

    assert_eq!(report.total(), 0);
    assert!(report.is_complete_success());
    assert!(temp.path().join("out").is_dir());
}

#[test]
fn test_pdf_and_docx_receive_identical_html() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let scheduler =
        JobScheduler::new(&backend, BatchOptions::new(temp.path().join("out")).workers(3));

    scheduler
        .run(&letter_template(temp.path()), &many_rows(9))
        .unwrap();

    let pdf = backend.html_for(ConversionKind::Pdf);
    let docx = backend.html_for(ConversionKind::Docx);
    assert_eq!(pdf.len(), 9);
    assert_eq!(pdf, docx);
}

#[test]
fn test_duplicate_and_empty_names() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let out = temp.path().join("out");
    let scheduler = JobScheduler::new(&backend, BatchOptions::new(&out).workers(3));

    let input = rows(&[
        &[("filename", "Bob"), ("amount", "1")],
        &[("filename", "Bob"), ("amount", "2")],
        &[("filename", ""), ("amount", "3")],
    ]);
    let report = scheduler.run(&letter_template(temp.path()), &input).unwrap();

    assert_eq!(names(&report.results), vec!["Bob", "Bob (1)", "row_2"]);
    for name in ["Bob", "Bob (1)", "row_2"] {
        assert!(out.join(format!("{}.pdf", name)).is_file());
        assert!(out.join(format!("{}.docx", name)).is_file());
    }
}

#[test]
fn test_missing_required_field_fails_only_that_row() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let out = temp.path().join("out");
    let scheduler = JobScheduler::new(&backend, BatchOptions::new(&out).filename_field("name"));

    let input = rows(&[
        &[("name", "Ann"), ("amount", "10")],
        &[("name", "Ben")],
        &[("name", "Cat"), ("amount", "30")],
    ]);
    let report = scheduler.run(&letter_template(temp.path()), &input).unwrap();

    assert_eq!(names(&report.results), vec!["Ann", "<render>", "Cat"]);
    match &report.results[1] {
        JobResult::Failure { error_detail, .. } => assert!(error_detail.contains("amount")),
        other => panic!("Expected failure, got {:?}", other),
    }

    let mut files: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["Ann.docx", "Ann.pdf", "Cat.docx", "Cat.pdf"]);
}

#[test]
fn test_converter_failure_is_isolated() {
    let temp = temp_dir_in_workspace();
    let backend = FailingBackend::new()
        .fail_pdf_on("Person 3")
        .fail_docx_on("Person 5");
    let out = temp.path().join("out");
    let scheduler = JobScheduler::new(&backend, BatchOptions::new(&out).workers(4));

    let report = scheduler
        .run(&letter_template(temp.path()), &many_rows(8))
        .unwrap();

    assert_eq!(report.succeeded, 6);
    assert_eq!(report.results[3].stage(), Some(Stage::PdfConversion));
    assert_eq!(report.results[5].stage(), Some(Stage::DocxConversion));
    assert!(!out.join("letter-003.pdf").exists());
    assert!(!out.join("letter-005.docx").exists());
    assert!(!out.join("letter-005.pdf").exists());
    assert!(out.join("letter-004.pdf").exists());
}

#[test]
fn test_converter_panic_fails_only_that_row() {
    let temp = temp_dir_in_workspace();
    let backend = PanickingBackend::new(ConversionKind::Pdf, "Person 1,");
    let out = temp.path().join("out");
    let scheduler = JobScheduler::new(&backend, BatchOptions::new(&out).workers(2));

    let report = scheduler
        .run(&letter_template(temp.path()), &many_rows(3))
        .unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    match &report.results[1] {
        JobResult::Failure {
            row_index,
            stage,
            error_detail,
        } => {
            assert_eq!(*row_index, 1);
            assert_eq!(*stage, Stage::PdfConversion);
            assert!(error_detail.contains("converter crashed"), "{error_detail}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!out.join("letter-001.pdf").exists());
    assert!(out.join("letter-000.pdf").exists());
    assert!(out.join("letter-002.docx").exists());
}

#[test]
fn test_docx_panic_reports_docx_stage() {
    let temp = temp_dir_in_workspace();
    let backend = PanickingBackend::new(ConversionKind::Docx, "Person 0,");
    let out = temp.path().join("out");
    let scheduler = JobScheduler::new(&backend, BatchOptions::new(&out).workers(1));

    let report = scheduler
        .run(&letter_template(temp.path()), &many_rows(2))
        .unwrap();

    assert_eq!(report.results[0].stage(), Some(Stage::DocxConversion));
    assert!(report.results[1].is_success());
    assert!(!out.join("letter-000.pdf").exists());
}

struct CancelAfter {
    rows: usize,
    token: CancellationToken,
    seen: Mutex<Vec<(usize, Progress)>>,
}

impl ProgressObserver for CancelAfter {
    fn on_result(&self, result: &JobResult, progress: Progress) {
        self.seen
            .lock()
            .unwrap()
            .push((result.row_index(), progress));
        if progress.completed == self.rows {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancellation_after_row_k() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let token = CancellationToken::new();
    let observer = CancelAfter {
        rows: 3,
        token: token.clone(),
        seen: Mutex::new(Vec::new()),
    };
    let scheduler = JobScheduler::new(&backend, BatchOptions::new(temp.path().join("out")).workers(1))
        .with_observer(&observer)
        .with_cancellation(token);

    let report = scheduler
        .run(&letter_template(temp.path()), &many_rows(7))
        .unwrap();

    assert_eq!(report.results.len(), 7);
    for result in &report.results[..3] {
        assert!(result.is_success());
    }
    for result in &report.results[3..] {
        assert_eq!(result.stage(), Some(Stage::Cancelled));
    }
    assert_eq!(backend.html_for(ConversionKind::Pdf).len(), 3);

    // Cancelled rows are still reported to the observer
    let seen = observer.seen.lock().unwrap();
    assert_eq!(seen.len(), 7);
    assert_eq!(seen.last().unwrap().1, Progress { completed: 7, total: 7 });
}

#[test]
fn test_cancel_while_rows_in_flight() {
    let temp = temp_dir_in_workspace();
    let backend = GatedBackend::new();
    let scheduler =
        JobScheduler::new(&backend, BatchOptions::new(temp.path().join("out")).workers(2));
    let token = scheduler.cancellation_token();
    let template = letter_template(temp.path());
    let input = many_rows(6);

    let report = std::thread::scope(|s| {
        let handle = s.spawn(|| scheduler.run(&template, &input));
        backend.wait_for_entered(2);
        token.cancel();
        backend.open();
        handle.join().unwrap().unwrap()
    });

    // The two dispatched rows finish, the rest never start
    assert_eq!(backend.entered(), 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(
        report.failures().filter(|r| r.stage() == Some(Stage::Cancelled)).count(),
        4
    );
}

#[test]
fn test_rerun_is_byte_identical() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let template = letter_template(temp.path());
    let input = many_rows(5);

    let first = temp.path().join("first");
    let second = temp.path().join("second");
    JobScheduler::new(&backend, BatchOptions::new(&first).workers(4))
        .run(&template, &input)
        .unwrap();
    JobScheduler::new(&backend, BatchOptions::new(&second).workers(2))
        .run(&template, &input)
        .unwrap();

    for i in 0..5 {
        for ext in ["pdf", "docx"] {
            let name = format!("letter-{:03}.{}", i, ext);
            assert_eq!(
                std::fs::read(first.join(&name)).unwrap(),
                std::fs::read(second.join(&name)).unwrap()
            );
        }
    }
}

#[test]
fn test_existing_files_policies() {
    let temp = temp_dir_in_workspace();
    let backend = RecordingBackend::new();
    let template = letter_template(temp.path());
    let out = temp.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("Ann.pdf"), b"old").unwrap();

    let input = rows(&[&[("filename", "Ann"), ("amount", "1")]]);

    let fail = JobScheduler::new(
        &backend,
        BatchOptions::new(&out).existing_files(ExistingFilePolicy::Fail),
    )
    .run(&template, &input)
    .unwrap();
    assert_eq!(fail.results[0].stage(), Some(Stage::NameResolution));
    assert_eq!(std::fs::read(out.join("Ann.pdf")).unwrap(), b"old");

    let disambiguate = JobScheduler::new(
        &backend,
        BatchOptions::new(&out).existing_files(ExistingFilePolicy::Disambiguate),
    )
    .run(&template, &input)
    .unwrap();
    assert_eq!(names(&disambiguate.results), vec!["Ann (1)"]);

    let overwrite = JobScheduler::new(&backend, BatchOptions::new(&out))
        .run(&template, &input)
        .unwrap();
    assert_eq!(names(&overwrite.results), vec!["Ann"]);
    assert_ne!(std::fs::read(out.join("Ann.pdf")).unwrap(), b"old");
}

#[test]
fn test_unwritable_output_dir_is_fatal() {
    let temp = temp_dir_in_workspace();
    let blocker = temp.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let backend = RecordingBackend::new();

    let result = JobScheduler::new(&backend, BatchOptions::new(blocker.join("out")))
        .run(&letter_template(temp.path()), &many_rows(2));

    assert!(matches!(
        result,
        Err(lettergen_core::LetterGenError::OutputDirUnavailable { .. })
    ));
    assert!(backend.calls().is_empty());
}
