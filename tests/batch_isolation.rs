use receipt_extract::{
    config::Config,
    credential::{Credential, CredentialSource},
    error::{ErrorKind, ExtractError},
    pipeline::Pipeline,
    service::ExtractionService,
};
use std::cell::{Cell, RefCell};
use std::path::Path;

const REPLY: &str = "Here is the result:\n{\"companyName\":\"Acme s.r.o.\",\"vatNumber\":\"SK123\",\"priceWithoutVAT\":10.0,\"vat\":2.1,\"vatRate\":21,\"priceIncludingVAT\":12.1,\"dateOfSale\":\"01.02.2024\"}\nLet me know if you need more.";

/// Counts calls and fails the configured call number (1-based).
struct FakeService {
    calls: Cell<usize>,
    fail_on: Option<usize>,
    reject_on: Option<usize>,
    reply: String,
    seen_keys: RefCell<Vec<String>>,
}

impl FakeService {
    fn new(fail_on: Option<usize>) -> Self {
        Self {
            calls: Cell::new(0),
            fail_on,
            reject_on: None,
            reply: REPLY.to_string(),
            seen_keys: RefCell::new(Vec::new()),
        }
    }
}

impl ExtractionService for FakeService {
    fn complete(
        &self,
        image_base64: &str,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, ExtractError> {
        let n = self.calls.get() + 1;
        self.calls.set(n);
        self.seen_keys.borrow_mut().push(credential.expose().to_string());
        assert!(!image_base64.is_empty());
        assert!(prompt.contains("JSON schema"));
        if self.reject_on == Some(n) {
            return Err(ExtractError::Auth);
        }
        if self.fail_on == Some(n) {
            return Err(ExtractError::Service("simulated upstream failure".into()));
        }
        Ok(self.reply.clone())
    }
}

fn test_config(out_dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.output.out_dir = out_dir.display().to_string();
    cfg.output.echo_record = false;
    cfg
}

fn explicit_key() -> Vec<CredentialSource> {
    vec![CredentialSource::Explicit("gsk_test_key_123456".into())]
}

fn json_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".json"))
        .collect();
    names.sort();
    names
}

#[test]
fn one_failing_file_does_not_stop_the_batch() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        std::fs::write(images.path().join(name), b"\xff\xd8\xff fake jpeg").unwrap();
    }

    let service = FakeService::new(Some(2));
    let pipeline = Pipeline::new(&test_config(out.path()), &service, explicit_key());
    let report = pipeline.run_batch(images.path()).unwrap();

    assert_eq!(service.calls.get(), 3);
    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.summary_line(), "2/3 files processed successfully");
    assert_eq!(json_files(out.path()), ["a.json", "c.json"]);

    let failed = &report.outcomes[1];
    assert!(!failed.ok);
    assert_eq!(failed.kind, Some(ErrorKind::Service));
    assert!(failed.input.ends_with("b.jpg"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("a.json")).unwrap()).unwrap();
    assert_eq!(written["vatNumber"], "SK123");
}

#[test]
fn missing_credential_is_fatal_before_any_work() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::write(images.path().join("a.jpg"), b"img").unwrap();

    let service = FakeService::new(None);
    let sources = vec![
        CredentialSource::File {
            path: images.path().join(".env"),
            key: "GROQ_API_KEY".into(),
        },
        CredentialSource::Env("RECEIPT_EXTRACT_TEST_DEFINITELY_UNSET".into()),
    ];
    let pipeline = Pipeline::new(&test_config(out.path()), &service, sources);

    let err = pipeline.run_batch(images.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(service.calls.get(), 0);
    assert!(json_files(out.path()).is_empty());

    let err = pipeline.run_single(&images.path().join("a.jpg")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(service.calls.get(), 0);
}

#[test]
fn uppercase_extension_is_processed_like_lowercase() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::write(images.path().join("RECEIPT.JPG"), b"img").unwrap();
    std::fs::write(images.path().join("receipt2.jpg"), b"img").unwrap();
    std::fs::write(images.path().join("notes.txt"), b"text").unwrap();

    let service = FakeService::new(None);
    let pipeline = Pipeline::new(&test_config(out.path()), &service, explicit_key());
    let report = pipeline.run_batch(images.path()).unwrap();

    assert_eq!(report.summary_line(), "2/2 files processed successfully");
    assert_eq!(json_files(out.path()), ["RECEIPT.json", "receipt2.json"]);
}

#[test]
fn empty_directory_reports_zero_files() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let service = FakeService::new(None);
    let pipeline = Pipeline::new(&test_config(out.path()), &service, explicit_key());

    let report = pipeline.run_batch(images.path()).unwrap();
    assert_eq!(report.total(), 0);
    assert_eq!(service.calls.get(), 0);
}

#[test]
fn unrecoverable_reply_is_isolated_as_format_error() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::write(images.path().join("a.png"), b"img").unwrap();

    let mut service = FakeService::new(None);
    service.reply = "Sorry, I cannot process this image.".into();
    let pipeline = Pipeline::new(&test_config(out.path()), &service, explicit_key());
    let report = pipeline.run_batch(images.path()).unwrap();

    assert_eq!(report.summary_line(), "0/1 files processed successfully");
    assert_eq!(report.outcomes[0].kind, Some(ErrorKind::Format));
    assert!(report.outcomes[0].input_sha256.is_some());
}

#[test]
fn single_file_mode_writes_named_output_and_uses_explicit_key() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let image = images.path().join("shop.jpeg");
    std::fs::write(&image, b"img").unwrap();

    let service = FakeService::new(None);
    let pipeline = Pipeline::new(&test_config(out.path()), &service, explicit_key());
    let done = pipeline.run_single(&image).unwrap();

    assert_eq!(done.output, out.path().join("shop.json"));
    assert_eq!(done.record.len(), 7);
    assert_eq!(service.seen_keys.borrow().as_slice(), ["gsk_test_key_123456"]);

    let err = pipeline.run_single(&images.path().join("missing.jpg")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(service.calls.get(), 1);
}

#[test]
fn batch_report_is_written_when_enabled() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::write(images.path().join("a.gif"), b"img").unwrap();

    let mut cfg = test_config(out.path());
    cfg.output.write_report_json = true;
    let service = FakeService::new(None);
    let pipeline = Pipeline::new(&cfg, &service, explicit_key());
    pipeline.run_batch(images.path()).unwrap();

    let raw = std::fs::read_to_string(out.path().join("batch-report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(report["outcomes"][0]["ok"], true);
    assert_eq!(report["outcomes"][0]["input_sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn key_rejected_by_service_is_a_per_file_failure() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        std::fs::write(images.path().join(name), b"img").unwrap();
    }

    let mut service = FakeService::new(None);
    service.reject_on = Some(2);
    let pipeline = Pipeline::new(&test_config(out.path()), &service, explicit_key());
    let report = pipeline.run_batch(images.path()).unwrap();

    assert_eq!(service.calls.get(), 3);
    assert_eq!(report.summary_line(), "2/3 files processed successfully");
    assert_eq!(report.outcomes[1].kind, Some(ErrorKind::Auth));
    assert_eq!(json_files(out.path()), ["a.json", "c.json"]);
}

#[test]
fn missing_batch_directory_reports_zero_files() {
    let out = tempfile::tempdir().unwrap();
    let service = FakeService::new(None);
    let pipeline = Pipeline::new(&test_config(out.path()), &service, explicit_key());

    let report = pipeline
        .run_batch(&out.path().join("no-such-dir"))
        .unwrap();
    assert_eq!(report.total(), 0);
    assert_eq!(service.calls.get(), 0);
}
