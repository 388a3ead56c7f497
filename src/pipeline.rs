use crate::{
    config::Config,
    credential::{Credential, CredentialSource, resolve_credential},
    encode::{EncodedImage, encode_image},
    error::ExtractError,
    prompt::build_prompt,
    record::{ReceiptRecord, write_record},
    recover::recover,
    report::{BatchReport, FileOutcome},
    scan::ImageScan,
    schema::SchemaCatalog,
    service::ExtractionService,
    util::{display_name, now_rfc3339},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runs images through encode → prompt → service → recover → write, one at a
/// time.
pub struct Pipeline<S: ExtractionService> {
    cfg: Config,
    catalog: SchemaCatalog,
    service: S,
    sources: Vec<CredentialSource>,
    prompt: String,
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub output: PathBuf,
    pub record: ReceiptRecord,
    pub input_sha256: String,
}

impl<S: ExtractionService> Pipeline<S> {
    pub fn new(cfg: &Config, service: S, sources: Vec<CredentialSource>) -> Self {
        let catalog = SchemaCatalog::receipt();
        let prompt = build_prompt(catalog.policy, &catalog.schema);
        Self {
            cfg: cfg.clone(),
            catalog,
            service,
            sources,
            prompt,
        }
    }

    pub fn out_dir(&self) -> PathBuf {
        PathBuf::from(&self.cfg.output.out_dir)
    }

    fn credential(&self) -> Result<Credential, ExtractError> {
        resolve_credential(&self.sources).ok_or(ExtractError::Auth)
    }

    fn prepare_out_dir(&self) -> Result<PathBuf, ExtractError> {
        let out_dir = self.out_dir();
        std::fs::create_dir_all(&out_dir).map_err(|e| ExtractError::io(&out_dir, e))?;
        Ok(out_dir)
    }

    /// Processes one existing file. Fails fast on a missing credential before
    /// the path is looked at.
    pub fn run_single(&self, input: &Path) -> Result<FileResult, ExtractError> {
        let credential = self.credential()?;
        if !input.exists() {
            return Err(ExtractError::NotFound(input.to_path_buf()));
        }
        let out_dir = self.prepare_out_dir()?;
        info!("processing single file: {}", input.display());
        let encoded = encode_image(input)?;
        self.extract_encoded(input, &encoded, &credential, &out_dir)
    }

    /// Processes every matching image in `dir`. Per-file failures, including a
    /// key the service rejects, are logged and tallied; only an unresolvable
    /// credential ends the run early.
    pub fn run_batch(&self, dir: &Path) -> Result<BatchReport, ExtractError> {
        let credential = self.credential()?;
        let mut report = BatchReport::new(dir, now_rfc3339());

        let scan = ImageScan::new(dir, &self.cfg.input.extensions);
        let images = scan.collect_sorted()?;
        if images.is_empty() {
            info!("no image files found in {}", dir.display());
            report.finished = now_rfc3339();
            return Ok(report);
        }
        info!("found {} image(s) to process", images.len());

        let out_dir = self.prepare_out_dir()?;

        for image in &images {
            let name = display_name(image);
            info!("processing: {name}");

            let encoded = match encode_image(image) {
                Ok(e) => e,
                Err(err) => {
                    warn!(file = %name, kind = %err.kind(), "failed to extract data: {err}");
                    report.outcomes.push(FileOutcome::failure(image, None, &err));
                    continue;
                }
            };

            match self.extract_encoded(image, &encoded, &credential, &out_dir) {
                Ok(done) => {
                    report.outcomes.push(FileOutcome::success(
                        image,
                        done.input_sha256,
                        &done.output,
                    ));
                }
                Err(err) => {
                    warn!(file = %name, kind = %err.kind(), "failed to extract data: {err}");
                    if let ExtractError::Format { raw } = &err {
                        debug!(file = %name, "unrecoverable response: {raw}");
                    }
                    report
                        .outcomes
                        .push(FileOutcome::failure(image, Some(encoded.sha256), &err));
                }
            }
        }

        report.finished = now_rfc3339();
        if self.cfg.output.write_report_json {
            self.write_report(&report, &out_dir);
        }
        Ok(report)
    }

    fn extract_encoded(
        &self,
        input: &Path,
        encoded: &EncodedImage,
        credential: &Credential,
        out_dir: &Path,
    ) -> Result<FileResult, ExtractError> {
        debug!(
            "encoded {} bytes={} sha256={}",
            input.display(),
            encoded.byte_len,
            encoded.sha256
        );
        let raw = self
            .service
            .complete(&encoded.data, &self.prompt, credential)?;
        let record = recover(&raw)?;

        let missing = record.missing_required(&self.catalog.schema);
        if !missing.is_empty() {
            warn!(file = %display_name(input), "record is missing fields: {}", missing.join(", "));
        }

        let output = write_record(&record, input, out_dir)?;
        info!(
            "extracted data from {} -> {}",
            display_name(input),
            output.display()
        );
        if self.cfg.output.echo_record {
            println!("{}", record.to_pretty_json());
        }

        Ok(FileResult {
            output,
            record,
            input_sha256: encoded.sha256.clone(),
        })
    }

    fn write_report(&self, report: &BatchReport, out_dir: &Path) {
        let path = out_dir.join(&self.cfg.output.report_filename);
        let written = serde_json::to_string_pretty(report)
            .map_err(std::io::Error::other)
            .and_then(|raw| std::fs::write(&path, raw));
        if let Err(err) = written {
            warn!("could not write batch report {}: {err}", path.display());
        }
    }
}
