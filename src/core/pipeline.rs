use crate::core::counter::SubmissionCounter;
use crate::core::groups::GroupBuffers;
use crate::core::processor::{RecordOutcome, ResponseProcessor};
use crate::core::writer::GroupWriter;
use crate::core::{ConfigProvider, Pipeline, RawRecord, Storage, TransformResult};
use crate::utils::error::Result;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

/// Where the JSON export is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// `None` or `-` means standard input.
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if path.as_os_str() != "-" => Self::File(path),
            _ => Self::Stdin,
        }
    }

    async fn read_all(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => {
                tracing::info!("Reading file {}", path.display());
                Ok(tokio::fs::read(path).await?)
            }
            Self::Stdin => {
                tracing::info!("Reading from STDIN");
                let mut buffer = Vec::new();
                tokio::io::stdin().read_to_end(&mut buffer).await?;
                Ok(buffer)
            }
        }
    }
}

/// Reads a response export, flattens every record and writes one CSV per
/// response type and activity.
pub struct ResponsesPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    input: InputSource,
    processor: ResponseProcessor,
    writer: GroupWriter,
}

impl<S: Storage, C: ConfigProvider> ResponsesPipeline<S, C> {
    pub fn new(storage: S, config: C, input: InputSource) -> Self {
        Self {
            storage,
            config,
            input,
            processor: ResponseProcessor::new(),
            writer: GroupWriter::new(),
        }
    }

    /// Parse a complete export document. Anything but an array of records fails.
    pub fn parse_export(bytes: &[u8]) -> Result<Vec<RawRecord>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ResponsesPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        let bytes = self.input.read_all().await?;
        let records = Self::parse_export(&bytes)?;
        tracing::info!("Processing {} records", records.len());
        Ok(records)
    }

    async fn transform(&self, data: Vec<RawRecord>) -> Result<TransformResult> {
        tracing::debug!(
            "Sample limits: {} per record, {} units per sample",
            self.config.max_samples_per_record(),
            self.config.max_units_per_sample()
        );

        let total_records = data.len();
        let mut counter = SubmissionCounter::new();
        let mut buffers = GroupBuffers::new();
        let mut skipped = Vec::new();

        for raw in &data {
            match self.processor.process(raw)? {
                RecordOutcome::Parsed { group, mut record } => {
                    let index = counter.next_index(&raw.participant(), &group);
                    record.set("submission_index", index);
                    if self.config.include_json() {
                        record.set("raw_json", serde_json::to_string(raw)?);
                    }
                    buffers.push(group, record);
                }
                RecordOutcome::Skipped(record) => {
                    tracing::warn!("Skipping record {}: {}", record.id, record.reason);
                    skipped.push(record);
                }
            }
        }

        let result = TransformResult {
            groups: buffers.into_groups(),
            total_records,
            skipped,
        };
        tracing::info!(
            "Transformed {} out of {} records ({} skipped)",
            result.written_records(),
            result.total_records,
            result.skipped.len()
        );
        Ok(result)
    }

    async fn load(&self, result: &TransformResult) -> Result<Vec<String>> {
        let mut written = Vec::with_capacity(result.groups.len());

        for (idx, group) in result.groups.iter().enumerate() {
            let file_name = GroupWriter::file_name(self.config.file_prefix(), &group.key);
            tracing::info!(
                "Writing file ({}) {} to {}",
                idx + 1,
                file_name,
                self.config.output_path()
            );
            tracing::debug!("  -> {}", GroupWriter::header(group).join(", "));

            let bytes = self.writer.render(group)?;
            let path = self.storage.write_file(&file_name, &bytes).await?;
            written.push(path);
        }

        Ok(written)
    }
}
