use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::classify::HaplogroupClassifier;
use crate::config::ResolvedConfig;
use crate::domain::HaplogroupKind;
use crate::error::HaploError;
use crate::pipeline::{FrequencyPipeline, RunStats};
use crate::records::{SampleReader, SampleTable};
use crate::store::{write_json_atomic, write_table_atomic};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: String,
    pub rows: usize,
    pub generated_at: String,
    pub tables: Vec<TableReport>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.count(TableStatus::Written)
    }

    pub fn failed(&self) -> usize {
        self.count(TableStatus::Failed)
    }

    fn count(&self, status: TableStatus) -> usize {
        self.tables
            .iter()
            .filter(|table| table.status == status)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Written,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub kind: HaplogroupKind,
    pub status: TableStatus,
    pub output: String,
    pub columns: Vec<String>,
    pub stats: Option<RunStats>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyEntry {
    pub code: String,
    pub valid: bool,
    pub basal: Option<String>,
    pub subclade: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitResult {
    pub path: String,
    pub written: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum ProgressSinkKind {
    Build,
    Classify,
    Init,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct App {
    config: ResolvedConfig,
    pipeline: FrequencyPipeline,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Result<Self, HaploError> {
        let pipeline = FrequencyPipeline::from_config(&config)?;
        Ok(Self { config, pipeline })
    }

    /// Reads the input and builds one table per requested kind. Only a
    /// failure to read the input aborts the whole run.
    pub fn build(
        &self,
        input: &Utf8Path,
        kinds: &[HaplogroupKind],
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, HaploError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Read; loading {input}"),
            elapsed: None,
        });

        let reader = SampleReader::new(self.config.input_delimiter, self.config.columns.clone());
        let samples = reader.read_path(input)?;
        info!(rows = samples.records.len(), input = %input, "loaded annotation table");
        sink.event(ProgressEvent {
            message: format!("phase=Read; {} rows", samples.records.len()),
            elapsed: Some(started.elapsed()),
        });

        Ok(self.build_tables(&samples, kinds, sink))
    }

    pub fn build_tables(
        &self,
        samples: &SampleTable,
        kinds: &[HaplogroupKind],
        sink: &dyn ProgressSink,
    ) -> RunReport {
        let tables = kinds
            .iter()
            .map(|&kind| self.build_table(samples, kind, sink))
            .collect();

        RunReport {
            input: samples.source.to_string(),
            rows: samples.records.len(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            tables,
        }
    }

    fn build_table(
        &self,
        samples: &SampleTable,
        kind: HaplogroupKind,
        sink: &dyn ProgressSink,
    ) -> TableReport {
        let started = Instant::now();
        let output = self.output_path(kind);
        sink.event(ProgressEvent {
            message: format!("phase=Aggregate; building {kind} table"),
            elapsed: None,
        });

        let result = self.pipeline.run(samples, kind).and_then(|built| {
            sink.event(ProgressEvent {
                message: format!("phase=Write; {kind} -> {output}"),
                elapsed: Some(started.elapsed()),
            });
            write_table_atomic(&output, &built.table, self.config.output_delimiter)?;
            Ok(built)
        });

        match result {
            Ok(built) => {
                info!(
                    kind = %kind,
                    output = %output,
                    rows = built.table.rows.len(),
                    "wrote haplogroup table"
                );
                TableReport {
                    kind,
                    status: TableStatus::Written,
                    output: output.to_string(),
                    columns: built.table.header(),
                    stats: Some(built.stats),
                    error: None,
                }
            }
            Err(err) => {
                let status = match &err {
                    HaploError::NoHaplogroupData(_) => {
                        warn!(kind = %kind, "{err}; skipping table");
                        TableStatus::Skipped
                    }
                    _ => {
                        error!(kind = %kind, "{err}");
                        TableStatus::Failed
                    }
                };
                TableReport {
                    kind,
                    status,
                    output: output.to_string(),
                    columns: Vec::new(),
                    stats: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    pub fn classify(&self, codes: &[String]) -> Vec<ClassifyEntry> {
        let classifier = HaplogroupClassifier::new(self.config.excluded_tokens.iter().cloned());
        codes
            .iter()
            .map(|code| {
                let classified = classifier.classify(code);
                ClassifyEntry {
                    code: code.clone(),
                    valid: classified.is_some(),
                    basal: classified.map(|value| value.basal.to_string()),
                    subclade: classified
                        .and_then(|value| value.subclade)
                        .map(|code| code.to_string()),
                }
            })
            .collect()
    }

    /// Writes the resolved settings as a config file unless one exists.
    pub fn init_config(
        &self,
        path: &Utf8Path,
        force: bool,
        sink: &dyn ProgressSink,
    ) -> Result<InitResult, HaploError> {
        if path.as_std_path().exists() && !force {
            sink.event(ProgressEvent {
                message: format!("phase=Init; {path} already exists"),
                elapsed: None,
            });
            return Ok(InitResult {
                path: path.to_string(),
                written: false,
            });
        }
        write_json_atomic(path, &self.config.to_config())?;
        sink.event(ProgressEvent {
            message: format!("phase=Init; wrote {path}"),
            elapsed: None,
        });
        Ok(InitResult {
            path: path.to_string(),
            written: true,
        })
    }

    fn output_path(&self, kind: HaplogroupKind) -> Utf8PathBuf {
        self.config
            .outputs
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| crate::config::default_output(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigLoader, ConfigOverrides};
    use crate::output::JsonOutput;

    #[test]
    fn classify_reports_basal_and_subclade() {
        let config =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        let app = App::new(config).unwrap();
        let entries = app.classify(&["r1b".to_string(), "..".to_string()]);
        assert_eq!(entries[0].basal.as_deref(), Some("R"));
        assert_eq!(entries[0].subclade.as_deref(), Some("R1"));
        assert!(!entries[1].valid);
    }

    #[test]
    fn init_does_not_overwrite() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("haplofreq.json")).unwrap();
        std::fs::write(path.as_std_path(), b"{}").unwrap();

        let config =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        let app = App::new(config).unwrap();
        let result = app.init_config(&path, false, &JsonOutput).unwrap();
        assert!(!result.written);
        assert_eq!(std::fs::read_to_string(path.as_std_path()).unwrap(), "{}");
    }
}
