use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{HaplogroupKind, SampleRecord, parse_numeric};
use crate::error::HaploError;

/// Header names of the semantic columns in the annotation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub region: String,
    pub age: String,
    pub latitude: String,
    pub longitude: String,
    pub y_haplogroup: String,
    pub mt_haplogroup: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            region: "Political Entity".to_string(),
            age: "Date mean in BP in years before 1950 CE [OxCal mu for a direct radiocarbon date, and average of range for a contextual date]".to_string(),
            latitude: "Lat.".to_string(),
            longitude: "Long.".to_string(),
            y_haplogroup: "Y haplogroup (manual curation in ISOGG format)".to_string(),
            mt_haplogroup: "mtDNA haplogroup if >2x or published".to_string(),
        }
    }
}

impl ColumnMap {
    pub fn haplogroup(&self, kind: HaplogroupKind) -> &str {
        match kind {
            HaplogroupKind::Y => &self.y_haplogroup,
            HaplogroupKind::Mt => &self.mt_haplogroup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleTable {
    pub source: Utf8PathBuf,
    pub columns: ColumnMap,
    pub records: Vec<SampleRecord>,
    /// Haplogroup kinds whose source column exists in the header.
    pub available: BTreeSet<HaplogroupKind>,
}

impl SampleTable {
    pub fn require(&self, kind: HaplogroupKind) -> Result<(), HaploError> {
        if self.available.contains(&kind) {
            return Ok(());
        }
        Err(HaploError::MissingHaplogroupColumn {
            kind,
            column: self.columns.haplogroup(kind).to_string(),
        })
    }
}

struct ColumnIndex {
    region: usize,
    age: usize,
    latitude: usize,
    longitude: usize,
    y_haplogroup: Option<usize>,
    mt_haplogroup: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SampleReader {
    delimiter: u8,
    columns: ColumnMap,
}

impl SampleReader {
    pub fn new(delimiter: u8, columns: ColumnMap) -> Self {
        Self { delimiter, columns }
    }

    /// Reads a delimited annotation file; `.gz` paths are decompressed.
    pub fn read_path(&self, path: &Utf8Path) -> Result<SampleTable, HaploError> {
        let file = File::open(path.as_std_path()).map_err(|err| HaploError::InputRead {
            path: path.as_std_path().to_path_buf(),
            message: err.to_string(),
        })?;
        let reader: Box<dyn Read> = if path.extension() == Some("gz") {
            Box::new(MultiGzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        self.read(reader, path)
    }

    pub fn read<R: Read>(&self, reader: R, source: &Utf8Path) -> Result<SampleTable, HaploError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|err| HaploError::InputParse(err.to_string()))?
            .clone();
        if headers.iter().all(|name| name.trim().is_empty()) {
            return Err(HaploError::EmptyInput(source.as_std_path().to_path_buf()));
        }

        let position = |name: &str| headers.iter().position(|header| header == name);
        let mut missing = Vec::new();
        let mut required = |name: &str| {
            position(name).unwrap_or_else(|| {
                missing.push(name.to_string());
                usize::MAX
            })
        };
        let index = ColumnIndex {
            region: required(self.columns.region.as_str()),
            age: required(self.columns.age.as_str()),
            latitude: required(self.columns.latitude.as_str()),
            longitude: required(self.columns.longitude.as_str()),
            y_haplogroup: position(self.columns.y_haplogroup.as_str()),
            mt_haplogroup: position(self.columns.mt_haplogroup.as_str()),
        };
        if !missing.is_empty() {
            return Err(HaploError::MissingColumns(missing));
        }

        let mut records = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let row = result.map_err(|err| {
                HaploError::InputParse(format!("record {}: {err}", line + 1))
            })?;
            let field = |idx: usize| row.get(idx).unwrap_or("");
            let optional = |idx: Option<usize>| idx.map(field).unwrap_or("").to_string();
            records.push(SampleRecord {
                region: field(index.region).to_string(),
                age_bp: parse_numeric(field(index.age)),
                latitude: parse_numeric(field(index.latitude)),
                longitude: parse_numeric(field(index.longitude)),
                y_haplogroup: optional(index.y_haplogroup),
                mt_haplogroup: optional(index.mt_haplogroup),
            });
        }
        if records.is_empty() {
            return Err(HaploError::EmptyInput(source.as_std_path().to_path_buf()));
        }
        debug!(rows = records.len(), source = %source, "loaded sample records");

        let mut available = BTreeSet::new();
        if index.y_haplogroup.is_some() {
            available.insert(HaplogroupKind::Y);
        }
        if index.mt_haplogroup.is_some() {
            available.insert(HaplogroupKind::Mt);
        }

        Ok(SampleTable {
            source: source.to_path_buf(),
            columns: self.columns.clone(),
            records,
            available,
        })
    }
}
