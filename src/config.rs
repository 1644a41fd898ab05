use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::age::{DEFAULT_BIN_WIDTH, DEFAULT_REFERENCE_EPOCH};
use crate::classify::DEFAULT_EXCLUDED_TOKENS;
use crate::domain::{HaplogroupKind, RegionPolicy};
use crate::error::HaploError;
use crate::records::ColumnMap;

pub const DEFAULT_CONFIG_FILE: &str = "haplofreq.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub columns: Option<ColumnMap>,
    #[serde(default)]
    pub input_delimiter: Option<String>,
    #[serde(default)]
    pub output_delimiter: Option<String>,
    #[serde(default)]
    pub bin_width: Option<u32>,
    #[serde(default)]
    pub reference_epoch: Option<i64>,
    #[serde(default)]
    pub excluded_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub region_policy: Option<RegionPolicy>,
    #[serde(default)]
    pub outputs: Option<OutputPaths>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputPaths {
    #[serde(default)]
    pub y: Option<Utf8PathBuf>,
    #[serde(default)]
    pub mt: Option<Utf8PathBuf>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_delimiter: Option<String>,
    pub output_delimiter: Option<String>,
    pub bin_width: Option<u32>,
    pub reference_epoch: Option<i64>,
    pub region_policy: Option<RegionPolicy>,
    pub y_output: Option<Utf8PathBuf>,
    pub mt_output: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub columns: ColumnMap,
    pub input_delimiter: u8,
    pub output_delimiter: u8,
    pub bin_width: u32,
    pub reference_epoch: i64,
    pub excluded_tokens: Vec<String>,
    pub region_policy: RegionPolicy,
    pub outputs: BTreeMap<HaplogroupKind, Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `haplofreq.json` from the working directory when it
    /// exists. Without either, built-in defaults apply.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, HaploError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| HaploError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| HaploError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, HaploError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(HaploError::InvalidConfig(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let input_delimiter = overrides
            .input_delimiter
            .or(config.input_delimiter)
            .map(|value| parse_delimiter(&value))
            .transpose()?
            .unwrap_or(b'\t');
        let output_delimiter = overrides
            .output_delimiter
            .or(config.output_delimiter)
            .map(|value| parse_delimiter(&value))
            .transpose()?
            .unwrap_or(b'\t');

        let bin_width = overrides
            .bin_width
            .or(config.bin_width)
            .unwrap_or(DEFAULT_BIN_WIDTH);
        if bin_width == 0 {
            return Err(HaploError::InvalidConfig(
                "bin_width must be greater than zero".to_string(),
            ));
        }

        let outputs_config = config.outputs.unwrap_or_default();
        let mut outputs = BTreeMap::new();
        outputs.insert(
            HaplogroupKind::Y,
            overrides
                .y_output
                .or(outputs_config.y)
                .unwrap_or_else(|| default_output(HaplogroupKind::Y)),
        );
        outputs.insert(
            HaplogroupKind::Mt,
            overrides
                .mt_output
                .or(outputs_config.mt)
                .unwrap_or_else(|| default_output(HaplogroupKind::Mt)),
        );

        Ok(ResolvedConfig {
            schema_version,
            columns: config.columns.unwrap_or_default(),
            input_delimiter,
            output_delimiter,
            bin_width,
            reference_epoch: overrides
                .reference_epoch
                .or(config.reference_epoch)
                .unwrap_or(DEFAULT_REFERENCE_EPOCH),
            excluded_tokens: config
                .excluded_tokens
                .unwrap_or_else(default_excluded_tokens),
            region_policy: overrides
                .region_policy
                .or(config.region_policy)
                .unwrap_or_default(),
            outputs,
        })
    }
}

impl ResolvedConfig {
    /// The config file that reproduces these settings.
    pub fn to_config(&self) -> Config {
        Config {
            schema_version: Some(self.schema_version),
            columns: Some(self.columns.clone()),
            input_delimiter: Some(delimiter_name(self.input_delimiter)),
            output_delimiter: Some(delimiter_name(self.output_delimiter)),
            bin_width: Some(self.bin_width),
            reference_epoch: Some(self.reference_epoch),
            excluded_tokens: Some(self.excluded_tokens.clone()),
            region_policy: Some(self.region_policy),
            outputs: Some(OutputPaths {
                y: self.outputs.get(&HaplogroupKind::Y).cloned(),
                mt: self.outputs.get(&HaplogroupKind::Mt).cloned(),
            }),
        }
    }
}

pub fn default_output(kind: HaplogroupKind) -> Utf8PathBuf {
    match kind {
        HaplogroupKind::Y => Utf8PathBuf::from("Y_haplogroup_frequencies.tsv"),
        HaplogroupKind::Mt => Utf8PathBuf::from("mtDNA_haplogroup_frequencies.tsv"),
    }
}

pub fn default_excluded_tokens() -> Vec<String> {
    DEFAULT_EXCLUDED_TOKENS
        .iter()
        .map(|token| token.to_string())
        .collect()
}

/// Accepts a single ASCII character, an escaped `\t`, or a name such as
/// `tab` or `comma`.
pub fn parse_delimiter(value: &str) -> Result<u8, HaploError> {
    match value {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "space" => Ok(b' '),
        "pipe" => Ok(b'|'),
        other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
        other => Err(HaploError::InvalidDelimiter(other.to_string())),
    }
}

fn delimiter_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tab".to_string(),
        other => char::from(other).to_string(),
    }
}
