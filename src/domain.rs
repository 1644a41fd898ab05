use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HaplogroupKind {
    Y,
    Mt,
}

impl HaplogroupKind {
    pub const ALL: [HaplogroupKind; 2] = [HaplogroupKind::Y, HaplogroupKind::Mt];

}

impl fmt::Display for HaplogroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaplogroupKind::Y => write!(f, "Y-chr"),
            HaplogroupKind::Mt => write!(f, "mtDNA"),
        }
    }
}

/// How region labels are turned into grouping keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegionPolicy {
    #[default]
    Trim,
    Verbatim,
}

/// A haplogroup column identifier: a basal letter, optionally followed by the
/// first digit of its subclade.
///
/// The derived ordering sorts by basal letter, puts the bare basal before its
/// subclades and orders subclades by digit, so `A < A1 < A2 < B < B1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HaplogroupCode {
    basal: char,
    digit: Option<char>,
}

impl HaplogroupCode {
    pub fn basal(letter: char) -> Self {
        Self {
            basal: letter,
            digit: None,
        }
    }

    pub fn subclade(letter: char, digit: char) -> Self {
        Self {
            basal: letter,
            digit: Some(digit),
        }
    }

    pub fn is_subclade(&self) -> bool {
        self.digit.is_some()
    }

    /// The basal code this code belongs to; a basal code is its own parent.
    pub fn parent(&self) -> HaplogroupCode {
        Self::basal(self.basal)
    }
}

impl fmt::Display for HaplogroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.digit {
            Some(digit) => write!(f, "{}{}", self.basal, digit),
            None => write!(f, "{}", self.basal),
        }
    }
}

/// Outcome of classifying one valid raw haplogroup code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedHaplogroup {
    pub basal: HaplogroupCode,
    pub subclade: Option<HaplogroupCode>,
}

/// A fixed-width age window in years before present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeBin {
    pub lower: i64,
    pub width: i64,
}

impl AgeBin {
    pub fn upper(&self) -> i64 {
        self.lower + self.width
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AgeBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} BP", self.lower, self.upper())
    }
}

/// Population grouping key. Field order drives the row order of the output:
/// region first, then age bin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    region: String,
    bin: AgeBin,
    population: String,
}

impl GroupKey {
    pub fn new(region: String, bin: AgeBin) -> Self {
        let population = format!("{region} {}", bin.label());
        Self {
            region,
            bin,
            population,
        }
    }

    pub fn population(&self) -> &str {
        &self.population
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn bin(&self) -> AgeBin {
        self.bin
    }
}

/// One annotated individual as read from the input table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleRecord {
    pub region: String,
    pub age_bp: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub y_haplogroup: String,
    pub mt_haplogroup: String,
}

impl SampleRecord {
    pub fn haplogroup(&self, kind: HaplogroupKind) -> &str {
        match kind {
            HaplogroupKind::Y => &self.y_haplogroup,
            HaplogroupKind::Mt => &self.mt_haplogroup,
        }
    }
}

/// Lenient numeric coercion: anything that does not parse to a finite number
/// is treated as missing.
pub fn parse_numeric(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
