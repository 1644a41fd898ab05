use crate::domain::AgeBin;
use crate::error::HaploError;

pub const DEFAULT_BIN_WIDTH: u32 = 1000;
/// Calendar year that "before present" counts back from.
pub const DEFAULT_REFERENCE_EPOCH: i64 = 1950;

#[derive(Debug, Clone, Copy)]
pub struct AgeBinner {
    width: i64,
}

impl Default for AgeBinner {
    fn default() -> Self {
        Self {
            width: i64::from(DEFAULT_BIN_WIDTH),
        }
    }
}

impl AgeBinner {
    pub fn new(width: u32) -> Result<Self, HaploError> {
        if width == 0 {
            return Err(HaploError::InvalidConfig(
                "age bin width must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            width: i64::from(width),
        })
    }

    /// Returns `None` for an undefined age, and for one whose bin bounds do
    /// not fit in an `i64`, so the record never falls into a default bin.
    pub fn bin(&self, age_bp: Option<f64>) -> Option<AgeBin> {
        let age = age_bp.filter(|age| age.is_finite())?;
        let lower = ((age / self.width as f64).floor() as i64).checked_mul(self.width)?;
        lower.checked_add(self.width)?;
        Some(AgeBin {
            lower,
            width: self.width,
        })
    }
}

/// Formats a mean BP age as a calendar year relative to `reference_epoch`,
/// e.g. `550 BCE` for a mean age of 2500 against 1950.
pub fn calendar_label(reference_epoch: i64, mean_age_bp: f64) -> String {
    let year = (reference_epoch as f64 - mean_age_bp).round_ties_even() as i64;
    match year {
        y if y > 0 => format!("{y} CE"),
        y if y < 0 => format!("{} BCE", y.unsigned_abs()),
        _ => "0 CE".to_string(),
    }
}
