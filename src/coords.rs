use std::collections::BTreeMap;

use crate::domain::GroupKey;

/// Running arithmetic mean that skips missing values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateMeans {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub age_bp: Option<f64>,
}

#[derive(Debug, Default)]
struct CoordinateSums {
    latitude: Mean,
    longitude: Mean,
    age_bp: Mean,
}

/// Per-group means over the same filtered records the count tables see.
#[derive(Debug, Default)]
pub struct CoordinateAggregator {
    groups: BTreeMap<GroupKey, CoordinateSums>,
}

impl CoordinateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        key: &GroupKey,
        latitude: Option<f64>,
        longitude: Option<f64>,
        age_bp: Option<f64>,
    ) {
        let sums = self.groups.entry(key.clone()).or_default();
        sums.latitude.push(latitude);
        sums.longitude.push(longitude);
        sums.age_bp.push(age_bp);
    }

    pub fn finish(self) -> BTreeMap<GroupKey, CoordinateMeans> {
        self.groups
            .into_iter()
            .map(|(key, sums)| {
                let means = CoordinateMeans {
                    latitude: sums.latitude.value(),
                    longitude: sums.longitude.value(),
                    age_bp: sums.age_bp.value(),
                };
                (key, means)
            })
            .collect()
    }
}
