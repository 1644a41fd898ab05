use std::collections::BTreeMap;

use crate::coords::CoordinateMeans;
use crate::domain::{ClassifiedHaplogroup, GroupKey, HaplogroupCode, HaplogroupKind};
use crate::error::HaploError;

pub type CodeCounts = BTreeMap<HaplogroupCode, u64>;

/// Raw occurrence counts for one haplogroup kind, kept as two separate maps
/// so basal and subclade denominators can never be mixed up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountTables {
    pub basal: BTreeMap<GroupKey, CodeCounts>,
    pub subclade: BTreeMap<GroupKey, CodeCounts>,
}

impl CountTables {
    /// Sum of basal counts only; subclade carriers are already inside their
    /// parent's count.
    pub fn raw_total(&self, key: &GroupKey) -> u64 {
        self.basal
            .get(key)
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct Aggregator {
    kind: HaplogroupKind,
    tables: CountTables,
}

impl Aggregator {
    pub fn new(kind: HaplogroupKind) -> Self {
        Self {
            kind,
            tables: CountTables::default(),
        }
    }

    pub fn push(&mut self, key: &GroupKey, haplogroup: ClassifiedHaplogroup) {
        *self
            .tables
            .basal
            .entry(key.clone())
            .or_default()
            .entry(haplogroup.basal)
            .or_insert(0) += 1;
        if let Some(subclade) = haplogroup.subclade {
            *self
                .tables
                .subclade
                .entry(key.clone())
                .or_default()
                .entry(subclade)
                .or_insert(0) += 1;
        }
    }

    pub fn finish(self) -> Result<CountTables, HaploError> {
        if self.tables.basal.is_empty() {
            return Err(HaploError::NoHaplogroupData(self.kind));
        }
        Ok(self.tables)
    }
}

/// Everything known about one population group once all records are in.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub key: GroupKey,
    pub basal_counts: CodeCounts,
    pub subclade_counts: Option<CodeCounts>,
    pub raw_total: u64,
    pub coordinates: CoordinateMeans,
}

impl GroupAggregate {
    /// Left-joins count tables and coordinate means on the basal table.
    pub fn combine(
        tables: CountTables,
        mut coordinates: BTreeMap<GroupKey, CoordinateMeans>,
    ) -> Vec<GroupAggregate> {
        let CountTables {
            basal,
            mut subclade,
        } = tables;
        basal
            .into_iter()
            .map(|(key, basal_counts)| {
                let raw_total = basal_counts.values().sum();
                let subclade_counts = subclade.remove(&key);
                let coordinates = coordinates.remove(&key).unwrap_or_default();
                GroupAggregate {
                    key,
                    basal_counts,
                    subclade_counts,
                    raw_total,
                    coordinates,
                }
            })
            .collect()
    }
}
