use serde::Serialize;
use tracing::{debug, info, warn};

use crate::age::AgeBinner;
use crate::aggregate::{Aggregator, GroupAggregate};
use crate::classify::HaplogroupClassifier;
use crate::config::ResolvedConfig;
use crate::coords::CoordinateAggregator;
use crate::domain::HaplogroupKind;
use crate::error::HaploError;
use crate::group::GroupKeyBuilder;
use crate::records::SampleTable;
use crate::table::{FrequencyTable, TableAssembler};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub records: usize,
    /// Rows dropped because their age is missing or non-numeric.
    pub undated: usize,
    /// Dated rows dropped because their haplogroup code is invalid.
    pub excluded: usize,
    pub counted: usize,
    pub groups: usize,
    pub zero_divisions: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: FrequencyTable,
    pub stats: RunStats,
}

#[derive(Debug, Clone)]
pub struct FrequencyPipeline {
    binner: AgeBinner,
    keys: GroupKeyBuilder,
    classifier: HaplogroupClassifier,
    assembler: TableAssembler,
}

impl FrequencyPipeline {
    pub fn new(
        binner: AgeBinner,
        keys: GroupKeyBuilder,
        classifier: HaplogroupClassifier,
        assembler: TableAssembler,
    ) -> Self {
        Self {
            binner,
            keys,
            classifier,
            assembler,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Result<Self, HaploError> {
        Ok(Self::new(
            AgeBinner::new(config.bin_width)?,
            GroupKeyBuilder::new(config.region_policy),
            HaplogroupClassifier::new(config.excluded_tokens.iter().cloned()),
            TableAssembler::new(config.reference_epoch),
        ))
    }

    pub fn run(&self, input: &SampleTable, kind: HaplogroupKind) -> Result<PipelineOutput, HaploError> {
        input.require(kind)?;

        let binned = input
            .records
            .iter()
            .map(|record| (record, self.binner.bin(record.age_bp)))
            .collect::<Vec<_>>();
        if binned.iter().all(|(_, bin)| bin.is_none()) {
            return Err(HaploError::NoValidAge(input.columns.age.clone()));
        }

        let mut stats = RunStats {
            records: input.records.len(),
            ..RunStats::default()
        };
        let mut counts = Aggregator::new(kind);
        let mut coordinates = CoordinateAggregator::new();

        for (record, bin) in binned {
            let Some(bin) = bin else {
                stats.undated += 1;
                continue;
            };
            let Some(haplogroup) = self.classifier.classify(record.haplogroup(kind)) else {
                stats.excluded += 1;
                continue;
            };
            let key = self.keys.build(&record.region, bin);
            counts.push(&key, haplogroup);
            coordinates.push(&key, record.latitude, record.longitude, record.age_bp);
            stats.counted += 1;
        }

        if stats.undated > 0 {
            debug!(kind = %kind, rows = stats.undated, "skipped rows without a usable age");
        }
        if stats.excluded > 0 {
            info!(kind = %kind, rows = stats.excluded, "excluded rows with invalid haplogroup codes");
        }

        let tables = counts.finish()?;
        let aggregates = GroupAggregate::combine(tables, coordinates.finish());
        let (table, assembly) = self.assembler.assemble(&aggregates);

        stats.groups = table.rows.len();
        stats.zero_divisions = assembly.zero_divisions;
        if stats.zero_divisions > 0 {
            warn!(
                kind = %kind,
                count = stats.zero_divisions,
                "zero denominators resolved to 0%; check for empty groups"
            );
        }

        Ok(PipelineOutput { table, stats })
    }
}
