use std::collections::BTreeMap;

use crate::aggregate::GroupAggregate;
use crate::domain::HaplogroupCode;

pub type CodePercentages = BTreeMap<HaplogroupCode, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupPercentages {
    /// Share of the group total carrying each basal letter.
    pub basal: CodePercentages,
    /// Share of the parent basal carriers in the same group carrying each
    /// subclade. `None` when the group has no subclade calls at all.
    pub subclade: Option<CodePercentages>,
    /// Denominators that were zero and resolved to 0%.
    pub zero_divisions: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PercentageCalculator;

impl PercentageCalculator {
    pub fn compute(&self, group: &GroupAggregate) -> GroupPercentages {
        let mut zero_divisions = 0;

        let basal = group
            .basal_counts
            .iter()
            .map(|(&code, &count)| {
                let (value, zero) = percentage(count, group.raw_total);
                zero_divisions += usize::from(zero);
                (code, value)
            })
            .collect();

        let subclade = group.subclade_counts.as_ref().map(|counts| {
            counts
                .iter()
                .map(|(&code, &count)| {
                    let parent = group
                        .basal_counts
                        .get(&code.parent())
                        .copied()
                        .unwrap_or(0);
                    let (value, zero) = percentage(count, parent);
                    zero_divisions += usize::from(zero);
                    (code, value)
                })
                .collect()
        });

        GroupPercentages {
            basal,
            subclade,
            zero_divisions,
        }
    }
}

fn percentage(count: u64, denominator: u64) -> (f64, bool) {
    if denominator == 0 {
        return (0.0, true);
    }
    (count as f64 / denominator as f64 * 100.0, false)
}
