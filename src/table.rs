use std::collections::BTreeSet;
use std::io::Write;

use serde::Serialize;

use crate::age::calendar_label;
use crate::aggregate::GroupAggregate;
use crate::domain::HaplogroupCode;
use crate::percent::PercentageCalculator;

pub const METADATA_COLUMNS: [&str; 5] = ["Ancient pop name", "Country", "Age", "Lat", "Long"];
pub const TOTAL_COLUMN: &str = "Total";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub population: String,
    pub region: String,
    pub age_label: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Percentages aligned with [`FrequencyTable::columns`]; `None` is a blank
    /// cell.
    pub cells: Vec<Option<f64>>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    pub columns: Vec<HaplogroupCode>,
    pub rows: Vec<FrequencyRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub zero_divisions: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TableAssembler {
    reference_epoch: i64,
    calculator: PercentageCalculator,
}

impl TableAssembler {
    pub fn new(reference_epoch: i64) -> Self {
        Self {
            reference_epoch,
            calculator: PercentageCalculator,
        }
    }

    pub fn assemble(&self, aggregates: &[GroupAggregate]) -> (FrequencyTable, AssemblyStats) {
        let columns = discover_columns(aggregates);
        let mut stats = AssemblyStats::default();

        let rows = aggregates
            .iter()
            .map(|group| {
                let percentages = self.calculator.compute(group);
                stats.zero_divisions += percentages.zero_divisions;

                let cells = columns
                    .iter()
                    .map(|code| {
                        if code.is_subclade() {
                            percentages
                                .subclade
                                .as_ref()
                                .map(|values| values.get(code).copied().unwrap_or(0.0))
                        } else {
                            Some(percentages.basal.get(code).copied().unwrap_or(0.0))
                        }
                    })
                    .collect();

                let age_label = group
                    .coordinates
                    .age_bp
                    .map(|age| calendar_label(self.reference_epoch, age))
                    .unwrap_or_default();

                FrequencyRow {
                    population: group.key.population().to_string(),
                    region: group.key.region().to_string(),
                    age_label,
                    latitude: group.coordinates.latitude,
                    longitude: group.coordinates.longitude,
                    cells,
                    total: group.raw_total,
                }
            })
            .collect();

        (FrequencyTable { columns, rows }, stats)
    }
}

/// Every basal and subclade code observed anywhere in the table, in output
/// order.
fn discover_columns(aggregates: &[GroupAggregate]) -> Vec<HaplogroupCode> {
    let mut columns = BTreeSet::new();
    for group in aggregates {
        columns.extend(group.basal_counts.keys().copied());
        if let Some(subclades) = &group.subclade_counts {
            columns.extend(subclades.keys().copied());
        }
    }
    columns.into_iter().collect()
}

impl FrequencyTable {
    pub fn header(&self) -> Vec<String> {
        METADATA_COLUMNS
            .iter()
            .map(|name| name.to_string())
            .chain(self.columns.iter().map(|code| code.to_string()))
            .chain(std::iter::once(TOTAL_COLUMN.to_string()))
            .collect()
    }

    pub fn record(&self, row: &FrequencyRow) -> Vec<String> {
        let mut record = vec![
            row.population.clone(),
            row.region.clone(),
            row.age_label.clone(),
            format_coordinate(row.latitude),
            format_coordinate(row.longitude),
        ];
        record.extend(row.cells.iter().map(|cell| format_percentage(*cell)));
        record.push(row.total.to_string());
        record
    }

    pub fn write<W: Write>(&self, writer: W, delimiter: u8) -> Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        writer.write_record(self.header())?;
        for row in &self.rows {
            writer.write_record(self.record(row))?;
        }
        writer.flush()?;
        Ok(())
    }
}

pub fn format_percentage(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}%"))
        .unwrap_or_default()
}

fn format_coordinate(value: Option<f64>) -> String {
    value.map(|value| format!("{value:?}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::coords::CoordinateMeans;
    use crate::domain::{AgeBin, GroupKey};

    fn aggregate(region: &str, basal: &[(char, u64)], subclade: &[(char, char, u64)]) -> GroupAggregate {
        let basal_counts = basal
            .iter()
            .map(|&(letter, count)| (HaplogroupCode::basal(letter), count))
            .collect::<BTreeMap<_, _>>();
        let subclade_counts = (!subclade.is_empty()).then(|| {
            subclade
                .iter()
                .map(|&(letter, digit, count)| (HaplogroupCode::subclade(letter, digit), count))
                .collect()
        });
        GroupAggregate {
            key: GroupKey::new(
                region.to_string(),
                AgeBin {
                    lower: 0,
                    width: 1000,
                },
            ),
            raw_total: basal_counts.values().sum(),
            basal_counts,
            subclade_counts,
            coordinates: CoordinateMeans {
                latitude: Some(41.5),
                longitude: Some(2.0),
                age_bp: Some(500.0),
            },
        }
    }

    #[test]
    fn columns_nest_subclades_under_their_basal() {
        let groups = vec![
            aggregate("X", &[('B', 1), ('A', 1)], &[('B', '2', 1)]),
            aggregate("Y", &[('A', 2)], &[('A', '1', 1)]),
        ];
        let (table, _) = TableAssembler::new(1950).assemble(&groups);
        assert_eq!(
            table.header(),
            vec![
                "Ancient pop name",
                "Country",
                "Age",
                "Lat",
                "Long",
                "A",
                "A1",
                "B",
                "B2",
                "Total"
            ]
        );
    }

    #[test]
    fn blank_and_zero_cells() {
        let groups = vec![
            aggregate("X", &[('A', 1), ('B', 1)], &[('B', '2', 1)]),
            aggregate("Y", &[('A', 2)], &[]),
        ];
        let (table, _) = TableAssembler::new(1950).assemble(&groups);

        let x = table.record(&table.rows[0]);
        assert_eq!(x[2], "1450 CE");
        assert_eq!(x[3], "41.5");
        assert_eq!(x[4], "2.0");
        assert_eq!(x[5..], ["50.00%", "50.00%", "100.00%", "2"]);

        let y = table.record(&table.rows[1]);
        assert_eq!(y[5..], ["100.00%", "0.00%", "", "2"]);
    }

    #[test]
    fn written_table_is_tab_separated() {
        let groups = vec![aggregate("X", &[('A', 1)], &[])];
        let (table, _) = TableAssembler::new(1950).assemble(&groups);
        let mut buffer = Vec::new();
        table.write(&mut buffer, b'\t').unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "Ancient pop name\tCountry\tAge\tLat\tLong\tA\tTotal\nX 0-1000 BP\tX\t1450 CE\t41.5\t2.0\t100.00%\t1\n"
        );
    }
}
