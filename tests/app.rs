use std::fs;
use std::io::Write;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;

use haplofreq::app::{App, TableStatus};
use haplofreq::config::{Config, ConfigLoader, ConfigOverrides};
use haplofreq::domain::HaplogroupKind;
use haplofreq::error::HaploError;
use haplofreq::output::JsonOutput;
use haplofreq::records::ColumnMap;

const HEADER: &str = "Genetic ID\tPolitical Entity\tDate mean in BP in years before 1950 CE [OxCal mu for a direct radiocarbon date, and average of range for a contextual date]\tLat.\tLong.\tY haplogroup (manual curation in ISOGG format)\tmtDNA haplogroup if >2x or published";

fn annotation() -> String {
    [
        HEADER,
        "I0001\tSpain\t3200\t40.0\t-3.0\tR1b\tH1",
        "I0002\tSpain\t3800\t42.0\t-5.0\tR\tH",
        "I0003\tSpain\t3500\t..\t-4.0\tI2\tU5",
        "I0004\tItaly\t2500\t41.0\t12.0\tn/a\tH3",
        "I0005\tItaly\t..\t41.0\t12.0\tJ2\tT2",
    ]
    .join("\n")
        + "\n"
}

fn app_in(root: &Utf8Path) -> App {
    let overrides = ConfigOverrides {
        y_output: Some(root.join("out").join("y.tsv")),
        mt_output: Some(root.join("out").join("mt.tsv")),
        ..ConfigOverrides::default()
    };
    App::new(ConfigLoader::resolve_config(Config::default(), overrides).unwrap()).unwrap()
}

fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

#[test]
fn builds_both_tables() {
    let (_temp, root) = temp_root();
    let input = root.join("annotation.tsv");
    fs::write(input.as_std_path(), annotation()).unwrap();

    let report = app_in(&root)
        .build(&input, &HaplogroupKind::ALL, &JsonOutput)
        .unwrap();
    assert_eq!(report.rows, 5);
    assert_eq!(report.written(), 2);

    let y = fs::read_to_string(root.join("out/y.tsv").as_std_path()).unwrap();
    let lines = y.lines().collect::<Vec<_>>();
    assert_eq!(
        lines[0],
        "Ancient pop name\tCountry\tAge\tLat\tLong\tI\tI2\tR\tR1\tTotal"
    );
    assert_eq!(
        lines[1],
        "Spain 3000-4000 BP\tSpain\t1550 BCE\t41.0\t-4.0\t33.33%\t100.00%\t66.67%\t50.00%\t3"
    );
    assert_eq!(lines.len(), 2);

    let mt = fs::read_to_string(root.join("out/mt.tsv").as_std_path()).unwrap();
    let lines = mt.lines().collect::<Vec<_>>();
    assert_eq!(
        lines[0],
        "Ancient pop name\tCountry\tAge\tLat\tLong\tH\tH1\tH3\tU\tU5\tTotal"
    );
    assert_eq!(
        lines[1],
        "Italy 2000-3000 BP\tItaly\t550 BCE\t41.0\t12.0\t100.00%\t0.00%\t100.00%\t0.00%\t0.00%\t1"
    );
    assert_eq!(
        lines[2],
        "Spain 3000-4000 BP\tSpain\t1550 BCE\t41.0\t-4.0\t66.67%\t50.00%\t0.00%\t33.33%\t100.00%\t3"
    );
}

#[test]
fn one_kind_failing_does_not_stop_the_other() {
    let (_temp, root) = temp_root();
    let input = root.join("annotation.tsv");
    let content = "Political Entity\tDate mean in BP in years before 1950 CE [OxCal mu for a direct radiocarbon date, and average of range for a contextual date]\tLat.\tLong.\tmtDNA haplogroup if >2x or published\n\
                   Spain\t3200\t40.0\t-3.0\tH1\n";
    fs::write(input.as_std_path(), content).unwrap();

    let report = app_in(&root)
        .build(&input, &HaplogroupKind::ALL, &JsonOutput)
        .unwrap();
    assert_eq!(report.tables[0].kind, HaplogroupKind::Y);
    assert_eq!(report.tables[0].status, TableStatus::Failed);
    assert_eq!(report.tables[1].status, TableStatus::Written);
    assert!(root.join("out/mt.tsv").as_std_path().exists());
    assert!(!root.join("out/y.tsv").as_std_path().exists());
}

#[test]
fn unwritable_output_fails_only_that_kind() {
    let (_temp, root) = temp_root();
    let input = root.join("annotation.tsv");
    fs::write(input.as_std_path(), annotation()).unwrap();
    fs::write(root.join("blocker").as_std_path(), "").unwrap();

    let overrides = ConfigOverrides {
        y_output: Some(root.join("blocker").join("y.tsv")),
        mt_output: Some(root.join("out").join("mt.tsv")),
        ..ConfigOverrides::default()
    };
    let app = App::new(ConfigLoader::resolve_config(Config::default(), overrides).unwrap()).unwrap();
    let report = app.build(&input, &HaplogroupKind::ALL, &JsonOutput).unwrap();

    assert_eq!(report.tables[0].kind, HaplogroupKind::Y);
    assert_eq!(report.tables[0].status, TableStatus::Failed);
    let message = report.tables[0].error.as_deref().unwrap();
    assert!(message.starts_with("failed to write"), "{message}");
    assert_eq!(report.tables[1].status, TableStatus::Written);
    assert_eq!(report.failed(), 1);
    assert!(root.join("out/mt.tsv").as_std_path().exists());
}

#[test]
fn blank_haplogroup_column_is_skipped() {
    let (_temp, root) = temp_root();
    let input = root.join("annotation.tsv");
    let content = format!("{HEADER}\nI1\tSpain\t3200\t40.0\t-3.0\t\tH1\nI2\tSpain\t3300\t40.0\t-3.0\t\tH\n");
    fs::write(input.as_std_path(), content).unwrap();

    let report = app_in(&root)
        .build(&input, &[HaplogroupKind::Y], &JsonOutput)
        .unwrap();
    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].status, TableStatus::Skipped);
    assert_eq!(report.failed(), 0);
}

#[test]
fn reads_gzip_input() {
    let (_temp, root) = temp_root();
    let input = root.join("annotation.tsv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(annotation().as_bytes()).unwrap();
    fs::write(input.as_std_path(), encoder.finish().unwrap()).unwrap();

    let report = app_in(&root)
        .build(&input, &[HaplogroupKind::Mt], &JsonOutput)
        .unwrap();
    assert_eq!(report.rows, 5);
    assert_eq!(report.written(), 1);
}

#[test]
fn missing_required_column_is_fatal() {
    let (_temp, root) = temp_root();
    let input = root.join("annotation.tsv");
    fs::write(input.as_std_path(), "Political Entity\tLat.\nSpain\t40\n").unwrap();

    let err = app_in(&root)
        .build(&input, &HaplogroupKind::ALL, &JsonOutput)
        .unwrap_err();
    let defaults = ColumnMap::default();
    assert_matches!(err, HaploError::MissingColumns(ref names) if names == &vec![defaults.age.clone(), defaults.longitude.clone()]);
    assert!(err.is_precondition());
}

#[test]
fn missing_input_file() {
    let (_temp, root) = temp_root();
    let err = app_in(&root)
        .build(&root.join("absent.tsv"), &HaplogroupKind::ALL, &JsonOutput)
        .unwrap_err();
    assert_matches!(err, HaploError::InputRead { .. });
}
