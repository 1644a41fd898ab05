use std::fs;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use serde::Serialize;
use tempfile::Builder;

use crate::error::HaploError;
use crate::table::FrequencyTable;

/// Writes the table next to `path` under a temporary name, then moves it into
/// place so readers never observe a partial file.
pub fn write_table_atomic(
    path: &Utf8Path,
    table: &FrequencyTable,
    delimiter: u8,
) -> Result<(), HaploError> {
    let write_error = |message: String| HaploError::OutputWrite {
        path: path.as_std_path().to_path_buf(),
        message,
    };

    let parent = ensure_parent(path).map_err(write_error)?;
    let mut temp = Builder::new()
        .prefix(".haplofreq")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| write_error(err.to_string()))?;
    table
        .write(BufWriter::new(temp.as_file_mut()), delimiter)
        .map_err(|err| write_error(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| write_error(err.to_string()))?;
    Ok(())
}

pub fn write_json_atomic<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), HaploError> {
    let fs_error = |err: String| HaploError::Filesystem(format!("{path}: {err}"));

    let parent = ensure_parent(path).map_err(fs_error)?;
    let mut temp = Builder::new()
        .prefix(".haplofreq")
        .suffix(".json")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| fs_error(err.to_string()))?;
    let mut writer = BufWriter::new(temp.as_file_mut());
    serde_json::to_writer_pretty(&mut writer, value).map_err(|err| fs_error(err.to_string()))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|err| fs_error(err.to_string()))?;
    drop(writer);
    temp.persist(path.as_std_path())
        .map_err(|err| fs_error(err.to_string()))?;
    Ok(())
}

fn ensure_parent(path: &Utf8Path) -> Result<&Utf8Path, String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path()).map_err(|err| err.to_string())?;
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn creates_missing_directories() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let path = root.join("nested").join("out.tsv");
        let table = FrequencyTable {
            columns: Vec::new(),
            rows: Vec::new(),
        };

        write_table_atomic(&path, &table, b'\t').unwrap();
        let content = fs::read_to_string(path.as_std_path()).unwrap();
        assert_eq!(content, "Ancient pop name\tCountry\tAge\tLat\tLong\tTotal\n");

        let leftovers = fs::read_dir(root.join("nested").as_std_path())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn json_replaces_existing_file_without_leftovers() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let path = root.join("settings.json");
        fs::write(path.as_std_path(), "stale").unwrap();

        write_json_atomic(&path, &serde_json::json!({ "bin_width": 500 })).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path.as_std_path()).unwrap()).unwrap();
        assert_eq!(value["bin_width"], 500);

        let names = fs::read_dir(root.as_std_path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["settings.json"]);
    }

    #[test]
    fn json_write_fails_when_parent_is_a_file() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::write(root.join("blocker").as_std_path(), "").unwrap();

        let err = write_json_atomic(&root.join("blocker/settings.json"), &1).unwrap_err();
        assert!(matches!(err, HaploError::Filesystem(_)));
    }
}
