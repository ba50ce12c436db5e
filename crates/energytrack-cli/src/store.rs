//! The consumption data file: a JSON array of daily records.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use energytrack_core::{load_records, records_to_json, DailyRecord};

/// `--data`, then `ENERGYTRACK_DATA`, then `<data_dir>/energytrack/consumption.json`.
pub fn resolve_data_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var("ENERGYTRACK_DATA") {
        if !env_path.trim().is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
    Ok(data_dir.join("energytrack").join("consumption.json"))
}

/// A missing file is an empty history.
pub fn load(path: &Path) -> Result<Vec<DailyRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    load_records(&content).with_context(|| format!("Failed to parse data file {}", path.display()))
}

pub fn save(path: &Path, records: &[DailyRecord]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    let json = records_to_json(records)?;
    let temp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json.as_bytes())?;
        writer.flush()?;
    }

    if fs::rename(&temp_path, path).is_err() {
        fs::copy(&temp_path, path)
            .with_context(|| format!("Failed to write data file {}", path.display()))?;
        let _ = fs::remove_file(&temp_path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("none.json")).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("consumption.json");
        let mut record = DailyRecord::new("2025-01-01");
        record.total_caffeine = 160.0;
        save(&path, &[record.clone()]).unwrap();

        assert_eq!(load(&path).unwrap(), vec![record]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"date\": 1}").unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse data file"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_data_path(Some(Path::new("/tmp/x.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.json"));
    }
}
