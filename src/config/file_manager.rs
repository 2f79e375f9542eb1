//! 配置文件读写工具

use crate::error::{ProcError, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Atomic file write
pub fn write_json_atomic<P: AsRef<Path>, T: serde::Serialize>(path: P, data: &T) -> Result<()> {
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(&temp_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, data)?;

    fs::rename(&temp_path, path)?;
    tracing::debug!("write_json_atomic: wrote {:?}", path);

    Ok(())
}

/// Read JSON file
pub fn read_json<P: AsRef<Path>, T: serde::de::DeserializeOwned>(path: P) -> Result<T> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ProcError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let data = serde_json::from_reader(reader)?;

    Ok(data)
}
