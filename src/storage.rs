use std::fs;
use std::path::Path;
use crate::errors::StorageError;
use crate::models::snapshot::Snapshot;

/// Saves a downloaded document as-is so it can be inspected when parsing goes wrong
///
/// # Arguments
///
/// * 'path' - file to write, any missing parent directory is created
/// * 'content' - the raw document
pub fn save_raw(path: &str, content: &str) -> Result<(), StorageError> {
    create_parent(path)?;
    fs::write(path, content)?;

    Ok(())
}

/// Saves the snapshot, replacing whatever snapshot was there before
///
/// # Arguments
///
/// * 'path' - the snapshot file
/// * 'snapshot' - snapshot to save
pub fn save_snapshot(path: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;

    Ok(())
}

/// Loads a snapshot. Deserialization only checks the document structure, callers that
/// render the snapshot should also validate it.
///
/// # Arguments
///
/// * 'path' - the snapshot file
pub fn load_snapshot(path: &str) -> Result<Snapshot, StorageError> {
    let json = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&json)?;

    Ok(snapshot)
}

fn create_parent(path: &str) -> Result<(), StorageError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
