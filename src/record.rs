use crate::{error::ExtractError, schema::FieldSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Fields extracted from one receipt, in the order the model returned them.
/// Partial records are kept as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptRecord(Map<String, Value>);

impl ReceiptRecord {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Required fields the model left out.
    pub fn missing_required(&self, schema: &FieldSchema) -> Vec<&'static str> {
        schema
            .required
            .iter()
            .copied()
            .filter(|name| !self.0.contains_key(*name))
            .collect()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// `<basename without extension>.json` under `out_dir`. Only the file name of
/// `image` matters; its directory is ignored.
pub fn output_path(image: &Path, out_dir: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("{stem}.json"))
}

/// Writes the record as 2-space indented UTF-8 JSON, replacing any existing file.
pub fn write_record(
    record: &ReceiptRecord,
    image: &Path,
    out_dir: &Path,
) -> Result<PathBuf, ExtractError> {
    let path = output_path(image, out_dir);
    std::fs::write(&path, record.to_pretty_json()).map_err(|e| ExtractError::io(&path, e))?;
    Ok(path)
}
