//! TOML-backed persistent field store.
//!
//! One small file holds the three counters. Writes go through a temp file
//! and an atomic rename so a power cut mid-write leaves the previous state
//! intact. An unparsable file is logged and treated as empty rather than
//! wedging startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use loadtrack_traits::{BoxError, Store, StoreField, StoreValue};

use crate::error::HwError;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Fields {
    #[serde(skip_serializing_if = "Option::is_none")]
    load_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale_factor: Option<f32>,
}

pub struct FileStore {
    path: PathBuf,
    fields: Fields,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file does not
    /// exist. I/O errors propagate; parse errors do not (the file is assumed
    /// corrupt and the store starts empty).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HwError> {
        let path = path.as_ref().to_path_buf();
        let fields = match fs::read_to_string(&path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file unparsable, starting empty");
                    Fields::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Fields::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(FileStore { path, fields })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), HwError> {
        let text =
            toml::to_string_pretty(&self.fields).map_err(|e| HwError::Serialize(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn read(&mut self, field: StoreField) -> Result<Option<StoreValue>, BoxError> {
        Ok(match field {
            StoreField::LoadCount => self.fields.load_count.map(StoreValue::Count),
            StoreField::TotalWeight => self.fields.total_weight.map(StoreValue::Real),
            StoreField::ScaleFactor => self.fields.scale_factor.map(StoreValue::Real),
        })
    }

    fn write(&mut self, field: StoreField, value: StoreValue) -> Result<(), BoxError> {
        match (field, value) {
            (StoreField::LoadCount, StoreValue::Count(n)) => self.fields.load_count = Some(n),
            (StoreField::TotalWeight, StoreValue::Real(v)) => self.fields.total_weight = Some(v),
            (StoreField::ScaleFactor, StoreValue::Real(v)) => self.fields.scale_factor = Some(v),
            (StoreField::LoadCount, _) => return Err(HwError::FieldType("load_count").into()),
            (StoreField::TotalWeight, _) => return Err(HwError::FieldType("total_weight").into()),
            (StoreField::ScaleFactor, _) => return Err(HwError::FieldType("scale_factor").into()),
        }
        self.flush()?;
        Ok(())
    }
}
