//! Pull-based feeds for element tables and labeled validation outcomes.

mod normalizer;
mod parser;

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub(crate) use normalizer::header_key;

/// Scale label for required proficiency rows.
pub const LEVEL_SCALE: &str = "Level";
/// Scale label for criticality rows.
pub const IMPORTANCE_SCALE: &str = "Importance";

/// One row of an element table: (occupation, element, scale, value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRow {
    pub title: String,
    pub element_name: String,
    pub scale_name: String,
    pub data_value: f64,
}

impl ElementRow {
    pub fn new(
        title: impl Into<String>,
        element_name: impl Into<String>,
        scale_name: impl Into<String>,
        data_value: f64,
    ) -> Self {
        Self {
            title: title.into(),
            element_name: element_name.into(),
            scale_name: scale_name.into(),
            data_value,
        }
    }
}

/// Raw validation row: lowercase column name to non-empty cell text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    fields: BTreeMap<String, String>,
}

impl ValidationRecord {
    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(key, value)| (header_key(&key), value))
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        Self { fields }
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.fields.insert(header_key(column), value);
        }
        self
    }

    /// First populated column among the aliases, in alias order.
    pub fn first_of(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .find_map(|alias| self.fields.get(&header_key(alias)))
            .map(String::as_str)
    }
}

/// Raised when a feed cannot produce data; never degraded to an empty result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("dataset '{dataset}' unavailable: {reason}")]
pub struct DataUnavailable {
    pub dataset: String,
    pub reason: String,
}

impl DataUnavailable {
    pub fn new(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }
}

/// Synchronous provider of element tables and validation datasets.
pub trait DataSource: Send + Sync {
    fn element_rows(&self, dataset: &str) -> Result<Vec<ElementRow>, DataUnavailable>;
    fn validation_rows(&self, dataset: &str) -> Result<Vec<ValidationRecord>, DataUnavailable>;
}

/// Reads `<dir>/<dataset>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{dataset}.csv"))
    }

    fn open(&self, dataset: &str) -> Result<std::fs::File, DataUnavailable> {
        let path = self.path_for(dataset);
        std::fs::File::open(&path).map_err(|err| {
            DataUnavailable::new(dataset, format!("failed to open {}: {err}", path.display()))
        })
    }
}

impl DataSource for CsvDirectorySource {
    fn element_rows(&self, dataset: &str) -> Result<Vec<ElementRow>, DataUnavailable> {
        let file = self.open(dataset)?;
        element_rows_from_reader(dataset, file)
    }

    fn validation_rows(&self, dataset: &str) -> Result<Vec<ValidationRecord>, DataUnavailable> {
        let file = self.open(dataset)?;
        validation_rows_from_reader(dataset, file)
    }
}

/// Parses an element table from any reader, labelling failures with `dataset`.
pub fn element_rows_from_reader<R: Read>(
    dataset: &str,
    reader: R,
) -> Result<Vec<ElementRow>, DataUnavailable> {
    parser::parse_element_rows(reader)
        .map_err(|err| DataUnavailable::new(dataset, format!("invalid element CSV data: {err}")))
}

pub fn validation_rows_from_reader<R: Read>(
    dataset: &str,
    reader: R,
) -> Result<Vec<ValidationRecord>, DataUnavailable> {
    parser::parse_validation_records(reader).map_err(|err| {
        DataUnavailable::new(dataset, format!("invalid validation CSV data: {err}"))
    })
}

/// Fixed datasets held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    elements: HashMap<String, Vec<ElementRow>>,
    validation: HashMap<String, Vec<ValidationRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements(mut self, dataset: &str, rows: Vec<ElementRow>) -> Self {
        self.elements.insert(dataset.to_string(), rows);
        self
    }

    pub fn with_validation(mut self, dataset: &str, rows: Vec<ValidationRecord>) -> Self {
        self.validation.insert(dataset.to_string(), rows);
        self
    }
}

impl DataSource for InMemorySource {
    fn element_rows(&self, dataset: &str) -> Result<Vec<ElementRow>, DataUnavailable> {
        self.elements
            .get(dataset)
            .cloned()
            .ok_or_else(|| DataUnavailable::new(dataset, "dataset not registered"))
    }

    fn validation_rows(&self, dataset: &str) -> Result<Vec<ValidationRecord>, DataUnavailable> {
        self.validation
            .get(dataset)
            .cloned()
            .ok_or_else(|| DataUnavailable::new(dataset, "dataset not registered"))
    }
}
