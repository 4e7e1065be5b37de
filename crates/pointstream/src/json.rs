//! JSON archive documents.
//!
//! Objects are groups; a dataset is either a flat row-major number array,
//! an array of per-point rows, or `{ "columns": [[x...], [y...], ...] }`:
//!
//! ```json
//! { "frames": { "frame1": [0.0, 1.0, 2.0, 255, 128, 0] } }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::archive::{Container, Dataset, Entry, Layout, PROPERTIES};
use crate::error::{Error, Result};

/// Wire shapes accepted for a dataset.
#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetRepr {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
    Columns { columns: Vec<Vec<f64>> },
}

impl TryFrom<DatasetRepr> for Dataset {
    type Error = Error;

    fn try_from(repr: DatasetRepr) -> Result<Self> {
        match repr {
            DatasetRepr::Flat(values) => Ok(Self {
                values,
                layout: Layout::RowMajor,
            }),
            DatasetRepr::Rows(rows) => {
                if let Some(row) = rows.iter().find(|row| row.len() != PROPERTIES) {
                    return Err(Error::InvalidArchive(format!(
                        "row has {} values, expected {PROPERTIES}",
                        row.len()
                    )));
                }
                Ok(Self {
                    values: rows.into_iter().flatten().collect(),
                    layout: Layout::RowMajor,
                })
            }
            DatasetRepr::Columns { columns } => {
                if columns.len() != PROPERTIES {
                    return Err(Error::InvalidArchive(format!(
                        "{} columns, expected {PROPERTIES}",
                        columns.len()
                    )));
                }
                let height = columns[0].len();
                if columns.iter().any(|column| column.len() != height) {
                    return Err(Error::InvalidArchive("columns differ in length".into()));
                }
                Ok(Self {
                    values: columns.into_iter().flatten().collect(),
                    layout: Layout::ColumnMajor,
                })
            }
        }
    }
}

/// True for `{ "columns": [[...], ...] }`, as opposed to a group that
/// happens to hold an entry named `columns`.
fn is_column_dataset(map: &Map<String, Value>) -> bool {
    match map.get("columns") {
        Some(Value::Array(columns)) => columns.iter().all(Value::is_array),
        _ => false,
    }
}

/// A parsed JSON archive.
#[derive(Debug, Clone)]
pub struct JsonContainer {
    root: Map<String, Value>,
}

impl JsonContainer {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice(bytes)? {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(Error::InvalidArchive("top level is not an object".into())),
        }
    }
}

impl Container for JsonContainer {
    fn keys(&self) -> Vec<String> {
        JsonGroup(&self.root).keys()
    }

    fn get(&self, name: &str) -> Option<Entry<'_>> {
        JsonGroup(&self.root).get_entry(name)
    }
}

struct JsonGroup<'a>(&'a Map<String, Value>);

impl<'a> JsonGroup<'a> {
    fn get_entry(&self, name: &str) -> Option<Entry<'a>> {
        let value = self.0.get(name)?;
        match value {
            Value::Object(map) if !is_column_dataset(map) => {
                Some(Entry::Group(Box::new(JsonGroup(map))))
            }
            _ => match DatasetRepr::deserialize(value)
                .map_err(Error::from)
                .and_then(Dataset::try_from)
            {
                Ok(dataset) => Some(Entry::Dataset(dataset)),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable archive entry '{}': {}", name, e);
                    None
                }
            },
        }
    }
}

impl Container for JsonGroup<'_> {
    fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<Entry<'_>> {
        self.get_entry(name)
    }
}
