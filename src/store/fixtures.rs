//! Serialized-row fixture loading.
//!
//! Fixtures are JSON arrays of `{"model": "catalog.<name>", "pk": N,
//! "fields": {...}}` records. Records are applied in file order with
//! replace-on-conflict semantics, so reloading a fixture is idempotent.
//! Foreign keys are raw pks and must refer to rows loaded earlier (or
//! already present in the catalog).

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{CatalogStore, StoreError};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture {label}: {source}")]
    Parse {
        label: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{label}, record {index} ({model} pk {pk}): bad fields: {source}")]
    Fields {
        label: String,
        index: usize,
        model: String,
        pk: i64,
        #[source]
        source: serde_json::Error,
    },

    #[error("{label}, record {index}: unknown model {model:?}")]
    UnknownModel {
        label: String,
        index: usize,
        model: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct FixtureRecord {
    model: String,
    pk: i64,
    fields: Value,
}

#[derive(Debug, Deserialize)]
struct ProjectFields {
    name: String,
}

#[derive(Debug, Deserialize)]
struct VersionFields {
    project: i64,
    version_number: String,
    sortable_version_number: String,
}

#[derive(Debug, Deserialize)]
struct ModuleFields {
    project_version: i64,
    name: String,
    #[serde(default)]
    docstring: String,
    #[serde(default)]
    filename: String,
}

#[derive(Debug, Deserialize)]
struct KlassFields {
    module: i64,
    name: String,
    #[serde(default)]
    docstring: String,
    #[serde(default)]
    line_number: i64,
}

#[derive(Debug, Deserialize)]
struct InheritanceFields {
    parent: i64,
    child: i64,
    position: i64,
}

#[derive(Debug, Deserialize)]
struct AttributeFields {
    klass: i64,
    name: String,
    value: String,
    #[serde(default)]
    line_number: i64,
}

#[derive(Debug, Deserialize)]
struct MethodFields {
    klass: i64,
    name: String,
    #[serde(default)]
    docstring: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    line_number: i64,
}

/// Load one fixture file. Returns the number of records installed.
pub fn load_fixture_file(store: &CatalogStore, path: &Path) -> Result<usize, FixtureError> {
    let source = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_fixture_str(store, &source, &path.display().to_string())
}

/// Load fixture records from a JSON string. `label` names the source in errors.
pub fn load_fixture_str(
    store: &CatalogStore,
    source: &str,
    label: &str,
) -> Result<usize, FixtureError> {
    let records: Vec<FixtureRecord> =
        serde_json::from_str(source).map_err(|source| FixtureError::Parse {
            label: label.to_string(),
            source,
        })?;

    for (index, record) in records.iter().enumerate() {
        apply_record(store, record).map_err(|error| match error {
            RecordError::Fields(source) => FixtureError::Fields {
                label: label.to_string(),
                index,
                model: record.model.clone(),
                pk: record.pk,
                source,
            },
            RecordError::UnknownModel => FixtureError::UnknownModel {
                label: label.to_string(),
                index,
                model: record.model.clone(),
            },
            RecordError::Store(e) => FixtureError::Store(e),
        })?;
    }
    Ok(records.len())
}

enum RecordError {
    Fields(serde_json::Error),
    UnknownModel,
    Store(StoreError),
}

impl From<StoreError> for RecordError {
    fn from(error: StoreError) -> Self {
        RecordError::Store(error)
    }
}

fn apply_record(store: &CatalogStore, record: &FixtureRecord) -> Result<(), RecordError> {
    fn fields<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, RecordError> {
        serde_json::from_value(value.clone()).map_err(RecordError::Fields)
    }

    match record.model.as_str() {
        "catalog.project" => {
            let f: ProjectFields = fields(&record.fields)?;
            store.upsert_project(record.pk, &f.name)?;
        }
        "catalog.projectversion" => {
            let f: VersionFields = fields(&record.fields)?;
            store.upsert_version(
                record.pk,
                f.project,
                &f.version_number,
                &f.sortable_version_number,
            )?;
        }
        "catalog.module" => {
            let f: ModuleFields = fields(&record.fields)?;
            store.upsert_module(record.pk, f.project_version, &f.name, &f.docstring, &f.filename)?;
        }
        "catalog.klass" => {
            let f: KlassFields = fields(&record.fields)?;
            store.upsert_klass(record.pk, f.module, &f.name, &f.docstring, f.line_number)?;
        }
        "catalog.inheritance" => {
            let f: InheritanceFields = fields(&record.fields)?;
            store.upsert_inheritance(record.pk, f.parent, f.child, f.position)?;
        }
        "catalog.klassattribute" => {
            let f: AttributeFields = fields(&record.fields)?;
            store.upsert_attribute(record.pk, f.klass, &f.name, &f.value, f.line_number)?;
        }
        "catalog.klassmethod" => {
            let f: MethodFields = fields(&record.fields)?;
            store.upsert_method(
                record.pk,
                f.klass,
                &f.name,
                &f.docstring,
                &f.code,
                f.line_number,
            )?;
        }
        _ => return Err(RecordError::UnknownModel),
    }
    Ok(())
}
