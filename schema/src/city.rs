//! Per-city operations on disk: building a city's artifacts from its field
//! records, and generating its coverage document.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::builder::{PathTree, PathTreeBuilder};
use crate::config::{CityPaths, Settings};
use crate::coverage::{compare, CoverageStats};
use crate::error::{Error, Result};
use crate::model::{FieldRecord, PathPartition, SchemaDocument};
use crate::reference::{ReferencePathSet, ReferenceStandard, MUNICIPAL, NACIONAL};
use crate::writer::{read_json, read_required, write_json};

/// Output of [`generate_city_doc`].
#[derive(Debug, Clone, PartialEq)]
pub struct CityDoc {
    /// Nested coverage document.
    pub document: Value,
    /// Aggregate counters.
    pub stats: CoverageStats,
    /// Where the document was written.
    pub output: PathBuf,
}

/// Output of [`build_city_artifacts`].
#[derive(Debug, Clone, PartialEq)]
pub struct CityArtifacts {
    /// The built schema, sample and partition.
    pub tree: PathTree,
    /// Where they were written.
    pub paths: CityPaths,
    /// Records skipped because they could not be read as field records.
    pub skipped: usize,
}

/// Reads a JSON array of field records.
///
/// Entries without a string `path` are skipped with a warning; the count is
/// returned alongside. Malformed metadata on other entries falls back to
/// defaults.
///
/// # Errors
///
/// Returns an error if the file is missing, is not JSON, or is not an array.
pub fn load_field_records(path: &Path) -> Result<(Vec<FieldRecord>, usize)> {
    let entries: Vec<Value> = read_required("field records", path)?;
    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<FieldRecord>(entry) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable field record");
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

/// Builds `slug`'s schema, sample and partition from its field records and
/// writes them next to the records.
///
/// # Errors
///
/// Returns an error if the records cannot be read, a record has an empty
/// path or segment, or an artifact cannot be written.
pub fn build_city_artifacts(
    slug: &str,
    settings: &Settings,
    title: Option<&str>,
) -> Result<CityArtifacts> {
    let paths = settings.city(slug);
    let (records, skipped) = load_field_records(&paths.fields)?;

    let mut builder = PathTreeBuilder::new();
    if let Some(title) = title {
        builder = builder.with_title(title);
    }
    for record in &records {
        builder.insert(record)?;
    }
    let tree = builder.finish();

    write_json(&paths.schema, &tree.schema)?;
    write_json(&paths.sample, &tree.sample)?;
    write_json(&paths.partition, &tree.partition)?;

    info!(
        city = slug,
        fields = records.len(),
        skipped,
        required = tree.partition.required.len(),
        ignored = tree.partition.ignored.len(),
        optional = tree.partition.optional.len(),
        "city artifacts built"
    );

    Ok(CityArtifacts {
        tree,
        paths,
        skipped,
    })
}

/// Loads a reference document and flattens `standard`'s request schema.
///
/// Never fails: a missing or unparsable file, or a document without the
/// expected request schema, yields an empty set.
#[must_use]
pub fn load_reference_paths(path: &Path, standard: &ReferenceStandard) -> ReferencePathSet {
    match read_json::<Value>(path) {
        Ok(document) => standard.extract_paths(&document),
        Err(e) => {
            warn!(standard = standard.name, error = %e, "reference document unavailable");
            ReferencePathSet::default()
        }
    }
}

/// Generates `slug`'s coverage document and writes it to `doc.json` in the
/// city directory.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] if the city schema or partition is absent,
/// [`Error::MalformedSchema`] if the schema root has no properties, and I/O
/// or JSON errors from reading the inputs or writing the output.
pub fn generate_city_doc(slug: &str, settings: &Settings) -> Result<CityDoc> {
    let paths = settings.city(slug);

    for (resource, path) in [("schema", &paths.schema), ("docs", &paths.partition)] {
        if !path.exists() {
            return Err(Error::MissingInput {
                resource,
                path: path.clone(),
            });
        }
    }

    let schema: SchemaDocument = read_json(&paths.schema)?;
    let partition: PathPartition = read_json(&paths.partition)?;
    if !schema.root.is_object() {
        return Err(Error::MalformedSchema);
    }

    let municipal = load_reference_paths(&settings.municipal_reference_path(), &MUNICIPAL);
    let national = load_reference_paths(&settings.national_reference_path(), &NACIONAL);
    info!(
        city = slug,
        municipal = municipal.len(),
        national = national.len(),
        "reference standards loaded"
    );

    let coverage = compare(&schema.root, &partition, &municipal, &national)?;
    write_json(&paths.doc, &coverage.document)?;

    let stats = coverage.stats;
    info!(
        city = slug,
        total = stats.total,
        required = stats.required,
        prohibited = stats.prohibited,
        mapped_municipal = stats.mapped_municipal,
        mapped_national = stats.mapped_national,
        exclusive = stats.exclusive,
        tax_reform = stats.tax_reform,
        output = %paths.doc.display(),
        "coverage document generated"
    );

    Ok(CityDoc {
        document: coverage.document,
        stats,
        output: paths.doc,
    })
}
