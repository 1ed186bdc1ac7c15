//! NFSe city guides: schema trees and coverage documents.
//!
//! A city's integration guide documents each API field as a dotted path with
//! a title, a description and a required/ignored badge. This crate folds
//! those records into a nested JSON-Schema-like tree, then classifies every
//! field of such a tree against the city's own partition and the municipal
//! and national NFSe standards.
//!
//! # Entry Points
//!
//! ```
//! use nfse_schema::builder::build;
//! use nfse_schema::coverage::compare;
//! use nfse_schema::model::FieldRecord;
//! use nfse_schema::reference::ReferencePathSet;
//!
//! let records = vec![
//!     FieldRecord::new("tomador.cpf", "CPF").required(),
//!     FieldRecord::new("tomador.nome", "Nome"),
//! ];
//! let tree = build(&records)?;
//!
//! let municipal: ReferencePathSet = ["tomador", "tomador.cpf"].into_iter().collect();
//! let national = ReferencePathSet::default();
//! let coverage = compare(&tree.schema.root, &tree.partition, &municipal, &national)?;
//!
//! assert_eq!(coverage.stats.total, 3);
//! assert_eq!(coverage.stats.exclusive, 1);
//! # Ok::<(), nfse_schema::Error>(())
//! ```
//!
//! # On-disk layout
//!
//! ```text
//! <base>/
//!   nfse.toml                     ← optional settings
//!   data/
//!     padrao-municipal.json       ← municipal standard (POST /nfse)
//!     padrao-nacioanal.json       ← national standard (POST /nfsen)
//!   work/guides/<slug>/
//!     <slug>-fields.json          ← extracted field records
//!     <slug>-schema.json          ← schema tree
//!     <slug>-json-fake.json       ← sample payload
//!     <slug>-json-docs.json       ← requirement partition
//!     doc.json                    ← coverage document
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod builder;
pub mod city;
pub mod config;
pub mod coverage;
pub mod error;
pub mod model;
pub mod reference;
pub mod writer;

pub use builder::{build, PathTree, PathTreeBuilder};
pub use city::{build_city_artifacts, generate_city_doc, CityArtifacts, CityDoc};
pub use config::{CityPaths, Settings};
pub use coverage::{compare, Comparator, Coverage, CoverageLeaf, CoverageStats};
pub use error::{Error, Result};
pub use model::{
    FieldRecord, FieldType, ObjectNode, PathPartition, Requirement, SchemaDocument, SchemaNode,
    Shape,
};
pub use reference::{ReferencePathSet, ReferenceStandard, MUNICIPAL, NACIONAL};
