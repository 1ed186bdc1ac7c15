//! Reference standards: locating the request schema inside an OpenAPI-like
//! reference document and flattening it into a set of property paths.
//!
//! Both standards share one traversal; they differ only in the endpoint the
//! request schema hangs from.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

/// Where a standard's request schema lives inside its reference document:
/// `data.api.schema.paths.<endpoint>.<method>.requestBody.content.<content_type>.schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceStandard {
    /// Display name used in logs.
    pub name: &'static str,
    /// OpenAPI path key (e.g. `/nfse`).
    pub endpoint: &'static str,
    /// HTTP method key.
    pub method: &'static str,
    /// Request body media type.
    pub content_type: &'static str,
}

/// The municipal NFSe standard (`POST /nfse`).
pub const MUNICIPAL: ReferenceStandard = ReferenceStandard {
    name: "municipal",
    endpoint: "/nfse",
    method: "post",
    content_type: "application/json",
};

/// The national NFSe standard (`POST /nfsen`).
pub const NACIONAL: ReferenceStandard = ReferenceStandard {
    name: "nacional",
    endpoint: "/nfsen",
    method: "post",
    content_type: "application/json",
};

impl ReferenceStandard {
    /// Key path from the document root to the request schema.
    #[must_use]
    pub fn key_path(&self) -> [&'static str; 10] {
        [
            "data",
            "api",
            "schema",
            "paths",
            self.endpoint,
            self.method,
            "requestBody",
            "content",
            self.content_type,
            "schema",
        ]
    }

    /// The key path as an RFC 6901 JSON pointer. Keys such as `/nfse` and
    /// `application/json` contain slashes and are escaped.
    #[must_use]
    pub fn schema_pointer(&self) -> String {
        self.key_path()
            .iter()
            .map(|key| format!("/{}", key.replace('~', "~0").replace('/', "~1")))
            .collect()
    }

    /// Returns the request schema, or `None` if any key along the path is
    /// missing.
    #[must_use]
    pub fn request_schema<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        document.pointer(&self.schema_pointer())
    }

    /// Flattens this standard's request schema into its property paths. A
    /// document that does not resolve yields an empty set.
    #[must_use]
    pub fn extract_paths(&self, document: &Value) -> ReferencePathSet {
        let Some(schema) = self.request_schema(document) else {
            warn!(standard = self.name, "request schema not found in reference document");
            return ReferencePathSet::default();
        };
        let paths = flatten_property_paths(schema);
        if paths.is_empty() {
            warn!(standard = self.name, "no fields extracted from reference standard");
        } else {
            debug!(standard = self.name, fields = paths.len(), "reference standard loaded");
        }
        paths
    }
}

/// Every dot-separated property path reachable through nested `properties`
/// mappings below `schema`, at every depth.
#[must_use]
pub fn flatten_property_paths(schema: &Value) -> ReferencePathSet {
    let mut paths = HashSet::new();
    let mut stack: Vec<(&Value, String)> = vec![(schema, String::new())];

    while let Some((node, prefix)) = stack.pop() {
        let Some(properties) = node.get("properties").and_then(Value::as_object) else {
            continue;
        };
        for (key, child) in properties {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            if child.get("properties").is_some_and(Value::is_object) {
                stack.push((child, path.clone()));
            }
            paths.insert(path);
        }
    }

    ReferencePathSet(paths)
}

/// Flattened field paths of a reference standard, for membership tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePathSet(HashSet<String>);

impl ReferencePathSet {
    /// Returns true if `path` is defined by the standard.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    /// Number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the standard contributed no paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the paths in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ReferencePathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
