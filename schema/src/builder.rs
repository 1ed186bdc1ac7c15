//! Path-tree builder: folds flat field records into a nested schema tree, a
//! sample payload of the same shape, and the required/ignored/optional
//! partition of their paths.
//!
//! Every record is placed by a recursive get-or-create walk over its path
//! segments. Intermediate segments always resolve to object nodes: a leaf
//! found on the way is turned into an object (its scalar type is dropped), so
//! a segment that prefixes a longer path is an object whatever order the
//! records arrive in.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    json_path, FieldRecord, ObjectNode, PathPartition, SchemaDocument, SchemaNode, Shape,
    SCHEMA_DIALECT,
};

/// The three artifacts produced from one city's field records.
#[derive(Debug, Clone, PartialEq)]
pub struct PathTree {
    /// Schema tree; the root is always an object node.
    pub schema: SchemaDocument,
    /// Sample payload mirroring the schema's shape.
    pub sample: Value,
    /// Fully qualified paths by requirement.
    pub partition: PathPartition,
}

/// Incremental builder behind [`build`].
#[derive(Debug, Default)]
pub struct PathTreeBuilder {
    title: Option<String>,
    root: ObjectNode,
    sample: Map<String, Value>,
    partition: PathPartition,
    seen: usize,
}

impl PathTreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema root title (the guide page title).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Places one record in the tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`] or [`Error::EmptySegment`] when the path
    /// cannot be split into non-empty segments. The tree is left unchanged.
    pub fn insert(&mut self, record: &FieldRecord) -> Result<()> {
        let index = self.seen;
        self.seen += 1;

        if record.path.is_empty() {
            return Err(Error::EmptyPath { index });
        }
        let segments: Vec<&str> = record.path.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(Error::EmptySegment {
                path: record.path.clone(),
            });
        }

        debug!(path = %record.path, requirement = ?record.requirement(), "placing field");
        place(&mut self.root, &mut self.sample, &segments, record);

        self.partition.record(
            record.requirement(),
            json_path(&record.path),
            record.doc_text().to_string(),
        );
        Ok(())
    }

    /// Number of records offered to [`insert`](Self::insert) so far.
    #[must_use]
    pub fn records_seen(&self) -> usize {
        self.seen
    }

    /// Finishes the build.
    #[must_use]
    pub fn finish(self) -> PathTree {
        let root = SchemaNode {
            title: self.title,
            description: None,
            values: None,
            shape: Shape::Object(self.root),
        };
        PathTree {
            schema: SchemaDocument {
                dialect: Some(SCHEMA_DIALECT.to_string()),
                root,
            },
            sample: Value::Object(self.sample),
            partition: self.partition,
        }
    }
}

/// Builds the schema tree, sample and partition from `records`, in order.
///
/// # Errors
///
/// Fails on the first record whose path is empty or has an empty segment.
pub fn build<'a, I>(records: I) -> Result<PathTree>
where
    I: IntoIterator<Item = &'a FieldRecord>,
{
    let mut builder = PathTreeBuilder::new();
    for record in records {
        builder.insert(record)?;
    }
    Ok(builder.finish())
}

/// Walks `segments` below `object`, creating or coercing object nodes on the
/// way, and merges `record` at the last segment. `sample` is walked in
/// lockstep and takes the same object-or-leaf decision at every level.
fn place(
    object: &mut ObjectNode,
    sample: &mut Map<String, Value>,
    segments: &[&str],
    record: &FieldRecord,
) {
    match segments {
        [] => {}
        [name] => {
            let node = object
                .properties
                .entry((*name).to_string())
                .or_insert_with(|| SchemaNode::leaf(Default::default()));
            node.title = Some(record.title.clone());
            node.description = Some(record.description.clone());

            let placeholder = match &mut node.shape {
                Shape::Leaf(kind) => {
                    if let Some(declared) = &record.field_type {
                        *kind = declared.clone();
                    }
                    kind.placeholder()
                }
                Shape::Object(_) => match sample.remove(*name) {
                    Some(existing @ Value::Object(_)) => existing,
                    _ => Value::Object(Map::new()),
                },
            };
            sample.insert((*name).to_string(), placeholder);

            object.classify(name, record.requirement());
        }
        [name, rest @ ..] => {
            let child = object
                .properties
                .entry((*name).to_string())
                .or_insert_with(SchemaNode::object);
            child.coerce_to_object();

            let child_sample = sample
                .entry((*name).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child_sample.is_object() {
                *child_sample = Value::Object(Map::new());
            }

            if let (Shape::Object(child_object), Value::Object(child_sample)) =
                (&mut child.shape, child_sample)
            {
                place(child_object, child_sample, rest, record);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{FieldType, Requirement};
    use serde_json::json;

    fn node_at<'a>(tree: &'a PathTree, path: &str) -> &'a SchemaNode {
        let mut node = &tree.schema.root;
        for segment in path.split('.') {
            node = &node.as_object().unwrap().properties[segment];
        }
        node
    }

    #[test]
    fn builds_nested_address_example() {
        let records = vec![
            FieldRecord::new("endereco.cidade", "Cidade")
                .with_description("Nome da cidade")
                .with_type(FieldType::String)
                .required(),
            FieldRecord::new("endereco.uf", "UF").with_type(FieldType::String),
        ];
        let tree = build(&records).unwrap();

        assert_eq!(
            tree.schema.root.to_value(),
            json!({
                "type": "object",
                "properties": {
                    "endereco": {
                        "type": "object",
                        "properties": {
                            "cidade": {"type": "string", "title": "Cidade", "description": "Nome da cidade"},
                            "uf": {"type": "string", "title": "UF", "description": ""}
                        },
                        "required": ["cidade"],
                        "optional": ["uf"]
                    }
                }
            })
        );
        assert_eq!(
            tree.partition.required.get("$.endereco.cidade").map(String::as_str),
            Some("Nome da cidade")
        );
        // empty description falls back to the title
        assert_eq!(
            tree.partition.optional.get("$.endereco.uf").map(String::as_str),
            Some("UF")
        );
        assert!(tree.partition.ignored.is_empty());
        assert_eq!(
            tree.sample,
            json!({"endereco": {"cidade": "string", "uf": "string"}})
        );
    }

    #[test]
    fn object_wins_over_earlier_leaf() {
        let records = vec![
            FieldRecord::new("a", "A").with_type(FieldType::Integer),
            FieldRecord::new("a.b", "B").with_type(FieldType::Boolean),
        ];
        let tree = build(&records).unwrap();

        let a = node_at(&tree, "a");
        assert!(a.is_object());
        assert_eq!(a.title.as_deref(), Some("A"));
        assert_eq!(
            node_at(&tree, "a.b").shape,
            Shape::Leaf(FieldType::Boolean)
        );
        assert_eq!(tree.sample, json!({"a": {"b": true}}));
    }

    #[test]
    fn object_wins_over_later_leaf() {
        let records = vec![
            FieldRecord::new("a.b", "B").with_type(FieldType::Number),
            FieldRecord::new("a", "A").with_type(FieldType::String),
        ];
        let tree = build(&records).unwrap();

        let a = node_at(&tree, "a");
        assert!(a.is_object());
        assert_eq!(a.title.as_deref(), Some("A"));
        assert_eq!(tree.sample, json!({"a": {"b": 0}}));
        let root = tree.schema.root.as_object().unwrap();
        assert!(root.optional.contains("a"));
    }

    #[test]
    fn later_record_keeps_earlier_type_when_untyped() {
        let records = vec![
            FieldRecord::new("valor", "Valor").with_type(FieldType::Number),
            FieldRecord::new("valor", "Valor do serviço"),
        ];
        let tree = build(&records).unwrap();
        let valor = node_at(&tree, "valor");
        assert_eq!(valor.shape, Shape::Leaf(FieldType::Number));
        assert_eq!(valor.title.as_deref(), Some("Valor do serviço"));
        assert_eq!(tree.sample, json!({"valor": 0}));
    }

    #[test]
    fn conflicting_classification_keeps_stale_membership() {
        let records = vec![
            FieldRecord::new("x", "X").with_description("primeiro").required(),
            FieldRecord::new("x", "X").with_description("segundo").ignored(),
        ];
        let tree = build(&records).unwrap();

        let root = tree.schema.root.as_object().unwrap();
        assert!(root.required.contains("x"));
        assert!(root.ignore.contains("x"));
        assert_eq!(tree.partition.required.get("$.x").map(String::as_str), Some("primeiro"));
        assert_eq!(tree.partition.ignored.get("$.x").map(String::as_str), Some("segundo"));
    }

    #[test]
    fn rejects_empty_path_and_segments() {
        let mut builder = PathTreeBuilder::new();
        builder.insert(&FieldRecord::new("ok", "Ok")).unwrap();
        assert!(matches!(
            builder.insert(&FieldRecord::new("", "Vazio")),
            Err(Error::EmptyPath { index: 1 })
        ));
        assert!(matches!(
            builder.insert(&FieldRecord::new("a..b", "Buraco")),
            Err(Error::EmptySegment { .. })
        ));
        assert_eq!(builder.records_seen(), 3);

        let tree = builder.finish();
        assert_eq!(tree.partition.len(), 1);
        assert_eq!(tree.sample, json!({"ok": "string"}));
    }

    #[test]
    fn classification_is_recorded_on_enclosing_node() {
        let records = vec![
            FieldRecord::new("servico.item", "Item").required(),
            FieldRecord::new("servico.obs", "Obs").ignored(),
            FieldRecord::new("servico.item", "Item").required(),
        ];
        let tree = build(&records).unwrap();
        let servico = node_at(&tree, "servico").as_object().unwrap();
        assert_eq!(servico.required.len(), 1);
        assert!(servico.ignore.contains("obs"));
        assert!(servico.optional.is_empty());
        assert_eq!(
            tree.partition.ignored.get("$.servico.obs").map(String::as_str),
            Some("Obs")
        );
        assert_eq!(records[0].requirement(), Requirement::Required);
    }

    #[test]
    fn root_carries_dialect_and_title() {
        let mut builder = PathTreeBuilder::new().with_title("NFSe Recife");
        builder.insert(&FieldRecord::new("a", "A")).unwrap();
        let tree = builder.finish();
        let value = tree.schema.to_value();
        assert_eq!(value["$schema"], json!(SCHEMA_DIALECT));
        assert_eq!(value["title"], json!("NFSe Recife"));
        assert_eq!(value["type"], json!("object"));
    }
}
