//! Core data model: field records, schema nodes and the path partition.
//!
//! A [`SchemaNode`] is either a leaf or an object node, decided once when the
//! node is built or read. On disk both are plain JSON-Schema-like mappings
//! (`type`, `title`, `description`, `enum`, `properties`, `required`,
//! `optional`, `ignore`); conversion in both directions never fails, so a
//! mislabeled or partially written schema still loads.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Marker prepended to every fully qualified path in the partition.
pub const JSON_PATH_PREFIX: &str = "$.";

/// `$schema` dialect written at the root of every built schema.
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Returns the partition key for a dot-separated field path (`a.b` → `$.a.b`).
#[must_use]
pub fn json_path(path: &str) -> String {
    format!("{JSON_PATH_PREFIX}{path}")
}

/// Declared JSON type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldType {
    /// `"string"` (also the fallback when no type is known).
    #[default]
    String,
    /// `"number"`.
    Number,
    /// `"integer"`.
    Integer,
    /// `"boolean"`.
    Boolean,
    /// `"array"`.
    Array,
    /// `"object"` declared on a node that has no children.
    Object,
    /// Any other type name found in a source document, kept verbatim.
    Other(String),
}

impl FieldType {
    /// Parses a JSON-Schema type name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the JSON-Schema type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Other(name) => name,
        }
    }

    /// Placeholder value used in the sample tree for a leaf of this type.
    #[must_use]
    pub fn placeholder(&self) -> Value {
        match self {
            Self::Number | Self::Integer => Value::from(0),
            Self::Boolean => Value::Bool(true),
            Self::Array => Value::Array(Vec::new()),
            Self::Object => Value::Object(Map::new()),
            Self::String | Self::Other(_) => Value::from("string"),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<FieldType> for String {
    fn from(kind: FieldType) -> Self {
        kind.as_str().to_string()
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Requirement class of a documented field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Must be sent (`obrigatório`).
    Required,
    /// Must not be sent; the city ignores or rejects it.
    Ignored,
    /// May be sent.
    Optional,
}

/// One documented API field, as extracted from a city guide page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Dot-separated path without the `$.` marker (e.g. `prestador.cnpj`).
    pub path: String,
    /// Short field title.
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Free-text documentation.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Marked as required on the page.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub required: bool,
    /// Marked as "do not send" on the page.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub ignored: bool,
    /// Declared type, when the page states one.
    #[serde(
        default,
        rename = "type",
        deserialize_with = "lenient_field_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_type: Option<FieldType>,
}

// Record metadata is scraped from guide pages; a null or wrongly typed value
// falls back to the field's default instead of rejecting the record.

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        _ => String::new(),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_field_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<FieldType>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => Some(FieldType::from(name)),
        _ => None,
    })
}

/// Reads a partition bucket. `null` or a non-mapping is an empty bucket, and
/// entries whose text is not a string are dropped.
fn lenient_bucket<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(path, text)| match text {
            Value::String(text) => Some((path, text)),
            _ => None,
        })
        .collect())
}

impl FieldRecord {
    /// Creates an optional string field with the given path and title.
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            description: String::new(),
            required: false,
            ignored: false,
            field_type: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the declared type.
    #[must_use]
    pub fn with_type(mut self, kind: FieldType) -> Self {
        self.field_type = Some(kind);
        self
    }

    /// Marks the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field ignored.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Classifies the record. `required` takes precedence over `ignored`.
    #[must_use]
    pub fn requirement(&self) -> Requirement {
        if self.required {
            Requirement::Required
        } else if self.ignored {
            Requirement::Ignored
        } else {
            Requirement::Optional
        }
    }

    /// Text recorded in the partition: the description, or the title when
    /// the description is empty.
    #[must_use]
    pub fn doc_text(&self) -> &str {
        if self.description.is_empty() {
            &self.title
        } else {
            &self.description
        }
    }
}

/// Children and per-level requirement sets of an object node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    /// Child nodes keyed by segment name.
    pub properties: BTreeMap<String, SchemaNode>,
    /// Segment names classified required at this level.
    pub required: BTreeSet<String>,
    /// Segment names classified optional at this level.
    pub optional: BTreeSet<String>,
    /// Segment names classified ignored at this level.
    pub ignore: BTreeSet<String>,
}

impl ObjectNode {
    /// Adds `segment` to the set matching `requirement`. Idempotent.
    pub fn classify(&mut self, segment: &str, requirement: Requirement) {
        let set = match requirement {
            Requirement::Required => &mut self.required,
            Requirement::Ignored => &mut self.ignore,
            Requirement::Optional => &mut self.optional,
        };
        if !set.contains(segment) {
            set.insert(segment.to_string());
        }
    }
}

/// Leaf or object.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Scalar, array or childless node with its declared type.
    Leaf(FieldType),
    /// Node with child properties.
    Object(ObjectNode),
}

/// A node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Field title.
    pub title: Option<String>,
    /// Field description.
    pub description: Option<String>,
    /// Allowed values (`enum`), in source order.
    pub values: Option<Vec<Value>>,
    /// Leaf or object.
    pub shape: Shape,
}

impl SchemaNode {
    /// A bare leaf of the given type.
    #[must_use]
    pub fn leaf(kind: FieldType) -> Self {
        Self {
            title: None,
            description: None,
            values: None,
            shape: Shape::Leaf(kind),
        }
    }

    /// An empty object node.
    #[must_use]
    pub fn object() -> Self {
        Self {
            title: None,
            description: None,
            values: None,
            shape: Shape::Object(ObjectNode::default()),
        }
    }

    /// Returns the object part, if this is an object node.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match &self.shape {
            Shape::Object(object) => Some(object),
            Shape::Leaf(_) => None,
        }
    }

    /// Returns true for object nodes.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self.shape, Shape::Object(_))
    }

    /// Turns a leaf into an empty object node, dropping its scalar type and
    /// enum. Title and description survive. Object nodes are left untouched.
    pub fn coerce_to_object(&mut self) {
        if let Shape::Leaf(_) = self.shape {
            self.shape = Shape::Object(ObjectNode::default());
            self.values = None;
        }
    }

    /// Reads a node from a JSON value.
    ///
    /// A mapping-valued `properties` member makes the node an object,
    /// whatever its `type` says. Anything that is not a mapping reads as a
    /// bare string leaf.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::leaf(FieldType::String);
        };

        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let kind = text("type").map(FieldType::from).unwrap_or_default();

        let shape = match map.get("properties").and_then(Value::as_object) {
            Some(properties) => Shape::Object(ObjectNode {
                properties: properties
                    .iter()
                    .map(|(name, child)| (name.clone(), Self::from_value(child)))
                    .collect(),
                required: name_set(map.get("required")),
                optional: name_set(map.get("optional")),
                ignore: name_set(map.get("ignore")),
            }),
            None => Shape::Leaf(kind),
        };

        Self {
            title: text("title"),
            description: text("description"),
            values: map.get("enum").and_then(Value::as_array).cloned(),
            shape,
        }
    }

    /// Writes the node as a JSON-Schema-like mapping. Empty requirement sets
    /// are omitted.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        let kind = match &self.shape {
            Shape::Leaf(kind) => kind.as_str(),
            Shape::Object(_) => "object",
        };
        map.insert("type".into(), Value::from(kind));
        if let Some(title) = &self.title {
            map.insert("title".into(), Value::from(title.as_str()));
        }
        if let Some(description) = &self.description {
            map.insert("description".into(), Value::from(description.as_str()));
        }
        if let Some(values) = &self.values {
            map.insert("enum".into(), Value::Array(values.clone()));
        }
        if let Shape::Object(object) = &self.shape {
            let properties = object
                .properties
                .iter()
                .map(|(name, child)| (name.clone(), child.to_value()))
                .collect();
            map.insert("properties".into(), Value::Object(properties));
            for (key, set) in [
                ("required", &object.required),
                ("optional", &object.optional),
                ("ignore", &object.ignore),
            ] {
                if !set.is_empty() {
                    map.insert(key.into(), set.iter().cloned().collect());
                }
            }
        }
        Value::Object(map)
    }
}

fn name_set(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

/// A city schema file: the root node plus its `$schema` dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    /// `$schema` URI, when present.
    pub dialect: Option<String>,
    /// Root node.
    pub root: SchemaNode,
}

impl SchemaDocument {
    /// Reads a schema document from JSON.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            dialect: value
                .get("$schema")
                .and_then(Value::as_str)
                .map(str::to_string),
            root: SchemaNode::from_value(value),
        }
    }

    /// Writes the document as JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut value = self.root.to_value();
        if let (Some(dialect), Value::Object(map)) = (&self.dialect, &mut value) {
            map.insert("$schema".into(), Value::from(dialect.as_str()));
        }
        value
    }
}

impl Serialize for SchemaDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

/// Fully qualified paths (`$.a.b`) grouped by requirement, each mapped to its
/// documentation text. This is the `<city>-json-docs.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathPartition {
    /// Required paths.
    #[serde(rename = "obrigatorios", default, deserialize_with = "lenient_bucket")]
    pub required: BTreeMap<String, String>,
    /// Ignored paths.
    #[serde(rename = "ignorados", default, deserialize_with = "lenient_bucket")]
    pub ignored: BTreeMap<String, String>,
    /// Optional paths.
    #[serde(rename = "opcionais", default, deserialize_with = "lenient_bucket")]
    pub optional: BTreeMap<String, String>,
}

impl PathPartition {
    /// Records `json_path` in the bucket for `requirement`, overwriting any
    /// previous text for it in that bucket. Other buckets are not touched.
    pub fn record(&mut self, requirement: Requirement, json_path: String, text: String) {
        let bucket = match requirement {
            Requirement::Required => &mut self.required,
            Requirement::Ignored => &mut self.ignored,
            Requirement::Optional => &mut self.optional,
        };
        bucket.insert(json_path, text);
    }

    /// Returns true if `json_path` is in the required bucket.
    #[must_use]
    pub fn is_required(&self, json_path: &str) -> bool {
        self.required.contains_key(json_path)
    }

    /// Returns true if `json_path` is in the ignored bucket.
    #[must_use]
    pub fn is_ignored(&self, json_path: &str) -> bool {
        self.ignored.contains_key(json_path)
    }

    /// Documentation text for `json_path`: the optional entry, then the
    /// required one.
    #[must_use]
    pub fn description_for(&self, json_path: &str) -> Option<&str> {
        self.optional
            .get(json_path)
            .or_else(|| self.required.get(json_path))
            .map(String::as_str)
    }

    /// Total number of entries across the three buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.required.len() + self.ignored.len() + self.optional.len()
    }

    /// Returns true if all buckets are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
