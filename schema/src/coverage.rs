//! Coverage comparator: classifies every field of a city schema against the
//! city's own requirement partition and the two reference standards.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{json_path, ObjectNode, PathPartition, SchemaNode, Shape};
use crate::reference::ReferencePathSet;

/// Marker the guides put on fields introduced by the tax reform.
pub const TAX_REFORM_MARKER: &str = "<sup>(RT)</sup>";

/// Array indirection marker stripped from paths before reference lookups.
pub const ARRAY_MARKER: &str = "[]";

/// Classification of one city field.
///
/// The optional flags are left out of the serialized form when false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageLeaf {
    /// Effective type (`enum`, `object`, or the declared type).
    #[serde(rename = "type")]
    pub kind: String,
    /// Allowed values, for enum fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    /// Resolved documentation text.
    pub description: String,
    /// Also defined by the municipal standard.
    #[serde(rename = "mapeadoNFSe", skip_serializing_if = "is_false")]
    pub mapped_municipal: bool,
    /// Also defined by the national standard.
    #[serde(rename = "mapeadoNacional", skip_serializing_if = "is_false")]
    pub mapped_national: bool,
    /// Listed as required by the city.
    pub required: bool,
    /// Listed as ignored (must not be sent) by the city.
    #[serde(rename = "proibido")]
    pub prohibited: bool,
    /// Description mentions the tax reform.
    #[serde(rename = "reformaTributaria", skip_serializing_if = "is_false")]
    pub tax_reform: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl CoverageLeaf {
    /// Returns true if neither standard defines the field.
    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        !self.mapped_municipal && !self.mapped_national
    }
}

/// Aggregate counters over one city's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CoverageStats {
    /// Fields classified (intermediate objects included).
    pub total: usize,
    /// Required fields.
    #[serde(rename = "obrigatorios")]
    pub required: usize,
    /// Prohibited fields.
    #[serde(rename = "proibidos")]
    pub prohibited: usize,
    /// Fields found in the municipal standard.
    #[serde(rename = "mapeadosNFSe")]
    pub mapped_municipal: usize,
    /// Fields found in the national standard.
    #[serde(rename = "mapeadosNacional")]
    pub mapped_national: usize,
    /// Fields found in neither standard.
    #[serde(rename = "exclusivos")]
    pub exclusive: usize,
    /// Fields tagged with the tax reform.
    #[serde(rename = "reformaTributaria")]
    pub tax_reform: usize,
}

impl CoverageStats {
    fn count(&mut self, leaf: &CoverageLeaf) {
        self.total += 1;
        self.required += usize::from(leaf.required);
        self.prohibited += usize::from(leaf.prohibited);
        self.mapped_municipal += usize::from(leaf.mapped_municipal);
        self.mapped_national += usize::from(leaf.mapped_national);
        self.exclusive += usize::from(leaf.is_exclusive());
        self.tax_reform += usize::from(leaf.tax_reform);
    }
}

impl fmt::Display for CoverageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total de campos: {}", self.total)?;
        writeln!(f, "Obrigatórios: {}", self.required)?;
        writeln!(f, "Proibidos: {}", self.prohibited)?;
        writeln!(f, "Mapeados NFSe: {}", self.mapped_municipal)?;
        writeln!(f, "Mapeados Nacional: {}", self.mapped_national)?;
        writeln!(f, "Exclusivos da cidade: {}", self.exclusive)?;
        write!(f, "Reforma Tributária: {}", self.tax_reform)
    }
}

/// Result of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    /// Nested coverage document, shaped like the city schema.
    pub document: Value,
    /// Aggregate counters.
    pub stats: CoverageStats,
}

/// Lists every property path below `root` with its node, parents before
/// children, at every depth.
#[must_use]
pub fn linearize(root: &ObjectNode) -> Vec<(String, &SchemaNode)> {
    let mut out = Vec::new();
    collect_paths(root, "", &mut out);
    out
}

fn collect_paths<'a>(object: &'a ObjectNode, prefix: &str, out: &mut Vec<(String, &'a SchemaNode)>) {
    for (key, node) in &object.properties {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        out.push((path.clone(), node));
        if let Shape::Object(child) = &node.shape {
            collect_paths(child, &path, out);
        }
    }
}

/// Type reported for a node: `enum` when it lists values, `object` for
/// object nodes, otherwise the declared type.
#[must_use]
pub fn effective_type(node: &SchemaNode) -> String {
    if node.values.is_some() {
        return "enum".to_string();
    }
    match &node.shape {
        Shape::Object(_) => "object".to_string(),
        Shape::Leaf(kind) => kind.as_str().to_string(),
    }
}

const TAX_REFORM_PATTERN: &str = r"(?i)reforma\s+tribut[aá]ria";

#[allow(clippy::expect_used)]
fn tax_reform_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Fixed literal; `tax_reform_pattern_compiles` covers it.
    PATTERN.get_or_init(|| Regex::new(TAX_REFORM_PATTERN).expect("tax-reform pattern is valid"))
}

/// Returns true if `description` carries the tax-reform marker or mentions
/// "reforma tributária" anywhere, in any case.
#[must_use]
pub fn is_tax_reform(description: &str) -> bool {
    description.contains(TAX_REFORM_MARKER)
        || tax_reform_pattern().is_match(description)
}

/// Drops array markers so `itens[].codigo` matches a reference `itens.codigo`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    path.replace(ARRAY_MARKER, "")
}

/// Compares a city schema against the two reference standards.
#[derive(Debug, Clone, Copy)]
pub struct Comparator<'a> {
    partition: &'a PathPartition,
    municipal: &'a ReferencePathSet,
    national: &'a ReferencePathSet,
}

impl<'a> Comparator<'a> {
    /// Creates a comparator over a city partition and both reference sets.
    #[must_use]
    pub fn new(
        partition: &'a PathPartition,
        municipal: &'a ReferencePathSet,
        national: &'a ReferencePathSet,
    ) -> Self {
        Self {
            partition,
            municipal,
            national,
        }
    }

    /// Classifies the field at `path`.
    #[must_use]
    pub fn classify(&self, path: &str, node: &SchemaNode) -> CoverageLeaf {
        let key = json_path(path);
        let description = node
            .description
            .as_deref()
            .filter(|text| !text.is_empty())
            .or_else(|| self.partition.description_for(&key))
            .unwrap_or_default()
            .to_string();

        let normalized = normalize_path(path);
        let mapped = |set: &ReferencePathSet| set.contains(&normalized) || set.contains(path);

        CoverageLeaf {
            kind: effective_type(node),
            values: node.values.clone(),
            mapped_municipal: mapped(self.municipal),
            mapped_national: mapped(self.national),
            required: self.partition.is_required(&key),
            prohibited: self.partition.is_ignored(&key),
            tax_reform: is_tax_reform(&description),
            description,
        }
    }

    /// Classifies every field of `schema` and nests the results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSchema`] if the root is not an object node,
    /// or [`Error::Json`] if a leaf cannot be converted to JSON.
    pub fn compare(&self, schema: &SchemaNode) -> Result<Coverage> {
        let root = schema.as_object().ok_or(Error::MalformedSchema)?;

        let mut document = Map::new();
        let mut stats = CoverageStats::default();

        for (path, node) in linearize(root) {
            let leaf = self.classify(&path, node);
            stats.count(&leaf);
            debug!(%path, kind = %leaf.kind, exclusive = leaf.is_exclusive(), "field classified");

            let value = serde_json::to_value(&leaf).map_err(|source| Error::Json {
                path: path.clone().into(),
                source,
            })?;
            let segments: Vec<&str> = path.split('.').collect();
            set_nested(&mut document, &segments, value);
        }

        Ok(Coverage {
            document: Value::Object(document),
            stats,
        })
    }
}

/// Runs a [`Comparator`] once.
///
/// # Errors
///
/// See [`Comparator::compare`].
pub fn compare(
    schema: &SchemaNode,
    partition: &PathPartition,
    municipal: &ReferencePathSet,
    national: &ReferencePathSet,
) -> Result<Coverage> {
    Comparator::new(partition, municipal, national).compare(schema)
}

/// Stores `leaf` at `segments` below `target`. Intermediate values that are
/// not mappings are replaced by empty ones; a parent's leaf is a mapping, so
/// children land inside it next to its own keys.
fn set_nested(target: &mut Map<String, Value>, segments: &[&str], leaf: Value) {
    match segments {
        [] => {}
        [name] => {
            target.insert((*name).to_string(), leaf);
        }
        [name, rest @ ..] => {
            let slot = target
                .entry((*name).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(inner) = slot {
                set_nested(inner, rest, leaf);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::FieldType;
    use serde_json::json;

    fn schema(value: Value) -> SchemaNode {
        SchemaNode::from_value(&value)
    }

    #[test]
    fn linearize_lists_parents_before_children() {
        let node = schema(json!({
            "type": "object",
            "properties": {
                "b": {"type": "object", "properties": {"c": {}, "d": {}}},
                "a": {}
            }
        }));
        let paths: Vec<String> = linearize(node.as_object().unwrap())
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(paths, vec!["a", "b", "b.c", "b.d"]);
    }

    #[test]
    fn effective_type_prefers_enum_then_object() {
        assert_eq!(effective_type(&schema(json!({"type": "string", "enum": ["1"]}))), "enum");
        assert_eq!(
            effective_type(&schema(json!({"type": "string", "properties": {}}))),
            "object"
        );
        assert_eq!(effective_type(&schema(json!({"type": "integer"}))), "integer");
        assert_eq!(effective_type(&schema(json!({}))), "string");
        assert_eq!(
            effective_type(&SchemaNode::leaf(FieldType::Array)),
            "array"
        );
    }

    #[test]
    fn tax_reform_pattern_compiles() {
        assert!(Regex::new(TAX_REFORM_PATTERN).is_ok());
        assert!(tax_reform_pattern().is_match("Reforma Tributaria"));
    }

    #[test]
    fn tax_reform_detection() {
        assert!(is_tax_reform("Valor do IBS <sup>(RT)</sup>"));
        assert!(is_tax_reform("Campo criado pela REFORMA  Tributaria de 2026"));
        assert!(is_tax_reform("ver reforma tributária"));
        assert!(!is_tax_reform("Reforma do imóvel"));
        assert!(!is_tax_reform(""));
    }

    #[test]
    fn array_markers_are_normalized_for_lookup() {
        let municipal: ReferencePathSet = ["itens.codigo"].into_iter().collect();
        let national: ReferencePathSet = ["itens[].valor"].into_iter().collect();
        let partition = PathPartition::default();
        let comparator = Comparator::new(&partition, &municipal, &national);

        let leaf = comparator.classify("itens[].codigo", &SchemaNode::leaf(FieldType::String));
        assert!(leaf.mapped_municipal);
        assert!(!leaf.mapped_national);

        let raw = comparator.classify("itens[].valor", &SchemaNode::leaf(FieldType::Number));
        assert!(raw.mapped_national);
        assert!(!raw.mapped_municipal);
    }

    #[test]
    fn description_falls_back_to_partition() {
        let mut partition = PathPartition::default();
        partition.optional.insert("$.a".into(), "do opcional".into());
        partition.required.insert("$.b".into(), "do obrigatório".into());
        let empty = ReferencePathSet::default();
        let comparator = Comparator::new(&partition, &empty, &empty);

        let mut own = SchemaNode::leaf(FieldType::String);
        own.description = Some("própria".into());
        assert_eq!(comparator.classify("a", &own).description, "própria");

        let mut blank = SchemaNode::leaf(FieldType::String);
        blank.description = Some(String::new());
        assert_eq!(comparator.classify("a", &blank).description, "do opcional");
        assert_eq!(comparator.classify("b", &blank).description, "do obrigatório");
        assert_eq!(comparator.classify("c", &blank).description, "");
    }

    #[test]
    fn false_flags_are_omitted() {
        let partition = PathPartition::default();
        let empty = ReferencePathSet::default();
        let leaf = Comparator::new(&partition, &empty, &empty)
            .classify("x", &SchemaNode::leaf(FieldType::String));
        assert_eq!(
            serde_json::to_value(&leaf).unwrap(),
            json!({"type": "string", "description": "", "required": false, "proibido": false})
        );
    }

    #[test]
    fn true_flags_and_values_are_serialized() {
        let mut partition = PathPartition::default();
        partition.ignored.insert("$.x".into(), "não enviar".into());
        let both: ReferencePathSet = ["x"].into_iter().collect();
        let node = schema(json!({
            "type": "string",
            "enum": ["1", "2"],
            "description": "Reforma tributária <sup>(RT)</sup>"
        }));
        let leaf = Comparator::new(&partition, &both, &both).classify("x", &node);
        assert_eq!(
            serde_json::to_value(&leaf).unwrap(),
            json!({
                "type": "enum",
                "values": ["1", "2"],
                "description": "Reforma tributária <sup>(RT)</sup>",
                "mapeadoNFSe": true,
                "mapeadoNacional": true,
                "required": false,
                "proibido": true,
                "reformaTributaria": true
            })
        );
    }

    #[test]
    fn children_nest_inside_parent_leaf() {
        let node = schema(json!({
            "type": "object",
            "properties": {"tomador": {"type": "object", "properties": {"cpf": {"type": "string"}}}}
        }));
        let empty = ReferencePathSet::default();
        let coverage = compare(&node, &PathPartition::default(), &empty, &empty).unwrap();
        let tomador = &coverage.document["tomador"];
        assert_eq!(tomador["type"], json!("object"));
        assert_eq!(tomador["cpf"]["type"], json!("string"));
        assert_eq!(coverage.stats.total, 2);
        assert_eq!(coverage.stats.exclusive, 2);
    }

    #[test]
    fn leaf_root_is_rejected() {
        let empty = ReferencePathSet::default();
        let result = compare(
            &schema(json!({"type": "object"})),
            &PathPartition::default(),
            &empty,
            &empty,
        );
        assert!(matches!(result, Err(Error::MalformedSchema)));
    }

    #[test]
    fn stats_count_every_dimension() {
        let node = schema(json!({
            "type": "object",
            "properties": {
                "a": {"type": "string", "description": "reforma tributária"},
                "b": {"type": "string"},
                "c": {"type": "string"}
            }
        }));
        let mut partition = PathPartition::default();
        partition.required.insert("$.a".into(), String::new());
        partition.ignored.insert("$.c".into(), String::new());
        let municipal: ReferencePathSet = ["a", "b"].into_iter().collect();
        let national: ReferencePathSet = ["b"].into_iter().collect();

        let stats = compare(&node, &partition, &municipal, &national).unwrap().stats;
        assert_eq!(
            stats,
            CoverageStats {
                total: 3,
                required: 1,
                prohibited: 1,
                mapped_municipal: 2,
                mapped_national: 1,
                exclusive: 1,
                tax_reform: 1,
            }
        );
        assert!(stats.to_string().contains("Exclusivos da cidade: 1"));
    }
}
