//! Raw ESTree tree shared by the parser and the code generator
//!
//! A `RawNode` is a `type` tag plus an ordered list of fields. Field order is
//! the order the parser emits them in and is the order traversals visit them.

use serde_json::{Map, Number, Value as Json};
use thiserror::Error;

/// Errors that can occur when converting ESTree JSON
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("Expected an ESTree node object, found {0}")]
    NotANode(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A regular expression literal, kept as source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexLiteral {
    pub pattern: String,
    pub flags: String,
}

impl RegexLiteral {
    pub fn new(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            flags: flags.into(),
        }
    }
}

/// Leaf values stored in node fields
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Regex(RegexLiteral),
    /// Structured data without a `type` tag (`loc`, `range`, ...), passed through untouched
    Opaque(Json),
}

impl Scalar {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(f64::from(value))
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<RegexLiteral> for Scalar {
    fn from(value: RegexLiteral) -> Self {
        Scalar::Regex(value)
    }
}

/// A field value: a leaf, a nested node, or an ordered sequence
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(Scalar),
    Node(RawNode),
    List(Vec<RawValue>),
}

impl RawValue {
    pub fn null() -> Self {
        RawValue::Scalar(Scalar::Null)
    }

    pub fn as_node(&self) -> Option<&RawNode> {
        match self {
            RawValue::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            RawValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<RawNode> for RawValue {
    fn from(node: RawNode) -> Self {
        RawValue::Node(node)
    }
}

impl From<Option<RawNode>> for RawValue {
    fn from(node: Option<RawNode>) -> Self {
        node.map_or_else(RawValue::null, RawValue::Node)
    }
}

impl From<Scalar> for RawValue {
    fn from(scalar: Scalar) -> Self {
        RawValue::Scalar(scalar)
    }
}

impl From<Vec<RawNode>> for RawValue {
    fn from(nodes: Vec<RawNode>) -> Self {
        RawValue::List(nodes.into_iter().map(RawValue::Node).collect())
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(items: Vec<RawValue>) -> Self {
        RawValue::List(items)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Scalar(Scalar::from(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Scalar(Scalar::Bool(value))
    }
}

/// A syntax tree node as produced by the parser
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub kind: String,
    pub fields: Vec<(String, RawValue)>,
}

impl RawNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, builder style
    pub fn with(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Nested node stored under `key`, if any
    pub fn node(&self, key: &str) -> Option<&RawNode> {
        self.get(key).and_then(RawValue::as_node)
    }

    /// Sequence stored under `key`; empty when absent
    pub fn list(&self, key: &str) -> &[RawValue] {
        self.get(key).and_then(RawValue::as_list).unwrap_or(&[])
    }

    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.get(key).and_then(RawValue::as_scalar)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.scalar(key).and_then(Scalar::as_str)
    }

    pub fn bool(&self, key: &str) -> bool {
        self.scalar(key).and_then(Scalar::as_bool).unwrap_or(false)
    }

    /// Parse an ESTree JSON document
    pub fn from_json_str(json: &str) -> Result<Self, JsonError> {
        let value: Json = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Convert an ESTree JSON object into a raw node
    pub fn from_json(value: &Json) -> Result<Self, JsonError> {
        match value {
            Json::Object(map) if node_type(map).is_some() => Ok(node_from_map(map)),
            other => Err(JsonError::NotANode(describe(other))),
        }
    }

    /// Project back to ESTree JSON
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        map.insert("type".to_string(), Json::String(self.kind.clone()));
        let mut regex = None;
        for (key, value) in &self.fields {
            if let RawValue::Scalar(Scalar::Regex(literal)) = value {
                map.insert(key.clone(), Json::Null);
                regex = Some(literal);
            } else {
                map.insert(key.clone(), value_to_json(value));
            }
        }
        if let Some(literal) = regex {
            let mut inner = Map::new();
            inner.insert("pattern".to_string(), Json::String(literal.pattern.clone()));
            inner.insert("flags".to_string(), Json::String(literal.flags.clone()));
            map.insert("regex".to_string(), Json::Object(inner));
        }
        Json::Object(map)
    }
}

fn node_type(map: &Map<String, Json>) -> Option<&str> {
    map.get("type").and_then(Json::as_str)
}

fn node_from_map(map: &Map<String, Json>) -> RawNode {
    let kind = node_type(map).unwrap_or_default();
    let mut node = RawNode::new(kind);

    // ESTree stores regex literals as `value: null` plus a `regex` member
    let regex = if kind == "Literal" {
        map.get("regex").and_then(regex_from_json)
    } else {
        None
    };

    for (key, value) in map {
        match key.as_str() {
            "type" => {}
            "regex" if regex.is_some() => {}
            "value" if regex.is_some() => {
                let literal = regex.clone().unwrap_or_else(|| RegexLiteral::new("", ""));
                node.fields
                    .push((key.clone(), RawValue::Scalar(Scalar::Regex(literal))));
            }
            _ => node.fields.push((key.clone(), value_from_json(value))),
        }
    }
    node
}

fn regex_from_json(value: &Json) -> Option<RegexLiteral> {
    let pattern = value.get("pattern")?.as_str()?;
    let flags = value.get("flags").and_then(Json::as_str).unwrap_or("");
    Some(RegexLiteral::new(pattern, flags))
}

fn value_from_json(value: &Json) -> RawValue {
    match value {
        Json::Null => RawValue::null(),
        Json::Bool(b) => RawValue::Scalar(Scalar::Bool(*b)),
        Json::Number(n) => RawValue::Scalar(Scalar::Number(n.as_f64().unwrap_or(f64::NAN))),
        Json::String(s) => RawValue::Scalar(Scalar::String(s.clone())),
        Json::Array(items) => RawValue::List(items.iter().map(value_from_json).collect()),
        Json::Object(map) if node_type(map).is_some() => RawValue::Node(node_from_map(map)),
        Json::Object(_) => RawValue::Scalar(Scalar::Opaque(value.clone())),
    }
}

fn value_to_json(value: &RawValue) -> Json {
    match value {
        RawValue::Node(node) => node.to_json(),
        RawValue::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        RawValue::Scalar(scalar) => scalar_to_json(scalar),
    }
}

fn scalar_to_json(scalar: &Scalar) -> Json {
    match scalar {
        Scalar::Null => Json::Null,
        Scalar::Bool(b) => Json::Bool(*b),
        Scalar::Number(n) => number_to_json(*n),
        Scalar::String(s) => Json::String(s.clone()),
        Scalar::Regex(literal) => {
            let mut inner = Map::new();
            inner.insert("pattern".to_string(), Json::String(literal.pattern.clone()));
            inner.insert("flags".to_string(), Json::String(literal.flags.clone()));
            Json::Object(inner)
        }
        Scalar::Opaque(json) => json.clone(),
    }
}

fn number_to_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Json::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Json::Null, Json::Number)
    }
}

fn describe(value: &Json) -> String {
    match value {
        Json::Null => "null".to_string(),
        Json::Bool(_) => "a boolean".to_string(),
        Json::Number(_) => "a number".to_string(),
        Json::String(_) => "a string".to_string(),
        Json::Array(_) => "an array".to_string(),
        Json::Object(_) => "an object without a `type`".to_string(),
    }
}
