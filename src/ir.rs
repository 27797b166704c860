// Classified schema nodes. Built once by `classify`, immutable afterwards.

use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::Value;

use crate::naming;

pub type NodeRef = Rc<SchemaNode>;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeMeta {
    pub type_name: String,        // may be empty for anonymous nodes
    pub pointer: String,          // canonical pointer, unique per run
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl NodeMeta {
    /// Declared description, or the type name when none was given.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.type_name)
    }
}

#[derive(Debug, Clone)]
pub enum SchemaNode {
    Primitive(PrimitiveNode),
    Enum(EnumNode),
    Array(ArrayNode),
    Object(ObjectNode),
    Ref(RefNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone)]
pub struct PrimitiveNode {
    pub meta: NodeMeta,
    pub kind: PrimitiveKind,
    pub format: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct EnumNode {
    pub meta: NodeMeta,
    pub values: Vec<String>, // declaration order
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ArrayNode {
    pub meta: NodeMeta,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub items: NodeRef,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String, // raw JSON key
    pub node: NodeRef,
}

#[derive(Debug, Clone, Default)]
pub struct Discriminator {
    pub property_name: String,
    pub mapping: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub meta: NodeMeta,
    pub required: BTreeSet<String>,
    pub properties: Vec<Property>,
    pub all_of: Vec<NodeRef>,
    pub one_of: Vec<NodeRef>,
    pub items: Option<NodeRef>,
    pub additional_properties: Option<NodeRef>,
    pub legacy_ref: Option<String>,
    pub discriminator: Option<Discriminator>, // documentation only
}

#[derive(Debug, Clone)]
pub struct RefNode {
    pub meta: NodeMeta,
    pub target: String, // normalized pointer, resolved in phase 2
}

impl SchemaNode {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            SchemaNode::Primitive(n) => &n.meta,
            SchemaNode::Enum(n) => &n.meta,
            SchemaNode::Array(n) => &n.meta,
            SchemaNode::Object(n) => &n.meta,
            SchemaNode::Ref(n) => &n.meta,
        }
    }

    pub fn pointer(&self) -> &str { &self.meta().pointer }

    pub fn type_name(&self) -> &str { &self.meta().type_name }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaNode::Primitive(p) => match p.kind {
                PrimitiveKind::String => "string",
                PrimitiveKind::Integer => "integer",
                PrimitiveKind::Number => "number",
                PrimitiveKind::Boolean => "boolean",
            },
            SchemaNode::Enum(_) => "enum",
            SchemaNode::Array(_) => "array",
            SchemaNode::Object(_) => "object",
            SchemaNode::Ref(_) => "ref",
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            SchemaNode::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl EnumNode {
    /// One constant per declared literal, in declaration order.
    ///
    /// Constant names are UPPER_SNAKE_CASE; two literals that normalize to the
    /// same identifier get a numeric suffix so the count always matches.
    pub fn constants(&self) -> Vec<EnumConstant> {
        let mut seen = BTreeSet::new();
        self.values
            .iter()
            .map(|value| {
                let base = naming::to_constant_case(value);
                let mut name = base.clone();
                let mut n = 2;
                while !seen.insert(name.clone()) {
                    name = format!("{base}_{n}");
                    n += 1;
                }
                EnumConstant { name, value: value.clone() }
            })
            .collect()
    }

    /// Lookup by literal value; mirrors the emitted `of(String)` method.
    pub fn of(&self, value: &str) -> Option<EnumConstant> {
        self.constants().into_iter().find(|c| c.value == value)
    }
}

impl ObjectNode {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// No properties, allOf or oneOf members: rendered as raw JSON text.
    pub fn is_elementless(&self) -> bool {
        self.properties.is_empty() && self.all_of.is_empty() && self.one_of.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> NodeMeta {
        NodeMeta {
            type_name: name.to_string(),
            pointer: format!("#/{name}"),
            description: None,
            example: None,
        }
    }

    #[test]
    fn description_falls_back_to_type_name() {
        let mut m = meta("Pet");
        assert_eq!(m.description(), "Pet");
        m.description = Some("A pet".into());
        assert_eq!(m.description(), "A pet");
    }

    #[test]
    fn enum_constants_round_trip_through_of() {
        let node = EnumNode {
            meta: meta("Status"),
            values: vec!["in-progress".into(), "done".into(), "in_progress".into()],
        };
        let constants = node.constants();
        assert_eq!(constants.len(), node.values.len());
        assert_eq!(constants[0].name, "IN_PROGRESS");
        assert_eq!(constants[2].name, "IN_PROGRESS_2");
        for c in &constants {
            assert_eq!(node.of(&c.value).as_ref(), Some(c));
        }
        assert!(node.of("missing").is_none());
    }
}
