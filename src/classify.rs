//! Phase 1: walk the raw document, classify every node, fill the registry.
//!
//! Dispatch rules:
//! - no `type`, `$ref` present      → Ref (recorded, never registered)
//! - no `type`, no `$ref`           → Object
//! - `type: "string"` + enum ≥ 2    → Enum (a one-entry enum stays a plain string)
//! - otherwise                      → by declared type
//!
//! Every node's keys must be a subset of the keys recognized for its kind.
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{GenError, GenResult};
use crate::ir::*;
use crate::naming;
use crate::registry::Registry;

// ------------------------------ Key sets ---------------------------------- //

const REF_KEYS: &[&str] = &["$ref", "description", "example"];
const STRING_KEYS: &[&str] = &["type", "description", "example", "format", "pattern", "minLength", "enum"];
const NUMERIC_KEYS: &[&str] = &["type", "description", "example", "format", "minimum", "maximum"];
const BOOLEAN_KEYS: &[&str] = &["type", "description", "example"];
const ARRAY_KEYS: &[&str] = &["type", "description", "example", "items", "minItems", "maxItems", "uniqueItems"];
const OBJECT_KEYS: &[&str] = &[
    "type", "$ref", "description", "example", "required", "properties", "allOf",
    "oneOf", "additionalProperties", "items", "discriminator",
];

/// Keys that only make sense on the document itself, never on a schema node.
const DOCUMENT_KEYS: &[&str] = &["$schema", "$id", "title", "definitions", "$defs"];

fn is_schema_key(key: &str) -> bool {
    [REF_KEYS, STRING_KEYS, NUMERIC_KEYS, ARRAY_KEYS, OBJECT_KEYS]
        .iter()
        .any(|set| set.contains(&key))
}

fn validate_keys(map: &Map<String, Value>, allowed: &[&str], kind: &'static str, pointer: &str) -> GenResult<()> {
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(GenError::UnknownKey {
            pointer: pointer.to_string(),
            kind,
            key: key.clone(),
        }),
        None => Ok(()),
    }
}

// ------------------------------ Pointers ---------------------------------- //

/// Append one reference token, escaped per RFC 6901.
pub fn child_pointer(base: &str, token: &str) -> String {
    format!("{base}/{}", token.replace('~', "~0").replace('/', "~1"))
}

fn normalize_ref(raw: &Value, pointer: &str) -> GenResult<String> {
    let s = raw
        .as_str()
        .ok_or_else(|| GenError::invalid(pointer, "`$ref` must be a string"))?
        .trim();
    if s.is_empty() {
        return Err(GenError::invalid(pointer, "`$ref` is empty"));
    }
    Ok(s.trim_end_matches('/').to_string())
}

// ------------------------------ Field readers ----------------------------- //

fn opt_str(map: &Map<String, Value>, key: &str, pointer: &str) -> GenResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(GenError::invalid(pointer, format!("`{key}` must be a string"))),
    }
}

fn opt_f64(map: &Map<String, Value>, key: &str, pointer: &str) -> GenResult<Option<f64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| GenError::invalid(pointer, format!("`{key}` must be a number"))),
    }
}

fn opt_u64(map: &Map<String, Value>, key: &str, pointer: &str) -> GenResult<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| GenError::invalid(pointer, format!("`{key}` must be a non-negative integer"))),
    }
}

fn opt_bool(map: &Map<String, Value>, key: &str, pointer: &str) -> GenResult<bool> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(GenError::invalid(pointer, format!("`{key}` must be a boolean"))),
    }
}

fn string_list(map: &Map<String, Value>, key: &str, pointer: &str) -> GenResult<Vec<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(xs)) => xs
            .iter()
            .map(|x| {
                x.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| GenError::invalid(pointer, format!("`{key}` entries must be strings")))
            })
            .collect(),
        Some(_) => Err(GenError::invalid(pointer, format!("`{key}` must be an array"))),
    }
}

fn node_list<'v>(map: &'v Map<String, Value>, key: &str, pointer: &str) -> GenResult<&'v [Value]> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(xs)) => Ok(xs.as_slice()),
        Some(_) => Err(GenError::invalid(pointer, format!("`{key}` must be an array"))),
    }
}

fn discriminator(map: &Map<String, Value>, pointer: &str) -> GenResult<Option<Discriminator>> {
    let Some(raw) = map.get("discriminator") else { return Ok(None) };
    let at = child_pointer(pointer, "discriminator");
    let obj = raw
        .as_object()
        .ok_or_else(|| GenError::invalid(&at, "discriminator must be an object"))?;
    let property_name = opt_str(obj, "propertyName", &at)?.unwrap_or_default();
    let mut mapping = Vec::new();
    if let Some(m) = obj.get("mapping").and_then(Value::as_object) {
        for (k, v) in m {
            let target = v
                .as_str()
                .ok_or_else(|| GenError::invalid(&at, "discriminator mapping values must be strings"))?;
            mapping.push((k.clone(), target.to_string()));
        }
    }
    Ok(Some(Discriminator { property_name, mapping }))
}

// ------------------------------ Classifier -------------------------------- //

pub struct Classifier<'r> {
    registry: &'r mut Registry,
}

impl<'r> Classifier<'r> {
    pub fn new(registry: &'r mut Registry) -> Self {
        Self { registry }
    }

    /// Classify `raw` located at `pointer`, registering it (and its subtree).
    pub fn classify(&mut self, raw: &Value, hint: &str, pointer: &str) -> GenResult<NodeRef> {
        let map = raw
            .as_object()
            .ok_or_else(|| GenError::invalid(pointer, "schema node must be a JSON object"))?;
        for key in map.keys() {
            self.registry.report_mut().count_key(key);
        }

        let node = match map.get("type") {
            None if map.contains_key("$ref") => {
                validate_keys(map, REF_KEYS, "ref", pointer)?;
                let target = normalize_ref(&map["$ref"], pointer)?;
                self.registry.record_ref(pointer, &target);
                self.registry.report_mut().count_node("ref");
                let meta = self.meta(map, hint.to_string(), pointer)?;
                tracing::debug!(%pointer, %target, "classified ref");
                // refs are aliases: handed to the parent, not registered
                return Ok(Rc::new(SchemaNode::Ref(RefNode { meta, target })));
            }
            None => self.object(map, hint, pointer)?,
            Some(Value::String(declared)) => match declared.as_str() {
                "string" if is_enum(map, pointer)? => self.enumeration(map, hint, pointer)?,
                "string" => self.primitive(map, PrimitiveKind::String, hint, pointer)?,
                "integer" => self.primitive(map, PrimitiveKind::Integer, hint, pointer)?,
                "number" => self.primitive(map, PrimitiveKind::Number, hint, pointer)?,
                "boolean" => self.primitive(map, PrimitiveKind::Boolean, hint, pointer)?,
                "array" => self.array(map, hint, pointer)?,
                "object" => self.object(map, hint, pointer)?,
                other => {
                    return Err(GenError::UnrecognizedType {
                        pointer: pointer.to_string(),
                        declared: other.to_string(),
                    })
                }
            },
            Some(other) => {
                return Err(GenError::UnrecognizedType {
                    pointer: pointer.to_string(),
                    declared: other.to_string(),
                })
            }
        };

        let node = Rc::new(node);
        self.registry.register(node.clone())?;
        Ok(node)
    }

    fn meta(&self, map: &Map<String, Value>, type_name: String, pointer: &str) -> GenResult<NodeMeta> {
        Ok(NodeMeta {
            type_name,
            pointer: pointer.to_string(),
            description: opt_str(map, "description", pointer)?,
            example: map.get("example").cloned(),
        })
    }

    fn primitive(&mut self, map: &Map<String, Value>, kind: PrimitiveKind, hint: &str, pointer: &str) -> GenResult<SchemaNode> {
        let (allowed, kind_name) = match kind {
            PrimitiveKind::String => (STRING_KEYS, "string"),
            PrimitiveKind::Integer => (NUMERIC_KEYS, "integer"),
            PrimitiveKind::Number => (NUMERIC_KEYS, "number"),
            PrimitiveKind::Boolean => (BOOLEAN_KEYS, "boolean"),
        };
        validate_keys(map, allowed, kind_name, pointer)?;
        Ok(SchemaNode::Primitive(PrimitiveNode {
            meta: self.meta(map, hint.to_string(), pointer)?,
            kind,
            format: opt_str(map, "format", pointer)?,
            minimum: opt_f64(map, "minimum", pointer)?,
            maximum: opt_f64(map, "maximum", pointer)?,
            pattern: opt_str(map, "pattern", pointer)?,
            min_length: opt_u64(map, "minLength", pointer)?,
        }))
    }

    fn enumeration(&mut self, map: &Map<String, Value>, hint: &str, pointer: &str) -> GenResult<SchemaNode> {
        validate_keys(map, STRING_KEYS, "enum", pointer)?;
        let values = string_list(map, "enum", pointer)?;
        let mut seen = BTreeSet::new();
        if let Some(dup) = values.iter().find(|v| !seen.insert(v.as_str())) {
            return Err(GenError::invalid(pointer, format!("duplicate enum literal {dup:?}")));
        }
        Ok(SchemaNode::Enum(EnumNode {
            meta: self.meta(map, naming::to_pascal_case(hint), pointer)?,
            values,
        }))
    }

    fn array(&mut self, map: &Map<String, Value>, hint: &str, pointer: &str) -> GenResult<SchemaNode> {
        validate_keys(map, ARRAY_KEYS, "array", pointer)?;
        let raw_items = map
            .get("items")
            .ok_or_else(|| GenError::invalid(pointer, "array node has no `items`"))?;
        let items = self.classify(raw_items, &format!("{hint}Item"), &child_pointer(pointer, "items"))?;
        Ok(SchemaNode::Array(ArrayNode {
            meta: self.meta(map, hint.to_string(), pointer)?,
            min_items: opt_u64(map, "minItems", pointer)?,
            max_items: opt_u64(map, "maxItems", pointer)?,
            unique_items: opt_bool(map, "uniqueItems", pointer)?,
            items,
        }))
    }

    fn object(&mut self, map: &Map<String, Value>, hint: &str, pointer: &str) -> GenResult<SchemaNode> {
        validate_keys(map, OBJECT_KEYS, "object", pointer)?;
        let type_name = self.registry.type_name_for(pointer, &naming::to_pascal_case(hint));
        let meta = self.meta(map, type_name.clone(), pointer)?;

        let required: BTreeSet<String> = string_list(map, "required", pointer)?.into_iter().collect();

        let mut properties = Vec::new();
        match map.get("properties") {
            None | Some(Value::Null) => {}
            Some(Value::Object(props)) => {
                let base = child_pointer(pointer, "properties");
                for (name, raw) in props {
                    let node = self.classify(raw, name, &child_pointer(&base, name))?;
                    properties.push(Property { name: name.clone(), node });
                }
            }
            Some(_) => return Err(GenError::invalid(pointer, "`properties` must be an object")),
        }

        let all_of = self.members(map, "allOf", &type_name, "AllOf", pointer)?;
        let one_of = self.members(map, "oneOf", &type_name, "OneOf", pointer)?;

        let items = match map.get("items") {
            Some(raw) => Some(self.classify(raw, &format!("{type_name}Item"), &child_pointer(pointer, "items"))?),
            None => None,
        };
        let additional_properties = match map.get("additionalProperties") {
            None | Some(Value::Bool(_)) | Some(Value::Null) => None,
            Some(raw) => Some(self.classify(
                raw,
                &format!("{type_name}Value"),
                &child_pointer(pointer, "additionalProperties"),
            )?),
        };

        let legacy_ref = match map.get("$ref") {
            Some(raw) => {
                let target = normalize_ref(raw, pointer)?;
                self.registry.record_legacy_ref(pointer, &target);
                Some(target)
            }
            None => None,
        };

        Ok(SchemaNode::Object(ObjectNode {
            meta,
            required,
            properties,
            all_of,
            one_of,
            items,
            additional_properties,
            legacy_ref,
            discriminator: discriminator(map, pointer)?,
        }))
    }

    fn members(&mut self, map: &Map<String, Value>, key: &str, owner: &str, label: &str, pointer: &str) -> GenResult<Vec<NodeRef>> {
        let base = child_pointer(pointer, key);
        node_list(map, key, pointer)?
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                self.classify(raw, &format!("{owner}{label}{}", i + 1), &child_pointer(&base, &i.to_string()))
            })
            .collect()
    }
}

fn is_enum(map: &Map<String, Value>, pointer: &str) -> GenResult<bool> {
    match map.get("enum") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Array(xs)) => Ok(xs.len() >= 2),
        Some(_) => Err(GenError::invalid(pointer, "`enum` must be an array")),
    }
}

// ------------------------------ Document entry ---------------------------- //

/// Classify a whole document whose root sits at `base` (usually `#`).
///
/// Recognizes OpenAPI `components.schemas`, JSON Schema `definitions`/`$defs`,
/// a bare root schema (named `root_type`), or a plain name → schema map.
pub fn classify_document(doc: &Value, base: &str, root_type: &str) -> GenResult<Registry> {
    let root = doc
        .as_object()
        .ok_or_else(|| GenError::invalid(base, "document root must be a JSON object"))?;
    let mut registry = Registry::new();
    let mut classifier = Classifier::new(&mut registry);

    if let Some(schemas) = root.get("components").and_then(|c| c.get("schemas")) {
        let at = child_pointer(&child_pointer(base, "components"), "schemas");
        classifier.reserve_definitions(schemas, &at)?;
        classifier.definitions(schemas, &at)?;
    } else if root.contains_key("definitions") || root.contains_key("$defs") {
        let schema: Map<String, Value> = root
            .iter()
            .filter(|(k, _)| !DOCUMENT_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let has_root = !schema.is_empty();
        let schema = Value::Object(schema);
        if has_root && is_object_schema(&schema) {
            classifier.registry.reserve_type_name(base, &naming::to_pascal_case(root_type));
        }
        for key in ["definitions", "$defs"] {
            if let Some(defs) = root.get(key) {
                classifier.reserve_definitions(defs, &child_pointer(base, key))?;
            }
        }
        for key in ["definitions", "$defs"] {
            if let Some(defs) = root.get(key) {
                classifier.definitions(defs, &child_pointer(base, key))?;
            }
        }
        if has_root {
            classifier.classify(&schema, root_type, base)?;
        }
    } else if !root.is_empty() && root.keys().all(|k| is_schema_key(k)) {
        classifier.classify(doc, root_type, base)?;
    } else {
        classifier.reserve_definitions(doc, base)?;
        classifier.definitions(doc, base)?;
    }

    tracing::info!(nodes = registry.len(), "classified document");
    Ok(registry)
}

/// Would `raw` classify as an object node?
fn is_object_schema(raw: &Value) -> bool {
    match raw.get("type") {
        None => raw.get("$ref").is_none(),
        Some(t) => t == "object",
    }
}

impl Classifier<'_> {
    /// Top-level object definitions keep their own names; inline objects
    /// walked earlier take the suffixed ones.
    fn reserve_definitions(&mut self, defs: &Value, base: &str) -> GenResult<()> {
        let defs = defs
            .as_object()
            .ok_or_else(|| GenError::invalid(base, "schema map must be a JSON object"))?;
        for (name, raw) in defs.iter().filter(|(_, raw)| is_object_schema(raw)) {
            self.registry.reserve_type_name(&child_pointer(base, name), &naming::to_pascal_case(name));
        }
        Ok(())
    }

    fn definitions(&mut self, defs: &Value, base: &str) -> GenResult<()> {
        let defs = defs
            .as_object()
            .ok_or_else(|| GenError::invalid(base, "schema map must be a JSON object"))?;
        for (name, raw) in defs {
            self.classify(raw, name, &child_pointer(base, name))?;
        }
        Ok(())
    }
}
