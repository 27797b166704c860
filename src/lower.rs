// Type mapping: schema node → generated Java type.

use std::collections::BTreeSet;

use crate::error::{GenError, GenResult};
use crate::ir::{ArrayNode, PrimitiveKind, PrimitiveNode, SchemaNode};
use crate::registry::Schema;

pub const DATE_TIME_IMPORT: &str = "java.time.OffsetDateTime";
pub const LIST_IMPORT: &str = "java.util.List";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    Int,
    Long,
    Double,
    Boolean,
    Text,                      // String; also raw JSON text of elementless objects
    DateTime,                  // OffsetDateTime
    Enum(String),              // nested enum of the owning contract
    Composite(String),         // generated interface
    NativeArray(Box<JavaType>),
    List(Box<JavaType>),
}

impl JavaType {
    /// Primitives cannot be null and never carry a nullability annotation.
    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Int | JavaType::Long | JavaType::Double | JavaType::Boolean)
    }

    /// Declared type; nullable primitives are boxed.
    pub fn render(&self, nullable: bool) -> String {
        match self {
            JavaType::Int if nullable => "Integer".into(),
            JavaType::Long if nullable => "Long".into(),
            JavaType::Double if nullable => "Double".into(),
            JavaType::Boolean if nullable => "Boolean".into(),
            JavaType::Int => "int".into(),
            JavaType::Long => "long".into(),
            JavaType::Double => "double".into(),
            JavaType::Boolean => "boolean".into(),
            JavaType::Text => "String".into(),
            JavaType::DateTime => "OffsetDateTime".into(),
            JavaType::Enum(name) | JavaType::Composite(name) => name.clone(),
            JavaType::NativeArray(item) => format!("{}[]", item.render(false)),
            JavaType::List(item) => format!("List<{}>", item.render(true)),
        }
    }

    pub fn collect_imports(&self, out: &mut BTreeSet<String>) {
        match self {
            JavaType::DateTime => {
                out.insert(DATE_TIME_IMPORT.to_string());
            }
            JavaType::NativeArray(item) => item.collect_imports(out),
            JavaType::List(item) => {
                out.insert(LIST_IMPORT.to_string());
                item.collect_imports(out);
            }
            _ => {}
        }
    }
}

/// 32-bit iff `format: int32`, or both bounds are declared and fit in `i32`.
pub fn integer_is_32bit(node: &PrimitiveNode) -> bool {
    if node.format.as_deref() == Some("int32") {
        return true;
    }
    let fits = |v: f64| v >= i32::MIN as f64 && v <= i32::MAX as f64;
    matches!((node.minimum, node.maximum), (Some(lo), Some(hi)) if fits(lo) && fits(hi))
}

pub struct TypeMapper<'s> {
    schema: &'s Schema,
}

impl<'s> TypeMapper<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    pub fn target_type(&self, node: &SchemaNode) -> GenResult<JavaType> {
        self.target_type_in(node, &mut Vec::new())
    }

    // `arrays` holds the array pointers currently being mapped
    fn target_type_in(&self, node: &SchemaNode, arrays: &mut Vec<String>) -> GenResult<JavaType> {
        Ok(match node {
            SchemaNode::Primitive(p) => primitive_type(p),
            SchemaNode::Enum(e) => JavaType::Enum(e.meta.type_name.clone()),
            SchemaNode::Array(a) => self.array_type(a, arrays)?,
            SchemaNode::Object(o) if o.is_elementless() => JavaType::Text,
            SchemaNode::Object(o) => JavaType::Composite(o.meta.type_name.clone()),
            SchemaNode::Ref(r) => self.target_type_in(self.schema.delegate_to(r)?, arrays)?,
        })
    }

    fn array_type(&self, node: &ArrayNode, arrays: &mut Vec<String>) -> GenResult<JavaType> {
        if arrays.contains(&node.meta.pointer) {
            return Err(GenError::CyclicReference(node.meta.pointer.clone()));
        }
        arrays.push(node.meta.pointer.clone());
        let item = self.schema.deref_node(&node.items)?;
        let item_type = self.target_type_in(item, arrays)?;
        arrays.pop();
        Ok(if item_type.is_primitive() {
            JavaType::NativeArray(Box::new(item_type))
        } else {
            JavaType::List(Box::new(item_type))
        })
    }
}

fn primitive_type(p: &PrimitiveNode) -> JavaType {
    match p.kind {
        PrimitiveKind::Integer if integer_is_32bit(p) => JavaType::Int,
        PrimitiveKind::Integer => JavaType::Long,
        PrimitiveKind::Number => JavaType::Double,
        PrimitiveKind::Boolean => JavaType::Boolean,
        PrimitiveKind::String if p.format.as_deref() == Some("date-time") => JavaType::DateTime,
        PrimitiveKind::String => JavaType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_document;
    use serde_json::json;

    fn schema(doc: serde_json::Value) -> Schema {
        classify_document(&doc, "#", "Root").unwrap().resolve().unwrap()
    }

    fn mapped(schema: &Schema, pointer: &str) -> JavaType {
        let node = schema.registry().get(pointer).unwrap();
        TypeMapper::new(schema).target_type(node).unwrap()
    }

    #[test]
    fn integer_width_selection() {
        let s = schema(json!({
            "A": {"type": "integer", "format": "int32"},
            "B": {"type": "integer"},
            "C": {"type": "integer", "minimum": 0, "maximum": 100},
            "D": {"type": "integer", "minimum": 0},
            "E": {"type": "integer", "minimum": 0, "maximum": 4294967296u64},
            "F": {"type": "integer", "format": "int64", "minimum": -5, "maximum": 5}
        }));
        assert_eq!(mapped(&s, "#/A"), JavaType::Int);
        assert_eq!(mapped(&s, "#/B"), JavaType::Long);
        assert_eq!(mapped(&s, "#/C"), JavaType::Int);
        assert_eq!(mapped(&s, "#/D"), JavaType::Long);
        assert_eq!(mapped(&s, "#/E"), JavaType::Long);
        assert_eq!(mapped(&s, "#/F"), JavaType::Int);
    }

    #[test]
    fn strings_numbers_and_objects() {
        let s = schema(json!({
            "When": {"type": "string", "format": "date-time"},
            "Name": {"type": "string"},
            "Amount": {"type": "number", "format": "float"},
            "Free": {"type": "object", "additionalProperties": true},
            "Pet": {"properties": {"name": {"type": "string"}}}
        }));
        assert_eq!(mapped(&s, "#/When"), JavaType::DateTime);
        assert_eq!(mapped(&s, "#/Name"), JavaType::Text);
        assert_eq!(mapped(&s, "#/Amount"), JavaType::Double);
        assert_eq!(mapped(&s, "#/Free"), JavaType::Text);
        assert_eq!(mapped(&s, "#/Pet"), JavaType::Composite("Pet".into()));
    }

    #[test]
    fn arrays_pick_native_or_list() {
        let s = schema(json!({
            "Pet": {"properties": {"name": {"type": "string"}}},
            "Coords": {"type": "array", "items": {"type": "number"}},
            "Flags": {"type": "array", "items": {"type": "boolean"}},
            "Names": {"type": "array", "items": {"type": "string"}},
            "Pets": {"type": "array", "items": {"$ref": "#/Pet"}},
            "Grid": {"type": "array", "items": {"type": "array", "items": {"type": "integer", "format": "int32"}}}
        }));
        assert_eq!(mapped(&s, "#/Coords"), JavaType::NativeArray(Box::new(JavaType::Double)));
        assert_eq!(mapped(&s, "#/Flags").render(false), "boolean[]");
        assert_eq!(mapped(&s, "#/Names").render(false), "List<String>");
        assert_eq!(mapped(&s, "#/Pets"), JavaType::List(Box::new(JavaType::Composite("Pet".into()))));
        assert_eq!(mapped(&s, "#/Grid").render(false), "List<int[]>");
    }

    #[test]
    fn refs_map_like_their_targets() {
        let s = schema(json!({
            "Holder": {"properties": {
                "a": {"$ref": "#/Id"},
                "b": {"$ref": "#/Pet"},
                "c": {"$ref": "#/Alias"}
            }},
            "Alias": {"$ref": "#/Pet"},
            "Id": {"type": "integer", "format": "int32"},
            "Pet": {"properties": {"name": {"type": "string"}}}
        }));
        let mapper = TypeMapper::new(&s);
        let holder = s.registry().get("#/Holder").unwrap().as_object().unwrap().clone();
        for prop in &holder.properties {
            let SchemaNode::Ref(r) = prop.node.as_ref() else { panic!("expected ref") };
            let target = s.delegate_to(r).unwrap();
            assert_eq!(
                mapper.target_type(&prop.node).unwrap(),
                mapper.target_type(target).unwrap(),
            );
        }
    }

    #[test]
    fn nullable_primitives_are_boxed() {
        assert_eq!(JavaType::Int.render(true), "Integer");
        assert_eq!(JavaType::Int.render(false), "int");
        assert_eq!(JavaType::Text.render(true), "String");
        let mut imports = BTreeSet::new();
        JavaType::List(Box::new(JavaType::DateTime)).collect_imports(&mut imports);
        assert_eq!(imports.into_iter().collect::<Vec<_>>(), [DATE_TIME_IMPORT, LIST_IMPORT]);
    }

    #[test]
    fn self_nested_arrays_are_cyclic() {
        let s = schema(json!({
            "Tree": {"type": "array", "items": {"$ref": "#/Tree"}},
            "Forest": {"type": "array", "items": {"type": "array", "items": {"$ref": "#/Forest"}}},
            "Node": {"properties": {"children": {"type": "array", "items": {"$ref": "#/Node"}}}}
        }));
        let mapper = TypeMapper::new(&s);
        for pointer in ["#/Tree", "#/Forest"] {
            let err = mapper.target_type(s.registry().get(pointer).unwrap()).unwrap_err();
            assert!(matches!(err, GenError::CyclicReference(ref p) if p == pointer));
        }
        // recursion through an object is fine
        assert_eq!(mapped(&s, "#/Node/properties/children").render(false), "List<Node>");
    }
}
