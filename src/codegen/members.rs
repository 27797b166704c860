//! Flatten an object node into the accessor members of its generated type.
//!
//! Order: own properties, then allOf members' fields (inlined, required),
//! then one nullable member per oneOf alternative.
use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;

use crate::error::{GenError, GenResult};
use crate::ir::{EnumNode, ObjectNode, PrimitiveKind, SchemaNode};
use crate::lower::{JavaType, TypeMapper};
use crate::naming;
use crate::registry::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Property,
    AllOf,
    OneOf,
}

/// How a value is materialized from its JSON source.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Scalar(JavaType), // int, long, double, boolean, String, OffsetDateTime
    RawJson,          // elementless object kept as JSON text
    Enum(String),
    Composite(String),
    Array { ty: JavaType, item: Box<Shape> },
}

#[derive(Debug, Clone)]
pub struct Member {
    pub origin: Origin,
    pub json_key: String, // never escaped
    pub field: String,    // escaped identifier
    pub getter: String,
    pub doc: String,
    pub example: Option<Value>,
    pub ty: JavaType,
    pub shape: Shape,
    pub nullable: bool,
    pub bounds: Option<(Option<f64>, Option<f64>)>,
    pub enums: Vec<EnumNode>,
}

impl Member {
    pub fn declared_type(&self) -> String {
        self.ty.render(self.nullable)
    }

    /// Integer bounds expressible as a range annotation.
    pub fn integer_range(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self.ty {
            JavaType::Int | JavaType::Long => self.bounds,
            _ => None,
        }
    }
}

pub struct MemberCollector<'s> {
    schema: &'s Schema,
    mapper: TypeMapper<'s>,
    reserved_suffix: &'s str,
}

impl<'s> MemberCollector<'s> {
    pub fn new(schema: &'s Schema, reserved_suffix: &'s str) -> Self {
        Self { schema, mapper: TypeMapper::new(schema), reserved_suffix }
    }

    pub fn collect(&self, object: &ObjectNode) -> GenResult<Vec<Member>> {
        let mut visiting = HashSet::new();
        let raw = self.collect_inner(object, &mut visiting)?;

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(raw.len());
        for m in raw {
            if seen.insert(m.field.clone()) {
                out.push(m);
            } else {
                tracing::warn!(
                    pointer = %object.meta.pointer,
                    field = %m.field,
                    "duplicate member dropped; first declaration wins"
                );
            }
        }
        Ok(out)
    }

    fn collect_inner(&self, object: &ObjectNode, visiting: &mut HashSet<String>) -> GenResult<Vec<Member>> {
        if !visiting.insert(object.meta.pointer.clone()) {
            return Err(GenError::CyclicReference(object.meta.pointer.clone()));
        }
        let mut out = Vec::new();

        for prop in &object.properties {
            // a ref's own description wins, then its target's
            let target = self.schema.deref_node(&prop.node)?;
            let doc = prop
                .node
                .meta()
                .description
                .clone()
                .or_else(|| target.meta().description.clone())
                .unwrap_or_else(|| prop.name.clone());
            let example = prop.node.meta().example.clone().or_else(|| target.meta().example.clone());
            let nullable = !object.is_required(&prop.name);
            out.push(self.member(Origin::Property, &prop.name, &prop.node, doc, example, nullable)?);
        }

        for part in &object.all_of {
            let target = self.schema.deref_node(part)?;
            let SchemaNode::Object(inner) = target else {
                return Err(GenError::Unsupported {
                    pointer: part.pointer().to_string(),
                    kind: target.kind_name(),
                    operation: "allOf inlining",
                });
            };
            for mut m in self.collect_inner(inner, visiting)? {
                if m.origin != Origin::OneOf {
                    m.origin = Origin::AllOf;
                    m.nullable = false;
                }
                out.push(m);
            }
        }

        for alt in &object.one_of {
            let target = self.schema.deref_node(alt)?;
            // keyed by the alternative's own type name
            let key = target.type_name().to_string();
            let doc = alt
                .meta()
                .description
                .clone()
                .or_else(|| target.meta().description.clone())
                .unwrap_or_else(|| key.clone());
            out.push(self.member(Origin::OneOf, &key, alt, doc, target.meta().example.clone(), true)?);
        }

        visiting.remove(&object.meta.pointer);
        Ok(out)
    }

    fn member(
        &self,
        origin: Origin,
        json_key: &str,
        node: &SchemaNode,
        doc: String,
        example: Option<Value>,
        nullable: bool,
    ) -> GenResult<Member> {
        let target = self.schema.deref_node(node)?;
        let ty = self.mapper.target_type(target)?;
        let field = naming::field_ident(json_key, self.reserved_suffix);
        let bounds = match target {
            SchemaNode::Primitive(p)
                if matches!(p.kind, PrimitiveKind::Integer | PrimitiveKind::Number)
                    && (p.minimum.is_some() || p.maximum.is_some()) =>
            {
                Some((p.minimum, p.maximum))
            }
            _ => None,
        };
        let mut enums = Vec::new();
        self.collect_enums(target, &mut enums, &mut Vec::new())?;
        Ok(Member {
            origin,
            json_key: json_key.to_string(),
            getter: naming::getter_name(&field),
            field,
            doc,
            example,
            ty,
            shape: self.shape(target)?,
            nullable,
            bounds,
            enums,
        })
    }

    pub fn shape(&self, node: &SchemaNode) -> GenResult<Shape> {
        self.shape_in(node, &mut Vec::new())
    }

    fn shape_in(&self, node: &SchemaNode, arrays: &mut Vec<String>) -> GenResult<Shape> {
        let node = self.schema.deref_node(node)?;
        Ok(match node {
            SchemaNode::Primitive(_) => Shape::Scalar(self.mapper.target_type(node)?),
            SchemaNode::Enum(e) => Shape::Enum(e.meta.type_name.clone()),
            SchemaNode::Object(o) if o.is_elementless() => Shape::RawJson,
            SchemaNode::Object(o) => Shape::Composite(o.meta.type_name.clone()),
            SchemaNode::Array(a) => {
                enter_array(arrays, &a.meta.pointer)?;
                let item = self.shape_in(&a.items, arrays)?;
                arrays.pop();
                Shape::Array { ty: self.mapper.target_type(node)?, item: Box::new(item) }
            }
            SchemaNode::Ref(r) => return Err(GenError::PointerNotFound(r.target.clone())),
        })
    }

    fn collect_enums(&self, node: &SchemaNode, out: &mut Vec<EnumNode>, arrays: &mut Vec<String>) -> GenResult<()> {
        match self.schema.deref_node(node)? {
            SchemaNode::Enum(e) => out.push(e.clone()),
            SchemaNode::Array(a) => {
                enter_array(arrays, &a.meta.pointer)?;
                self.collect_enums(&a.items, out, arrays)?;
                arrays.pop();
            }
            _ => {}
        }
        Ok(())
    }
}

/// Rename nested enums that would clash inside the contract of `owner`.
///
/// `taken` holds simple names already visible in the generated files
/// (`java.lang`, imports). The owner, every composite it references and their
/// implementation classes are added; a clashing enum becomes `<Name>Enum`.
pub fn scope_enum_names(owner: &str, impl_suffix: &str, members: &mut [Member], taken: &BTreeSet<String>) {
    let mut used = taken.clone();
    let mut composites = BTreeSet::new();
    composites.insert(owner.to_string());
    for m in members.iter() {
        composite_names(&m.ty, &mut composites);
    }
    for c in composites {
        used.insert(format!("{c}{impl_suffix}"));
        used.insert(c);
    }

    let mut assigned: HashMap<String, String> = HashMap::new();
    for m in members.iter_mut() {
        for e in m.enums.iter_mut() {
            let old = e.meta.type_name.clone();
            let name = match assigned.get(&e.meta.pointer) {
                Some(name) => name.clone(),
                None => {
                    let base = if used.contains(&old) { format!("{old}Enum") } else { old.clone() };
                    let mut name = base.clone();
                    let mut n = 2;
                    while used.contains(&name) {
                        name = format!("{base}{n}");
                        n += 1;
                    }
                    used.insert(name.clone());
                    assigned.insert(e.meta.pointer.clone(), name.clone());
                    name
                }
            };
            if name != old {
                rename_type(&mut m.ty, &old, &name);
                rename_shape(&mut m.shape, &old, &name);
                e.meta.type_name = name;
            }
        }
    }
}

fn composite_names(ty: &JavaType, out: &mut BTreeSet<String>) {
    match ty {
        JavaType::Composite(name) => {
            out.insert(name.clone());
        }
        JavaType::NativeArray(item) | JavaType::List(item) => composite_names(item, out),
        _ => {}
    }
}

fn rename_type(ty: &mut JavaType, from: &str, to: &str) {
    match ty {
        JavaType::Enum(name) if name == from => *name = to.to_string(),
        JavaType::NativeArray(item) | JavaType::List(item) => rename_type(item, from, to),
        _ => {}
    }
}

fn rename_shape(shape: &mut Shape, from: &str, to: &str) {
    match shape {
        Shape::Enum(name) if name == from => *name = to.to_string(),
        Shape::Array { ty, item } => {
            rename_type(ty, from, to);
            rename_shape(item, from, to);
        }
        _ => {}
    }
}

/// Arrays nest only through their items; meeting one twice is a cycle.
fn enter_array(arrays: &mut Vec<String>, pointer: &str) -> GenResult<()> {
    if arrays.iter().any(|p| p == pointer) {
        return Err(GenError::CyclicReference(pointer.to_string()));
    }
    arrays.push(pointer.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_document;
    use serde_json::json;

    fn collect(doc: Value, pointer: &str) -> GenResult<Vec<Member>> {
        let schema = classify_document(&doc, "#", "Root")?.resolve()?;
        let object = schema.registry().get(pointer).and_then(|n| n.as_object()).unwrap().clone();
        MemberCollector::new(&schema, "_").collect(&object)
    }

    #[test]
    fn properties_then_all_of_then_one_of() {
        let members = collect(
            json!({
                "Base": {"properties": {"id": {"type": "integer"}}},
                "Cat": {"properties": {"lives": {"type": "integer"}}},
                "Pet": {
                    "allOf": [{"$ref": "#/Base"}],
                    "oneOf": [{"$ref": "#/Cat"}],
                    "properties": {"name": {"type": "string"}}
                }
            }),
            "#/Pet",
        )
        .unwrap();
        let summary: Vec<_> = members.iter().map(|m| (m.origin, m.json_key.as_str(), m.nullable)).collect();
        assert_eq!(
            summary,
            [(Origin::Property, "name", true), (Origin::AllOf, "id", false), (Origin::OneOf, "Cat", true)]
        );
    }

    #[test]
    fn duplicate_identifiers_keep_the_first() {
        let members = collect(
            json!({"A": {"properties": {"user_id": {"type": "string"}, "userId": {"type": "integer"}}}}),
            "#/A",
        )
        .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].json_key, "user_id");
        assert_eq!(members[0].ty, JavaType::Text);
    }

    #[test]
    fn all_of_needs_objects_and_no_cycles() {
        let err = collect(json!({"A": {"allOf": [{"type": "string"}]}}), "#/A").unwrap_err();
        assert!(matches!(err, GenError::Unsupported { kind: "string", .. }));

        let err = collect(
            json!({"A": {"allOf": [{"$ref": "#/B"}]}, "B": {"allOf": [{"$ref": "#/A"}]}}),
            "#/A",
        )
        .unwrap_err();
        assert!(matches!(err, GenError::CyclicReference(_)));
    }

    #[test]
    fn ref_docs_fall_back_to_the_target_description() {
        let members = collect(
            json!({
                "Owner": {"description": "The owning person", "properties": {"name": {"type": "string"}}},
                "Pet": {
                    "properties": {
                        "owner": {"$ref": "#/Owner"},
                        "keeper": {"$ref": "#/Owner", "description": "Who feeds it"},
                        "vet": {"$ref": "#/Vet"}
                    }
                },
                "Vet": {"properties": {"clinic": {"type": "string"}}}
            }),
            "#/Pet",
        )
        .unwrap();
        let docs: Vec<_> = members.iter().map(|m| (m.json_key.as_str(), m.doc.as_str())).collect();
        assert_eq!(docs, [("owner", "The owning person"), ("keeper", "Who feeds it"), ("vet", "vet")]);
    }

    #[test]
    fn self_nested_arrays_are_cyclic() {
        let err = collect(
            json!({
                "Tree": {"type": "array", "items": {"$ref": "#/Tree"}},
                "Holder": {"properties": {"t": {"$ref": "#/Tree"}}}
            }),
            "#/Holder",
        )
        .unwrap_err();
        assert!(matches!(err, GenError::CyclicReference(_)));

        // an object reached through its own array is not a cycle
        let members = collect(
            json!({"Node": {"properties": {"children": {"type": "array", "items": {"$ref": "#/Node"}}}}}),
            "#/Node",
        )
        .unwrap();
        assert_eq!(members[0].shape, Shape::Array {
            ty: JavaType::List(Box::new(JavaType::Composite("Node".into()))),
            item: Box::new(Shape::Composite("Node".into())),
        });
    }
}
