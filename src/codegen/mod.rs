//! Source emission: one contract interface plus one parsing implementation
//! per non-elementless object node.
pub mod emit;
pub mod enums;
pub mod members;
pub mod unit;
pub mod writer;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::{simple_name, GeneratorConfig};
use crate::error::{GenError, GenResult};
use crate::ir::{EnumNode, ObjectNode, SchemaNode};
use crate::registry::Schema;

use emit::MemberEmitter;
use members::{scope_enum_names, Member, MemberCollector};
use unit::{assemble, Imports};
use writer::{example_doc, JavaWriter};

const GENERATED_ANNOTATION: &str = "javax.annotation.processing.Generated";
const GENERATOR_NAME: &str = "json-bindgen";

/// `java.lang` and fixed-import simple names a nested enum must not shadow.
const VISIBLE_NAMES: &[&str] = &[
    "Object", "String", "Integer", "Long", "Double", "Boolean", "Byte", "Short", "Float",
    "Character", "Number", "Math", "System", "Enum", "Class", "Void", "Record", "Iterable",
    "Comparable", "Cloneable", "Throwable", "Exception", "Error", "RuntimeException",
    "IllegalArgumentException", "Override", "Deprecated", "SuppressWarnings",
    "List", "ArrayList", "Collections", "OffsetDateTime", "Generated",
];

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Contract,
    Implementation,
}

/// One generated file, addressed by the canonical pointer of its object.
#[derive(Debug, Clone, Serialize)]
pub struct SourceUnit {
    pub pointer: String,
    pub type_name: String,
    pub file_name: String,
    pub kind: UnitKind,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct UnitPair {
    pub contract: SourceUnit,
    pub implementation: SourceUnit,
}

pub struct Codegen<'s> {
    schema: &'s Schema,
    config: &'s GeneratorConfig,
    collector: MemberCollector<'s>,
    stamp: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'s> Codegen<'s> {
    pub fn new(schema: &'s Schema, config: &'s GeneratorConfig) -> Self {
        let stamp = config
            .stamp_generated
            .then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        Self {
            schema,
            config,
            collector: MemberCollector::new(schema, &config.reserved_suffix),
            stamp,
        }
    }

    /// Fixed `@Generated` date, for reproducible output.
    pub fn with_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.stamp = Some(stamp.into());
        self
    }

    /// Whole-file emission for any node; only objects stand alone.
    pub fn emit_node(&self, node: &SchemaNode) -> GenResult<UnitPair> {
        match node {
            SchemaNode::Object(object) => self.emit_object(object),
            other => Err(GenError::Unsupported {
                pointer: other.pointer().to_string(),
                kind: other.kind_name(),
                operation: "emit",
            }),
        }
    }

    pub fn emit_object(&self, object: &ObjectNode) -> GenResult<UnitPair> {
        if object.is_elementless() {
            return Err(GenError::Unsupported {
                pointer: object.meta.pointer.clone(),
                kind: "elementless object",
                operation: "emit",
            });
        }
        let mut members = self.collector.collect(object)?;
        scope_enum_names(&object.meta.type_name, &self.config.impl_suffix, &mut members, &self.visible_names());
        let contract = self.contract(object, &members)?;
        let implementation = self.implementation(object, &members);
        Ok(UnitPair { contract, implementation })
    }

    /// Every emittable object in registration order, contract first.
    pub fn emit_all(&self) -> GenResult<Vec<SourceUnit>> {
        let mut out = Vec::new();
        for object in self.schema.objects().filter(|o| !o.is_elementless()) {
            let pair = self.emit_object(object)?;
            for unit in [pair.contract, pair.implementation] {
                tracing::debug!(pointer = %unit.pointer, file = %unit.file_name, "emitted unit");
                out.push(unit);
            }
        }
        Ok(out)
    }

    fn visible_names(&self) -> BTreeSet<String> {
        let configured = [
            &self.config.not_null_annotation,
            &self.config.nullable_annotation,
            &self.config.range_annotation,
            &self.config.parse_exception,
        ];
        VISIBLE_NAMES
            .iter()
            .chain(&["JSONObject", "JSONArray"])
            .map(|s| s.to_string())
            .chain(configured.into_iter().map(|q| simple_name(q).to_string()))
            .collect()
    }

    fn stamp_line(&self, imports: &mut Imports, w: &mut JavaWriter) {
        if let Some(date) = &self.stamp {
            let ann = imports.annotation(GENERATED_ANNOTATION);
            w.line(format!("{ann}(value = \"{GENERATOR_NAME}\", date = \"{date}\")"));
        }
    }

    fn contract(&self, object: &ObjectNode, members: &[Member]) -> GenResult<SourceUnit> {
        let name = &object.meta.type_name;
        let emitter = MemberEmitter::new(self.config);
        let mut imports = Imports::new(&self.config.package);
        let mut w = JavaWriter::new();

        let mut doc = vec![object.meta.description().to_string()];
        if let Some(example) = &object.meta.example {
            doc.push(example_doc(example));
        }
        if let Some(d) = &object.discriminator {
            doc.push(format!("<p>Discriminator: <code>{}</code>", d.property_name));
            for (value, target) in &d.mapping {
                doc.push(format!("<br><code>{value}</code>: {target}"));
            }
        }
        if let Some(target) = self.schema.legacy_target(object)? {
            if !target.type_name().is_empty() {
                doc.push(format!("@see {}", target.type_name()));
            }
        }
        w.doc(doc);
        self.stamp_line(&mut imports, &mut w);
        w.open(format!("public interface {name}"));

        let mut first = true;
        for e in nested_enums(members) {
            if !first {
                w.blank();
            }
            first = false;
            enums::emit_enum(e, &mut w);
        }
        for m in members {
            if !first {
                w.blank();
            }
            first = false;
            emitter.getter_contract(m, &mut imports, &mut w);
        }
        w.close();

        Ok(SourceUnit {
            pointer: object.meta.pointer.clone(),
            type_name: name.clone(),
            file_name: format!("{name}.java"),
            kind: UnitKind::Contract,
            contents: assemble(&imports, &w.into_string()),
        })
    }

    fn implementation(&self, object: &ObjectNode, members: &[Member]) -> SourceUnit {
        let contract = &object.meta.type_name;
        let name = format!("{contract}{}", self.config.impl_suffix);
        let emitter = MemberEmitter::new(self.config);
        let mut imports = Imports::new(&self.config.package);
        let mut w = JavaWriter::new();

        w.doc([format!("Parsing implementation of {{@link {contract}}}.")]);
        self.stamp_line(&mut imports, &mut w);
        w.open(format!("public final class {name} implements {contract}"));

        for m in members {
            w.line(emitter.field_decl(m, &mut imports));
        }
        if !members.is_empty() {
            w.blank();
        }

        let json_object = imports.ty(&format!("{}.JSONObject", self.config.json_package)).to_string();
        let not_null = imports.annotation(&self.config.not_null_annotation);
        let exception = imports.ty(&self.config.parse_exception).to_string();
        w.open(format!("public {name}({not_null} {json_object} json) throws {exception}"));
        w.open("try");
        for m in members {
            let stmt = emitter.read_stmt(m, &mut imports);
            w.line(stmt);
        }
        w.reopen("catch (RuntimeException e)");
        w.line(format!("throw new {}(json.toString(), e);", emitter.exception_name()));
        w.close();
        w.close();

        for m in members {
            w.blank();
            emitter.getter_impl(m, &mut imports, &mut w);
        }
        for m in members {
            emitter.array_helpers(m, &mut imports, &mut w);
        }
        w.close();

        SourceUnit {
            pointer: object.meta.pointer.clone(),
            type_name: name.clone(),
            file_name: format!("{name}.java"),
            kind: UnitKind::Implementation,
            contents: assemble(&imports, &w.into_string()),
        }
    }
}

/// Enums used by `members`, first occurrence per name.
fn nested_enums(members: &[Member]) -> Vec<&EnumNode> {
    let mut seen = BTreeSet::new();
    members
        .iter()
        .flat_map(|m| m.enums.iter())
        .filter(|e| seen.insert(e.meta.type_name.clone()))
        .collect()
}

/// Write units under `<out_dir>/<package path>/`; returns the written paths.
pub fn write_units(units: &[SourceUnit], out_dir: &Path, config: &GeneratorConfig) -> GenResult<Vec<PathBuf>> {
    let dir = out_dir.join(config.package_dir());
    std::fs::create_dir_all(&dir).map_err(|e| GenError::io(&dir, e))?;
    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let path = dir.join(&unit.file_name);
        std::fs::write(&path, &unit.contents).map_err(|e| GenError::io(&path, e))?;
        written.push(path);
    }
    Ok(written)
}
