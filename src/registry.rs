//! Pointer → node registry and `$ref` resolution.
//!
//! Phase 1 (`classify`) fills a [`Registry`]; refs are recorded as unresolved
//! pointers. Phase 2 ([`Registry::resolve`]) checks every recorded ref against
//! the finished registry and yields a read-only [`Schema`].
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{GenError, GenResult};
use crate::ir::{NodeRef, ObjectNode, RefNode, SchemaNode};

/// Per-run diagnostics returned with the schema.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub nodes_by_kind: BTreeMap<String, usize>,
    pub keys: BTreeMap<String, usize>,
    pub refs: usize,
    pub aliases: usize,
}

impl Report {
    pub(crate) fn count_node(&mut self, kind: &str) {
        *self.nodes_by_kind.entry(kind.to_string()).or_default() += 1;
    }

    pub(crate) fn count_key(&mut self, key: &str) {
        *self.keys.entry(key.to_string()).or_default() += 1;
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    nodes: IndexMap<String, NodeRef>,
    aliases: IndexMap<String, String>,  // ref position → target
    pending: Vec<(String, String)>,     // (referring pointer, target), incl. legacy refs
    type_names: BTreeSet<String>,
    reserved: HashMap<String, String>, // definition pointer → type name
    report: Report,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn register(&mut self, node: NodeRef) -> GenResult<()> {
        let pointer = node.pointer().to_string();
        if self.nodes.contains_key(&pointer) {
            return Err(GenError::DuplicatePointer(pointer));
        }
        tracing::debug!(%pointer, kind = node.kind_name(), "registered node");
        self.report.count_node(node.kind_name());
        self.nodes.insert(pointer, node);
        Ok(())
    }

    /// Remember a `$ref` sitting at `at`. Aliases are never registered as nodes.
    pub fn record_ref(&mut self, at: &str, target: &str) {
        self.report.refs += 1;
        self.aliases.insert(at.to_string(), target.to_string());
        self.pending.push((at.to_string(), target.to_string()));
    }

    /// Legacy `$ref` carried by an object node; resolved but not an alias.
    pub fn record_legacy_ref(&mut self, at: &str, target: &str) {
        self.pending.push((at.to_string(), target.to_string()));
    }

    /// Reserve a unique type name derived from `hint` (`Address`, `Address2`, ...).
    pub fn claim_type_name(&mut self, hint: &str) -> String {
        let base = hint.to_string();
        let mut name = base.clone();
        let mut n = 2;
        while !self.type_names.insert(name.clone()) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }

    /// Claim a name for a top-level definition before any inline node can.
    pub fn reserve_type_name(&mut self, pointer: &str, hint: &str) -> String {
        let name = self.claim_type_name(hint);
        self.reserved.insert(pointer.to_string(), name.clone());
        name
    }

    /// Name reserved for `pointer`, else a freshly claimed one.
    pub fn type_name_for(&mut self, pointer: &str, hint: &str) -> String {
        match self.reserved.get(pointer) {
            Some(name) => name.clone(),
            None => self.claim_type_name(hint),
        }
    }

    pub fn get(&self, pointer: &str) -> Option<&NodeRef> {
        self.nodes.get(pointer)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRef> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub(crate) fn report_mut(&mut self) -> &mut Report { &mut self.report }

    /// Follow alias chains from `target` to a registered pointer.
    fn lookup<'a>(&'a self, target: &'a str) -> GenResult<&'a str> {
        let mut current = target;
        let mut visited = HashSet::new();
        loop {
            if let Some((key, _)) = self.nodes.get_key_value(current) {
                return Ok(key.as_str());
            }
            if !visited.insert(current) {
                return Err(GenError::CyclicReference(target.to_string()));
            }
            match self.aliases.get(current) {
                Some(next) => current = next.as_str(),
                None => return Err(GenError::PointerNotFound(target.to_string())),
            }
        }
    }

    /// Phase 2: resolve every recorded ref. Fails on the first missing target.
    pub fn resolve(mut self) -> GenResult<Schema> {
        let mut resolved = HashMap::new();
        for (from, target) in &self.pending {
            let found = self.lookup(target)?;
            tracing::debug!(%from, %target, %found, "resolved ref");
            resolved.insert(target.clone(), found.to_string());
        }
        self.report.aliases = self.aliases.len();
        Ok(Schema { registry: self, resolved })
    }
}

/// Fully classified and resolved document; read-only.
#[derive(Debug)]
pub struct Schema {
    registry: Registry,
    resolved: HashMap<String, String>,
}

impl Schema {
    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn report(&self) -> &Report { &self.registry.report }

    /// The registered node a ref stands for.
    pub fn delegate_to(&self, r: &RefNode) -> GenResult<&NodeRef> {
        let pointer = match self.resolved.get(&r.target) {
            Some(p) => p.as_str(),
            None => self.registry.lookup(&r.target)?,
        };
        self.registry
            .get(pointer)
            .ok_or_else(|| GenError::PointerNotFound(r.target.clone()))
    }

    /// Strip refs off `node` until a structural node is reached.
    pub fn deref_node<'a>(&'a self, node: &'a SchemaNode) -> GenResult<&'a SchemaNode> {
        match node {
            SchemaNode::Ref(r) => {
                let target = self.delegate_to(r)?;
                // registered nodes are never refs, but stay total
                self.deref_node(target.as_ref())
            }
            other => Ok(other),
        }
    }

    /// Resolve a legacy object `$ref`, if any.
    pub fn legacy_target(&self, object: &ObjectNode) -> GenResult<Option<&NodeRef>> {
        match &object.legacy_ref {
            None => Ok(None),
            Some(target) => {
                let pointer = match self.resolved.get(target) {
                    Some(p) => p.as_str(),
                    None => self.registry.lookup(target)?,
                };
                Ok(self.registry.get(pointer))
            }
        }
    }

    /// Object nodes in registration order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectNode> {
        self.registry.nodes().filter_map(|n| n.as_object())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{NodeMeta, PrimitiveKind, PrimitiveNode};
    use std::rc::Rc;

    fn meta(pointer: &str) -> NodeMeta {
        NodeMeta {
            type_name: String::new(),
            pointer: pointer.to_string(),
            description: None,
            example: None,
        }
    }

    fn string_node(pointer: &str) -> NodeRef {
        Rc::new(SchemaNode::Primitive(PrimitiveNode {
            meta: meta(pointer),
            kind: PrimitiveKind::String,
            format: None,
            minimum: None,
            maximum: None,
            pattern: None,
            min_length: None,
        }))
    }

    fn ref_node(at: &str, target: &str) -> RefNode {
        RefNode { meta: meta(at), target: target.to_string() }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = Registry::new();
        reg.register(string_node("#/A")).unwrap();
        let err = reg.register(string_node("#/A")).unwrap_err();
        assert!(matches!(err, GenError::DuplicatePointer(p) if p == "#/A"));
    }

    #[test]
    fn forward_refs_and_alias_chains_resolve() {
        let mut reg = Registry::new();
        // ref recorded before its target exists
        reg.record_ref("#/Alias", "#/Name");
        reg.record_ref("#/User/properties/name", "#/Alias");
        reg.register(string_node("#/Name")).unwrap();
        let schema = reg.resolve().unwrap();

        let via_alias = schema.delegate_to(&ref_node("#/User/properties/name", "#/Alias")).unwrap();
        assert_eq!(via_alias.pointer(), "#/Name");
        assert_eq!(schema.report().aliases, 2);
        assert_eq!(schema.report().refs, 2);
    }

    #[test]
    fn missing_target_fails_at_resolution() {
        let mut reg = Registry::new();
        reg.record_ref("#/A/properties/b", "#/Missing");
        let err = reg.resolve().unwrap_err();
        assert!(err.is_resolution());
        assert!(matches!(err, GenError::PointerNotFound(p) if p == "#/Missing"));
    }

    #[test]
    fn alias_loop_is_cyclic() {
        let mut reg = Registry::new();
        reg.record_ref("#/A", "#/B");
        reg.record_ref("#/B", "#/A");
        let err = reg.resolve().unwrap_err();
        assert!(matches!(err, GenError::CyclicReference(_)));
    }

    #[test]
    fn type_names_are_unique_per_run() {
        let mut reg = Registry::new();
        assert_eq!(reg.claim_type_name("Address"), "Address");
        assert_eq!(reg.claim_type_name("Address"), "Address2");
        assert_eq!(reg.claim_type_name("Address"), "Address3");
    }
}
