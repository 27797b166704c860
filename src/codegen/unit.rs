//! Import bookkeeping and whole-file assembly.
use std::collections::BTreeSet;

use crate::config::simple_name;

/// De-duplicated, sorted imports split into annotation and ordinary types.
#[derive(Debug, Default)]
pub struct Imports {
    package: String,
    annotations: BTreeSet<String>,
    types: BTreeSet<String>,
}

impl Imports {
    pub fn new(package: &str) -> Self {
        Self { package: package.to_string(), ..Self::default() }
    }

    fn needs_import(&self, qualified: &str) -> bool {
        match qualified.rsplit_once('.') {
            Some((pkg, _)) => pkg != "java.lang" && pkg != self.package,
            None => false,
        }
    }

    /// Register an annotation type; returns `@Simple`.
    pub fn annotation(&mut self, qualified: &str) -> String {
        if self.needs_import(qualified) {
            self.annotations.insert(qualified.to_string());
        }
        format!("@{}", simple_name(qualified))
    }

    /// Register an ordinary type; returns its simple name.
    pub fn ty<'q>(&mut self, qualified: &'q str) -> &'q str {
        if self.needs_import(qualified) {
            self.types.insert(qualified.to_string());
        }
        simple_name(qualified)
    }

    pub fn extend_types(&mut self, qualified: impl IntoIterator<Item = String>) {
        for q in qualified {
            self.ty(&q);
        }
    }

    pub fn annotation_imports(&self) -> impl Iterator<Item = &String> {
        self.annotations.iter()
    }

    pub fn type_imports(&self) -> impl Iterator<Item = &String> {
        self.types.iter()
    }
}

/// Package header, annotation imports, ordinary imports, then `body`.
pub fn assemble(imports: &Imports, body: &str) -> String {
    let mut out = format!("package {};\n\n", imports.package);
    let mut any = false;
    for q in imports.annotation_imports() {
        out.push_str(&format!("import {q};\n"));
        any = true;
    }
    if any && !imports.types.is_empty() {
        out.push('\n');
    }
    for q in imports.type_imports() {
        out.push_str(&format!("import {q};\n"));
        any = true;
    }
    if any {
        out.push('\n');
    }
    out.push_str(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_are_sorted_partitioned_and_deduplicated() {
        let mut imports = Imports::new("com.example.model");
        assert_eq!(imports.annotation("org.jetbrains.annotations.Nullable"), "@Nullable");
        imports.annotation("org.jetbrains.annotations.NotNull");
        imports.annotation("org.jetbrains.annotations.NotNull");
        assert_eq!(imports.ty("java.util.List"), "List");
        imports.ty("java.time.OffsetDateTime");
        imports.ty("java.lang.String");
        imports.ty("com.example.model.Pet");
        imports.ty("java.util.List");

        let file = assemble(&imports, "interface A {\n}\n");
        assert_eq!(
            file,
            "package com.example.model;\n\n\
             import org.jetbrains.annotations.NotNull;\n\
             import org.jetbrains.annotations.Nullable;\n\n\
             import java.time.OffsetDateTime;\n\
             import java.util.List;\n\n\
             interface A {\n}\n"
        );
    }

    #[test]
    fn no_imports_means_no_import_block() {
        let imports = Imports::new("p");
        assert_eq!(assemble(&imports, "class A {}\n"), "package p;\n\nclass A {}\n");
    }
}
