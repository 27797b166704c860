//! Per-member emission: field declaration, parse assignment, array helper,
//! getter contract and getter implementation.
//!
//! The escaped identifier (`member.field`) is used at every site; the JSON
//! key is always the raw `member.json_key`.
use crate::config::{simple_name, GeneratorConfig};
use crate::lower::{JavaType, DATE_TIME_IMPORT};

use super::members::{Member, Shape};
use super::unit::Imports;
use super::writer::{example_doc, long_literal, string_literal, JavaWriter};

pub struct MemberEmitter<'c> {
    config: &'c GeneratorConfig,
}

impl<'c> MemberEmitter<'c> {
    pub fn new(config: &'c GeneratorConfig) -> Self {
        Self { config }
    }

    /// `@Nullable` / `@NotNull`; none for non-null primitives.
    fn nullability(&self, m: &Member, imports: &mut Imports) -> Option<String> {
        if m.nullable {
            Some(imports.annotation(&self.config.nullable_annotation))
        } else if m.ty.is_primitive() {
            None
        } else {
            Some(imports.annotation(&self.config.not_null_annotation))
        }
    }

    fn range(&self, m: &Member, imports: &mut Imports) -> Option<String> {
        let (lo, hi) = m.integer_range()?;
        let ann = imports.annotation(&self.config.range_annotation);
        // only whole values inside the bounds are admissible
        let from = lo.map(|v| long_literal(v.ceil())).unwrap_or_else(|| "Long.MIN_VALUE".into());
        let to = hi.map(|v| long_literal(v.floor())).unwrap_or_else(|| "Long.MAX_VALUE".into());
        Some(format!("{ann}(from = {from}, to = {to})"))
    }

    fn register_types(&self, m: &Member, imports: &mut Imports) {
        let mut qualified = std::collections::BTreeSet::new();
        m.ty.collect_imports(&mut qualified);
        imports.extend_types(qualified);
    }

    // ---------------------------- fields ---------------------------------- //

    pub fn field_decl(&self, m: &Member, imports: &mut Imports) -> String {
        self.register_types(m, imports);
        let ty = m.declared_type();
        match self.nullability(m, imports) {
            Some(ann) => format!("{ann} private final {ty} {};", m.field),
            None => format!("private final {ty} {};", m.field),
        }
    }

    // ---------------------------- reads ----------------------------------- //

    /// `this.<field> = <read>;`, guarded by `isNull` when nullable.
    pub fn read_stmt(&self, m: &Member, imports: &mut Imports) -> String {
        let key = string_literal(&m.json_key);
        let value = self.value_expr(&m.shape, "json", &key, &helper_name(&m.field), imports);
        if m.nullable {
            format!("this.{} = json.isNull({key}) ? null : {value};", m.field)
        } else {
            format!("this.{} = {value};", m.field)
        }
    }

    /// Read one value from `src` (a `JSONObject` or `JSONArray`) at `arg`.
    fn value_expr(&self, shape: &Shape, src: &str, arg: &str, helper: &str, imports: &mut Imports) -> String {
        match shape {
            Shape::Scalar(JavaType::Int) => format!("{src}.getInt({arg})"),
            Shape::Scalar(JavaType::Long) => format!("{src}.getLong({arg})"),
            Shape::Scalar(JavaType::Double) => format!("{src}.getDouble({arg})"),
            Shape::Scalar(JavaType::Boolean) => format!("{src}.getBoolean({arg})"),
            Shape::Scalar(JavaType::DateTime) => {
                let ty = imports.ty(DATE_TIME_IMPORT);
                format!("{ty}.parse({src}.getString({arg}))")
            }
            Shape::Scalar(_) => format!("{src}.getString({arg})"),
            Shape::RawJson => format!("{src}.get({arg}).toString()"),
            Shape::Enum(name) => format!("{name}.of({src}.getString({arg}))"),
            Shape::Composite(name) => {
                format!("new {name}{}({src}.getJSONObject({arg}))", self.config.impl_suffix)
            }
            Shape::Array { .. } => format!("{helper}({src}.getJSONArray({arg}))"),
        }
    }

    /// Private static `read<Field>` helpers materializing array members.
    ///
    /// Nested levels are `read<Field>$1`, `read<Field>$2`, ...; `$` never
    /// appears in a generated field name, so they cannot meet another
    /// member's helper.
    pub fn array_helpers(&self, m: &Member, imports: &mut Imports, w: &mut JavaWriter) {
        if let Shape::Array { ty, item } = &m.shape {
            self.array_helper(&helper_name(&m.field), 0, ty, item, imports, w);
        }
    }

    fn array_helper(
        &self,
        base: &str,
        depth: usize,
        ty: &JavaType,
        item: &Shape,
        imports: &mut Imports,
        w: &mut JavaWriter,
    ) {
        let array = imports.ty(&format!("{}.JSONArray", self.config.json_package)).to_string();
        let exception = imports.ty(&self.config.parse_exception).to_string();
        let name = nested_helper_name(base, depth);
        let item_helper = nested_helper_name(base, depth + 1);
        let element = self.value_expr(item, "array", "i", &item_helper, imports);
        let ret = ty.render(false);
        let mut qualified = std::collections::BTreeSet::new();
        ty.collect_imports(&mut qualified);
        imports.extend_types(qualified);

        w.blank();
        w.open(format!("private static {ret} {name}({array} array) throws {exception}"));
        match ty {
            JavaType::NativeArray(inner) => {
                w.line(format!("{ret} out = new {}[array.length()];", inner.render(false)));
                w.open("for (int i = 0; i < array.length(); i++)");
                w.line(format!("out[i] = {element};"));
                w.close();
                w.line("return out;");
            }
            _ => {
                let list = imports.ty("java.util.ArrayList");
                w.line(format!("{ret} out = new {list}<>(array.length());"));
                w.open("for (int i = 0; i < array.length(); i++)");
                w.line(format!("out.add({element});"));
                w.close();
                let collections = imports.ty("java.util.Collections");
                w.line(format!("return {collections}.unmodifiableList(out);"));
            }
        }
        w.close();

        if let Shape::Array { ty: inner_ty, item: inner_item } = item {
            self.array_helper(base, depth + 1, inner_ty, inner_item, imports, w);
        }
    }

    // ---------------------------- getters --------------------------------- //

    fn getter_doc(&self, m: &Member) -> Vec<String> {
        let mut doc = vec![m.doc.clone()];
        if let Some(example) = &m.example {
            doc.push(example_doc(example));
        }
        if m.ty == JavaType::Double {
            if let Some((lo, hi)) = m.bounds {
                let fmt = |b: Option<f64>, open: &str| b.map(|v| v.to_string()).unwrap_or_else(|| open.to_string());
                doc.push(format!("<p>Range: [{}, {}]", fmt(lo, "-inf"), fmt(hi, "+inf")));
            }
        }
        doc
    }

    fn getter_annotations(&self, m: &Member, imports: &mut Imports) -> Vec<String> {
        self.nullability(m, imports).into_iter().chain(self.range(m, imports)).collect()
    }

    pub fn getter_contract(&self, m: &Member, imports: &mut Imports, w: &mut JavaWriter) {
        self.register_types(m, imports);
        w.doc(self.getter_doc(m));
        for ann in self.getter_annotations(m, imports) {
            w.line(ann);
        }
        w.line(format!("{} {}();", m.declared_type(), m.getter));
    }

    pub fn getter_impl(&self, m: &Member, imports: &mut Imports, w: &mut JavaWriter) {
        w.doc(self.getter_doc(m));
        w.line("@Override");
        for ann in self.getter_annotations(m, imports) {
            w.line(ann);
        }
        w.open(format!("public {} {}()", m.declared_type(), m.getter));
        match (&m.ty, m.nullable) {
            // arrays are mutable; hand out copies
            (JavaType::NativeArray(_), true) => {
                w.line(format!("return {0} == null ? null : {0}.clone();", m.field))
            }
            (JavaType::NativeArray(_), false) => w.line(format!("return {}.clone();", m.field)),
            _ => w.line(format!("return {};", m.field)),
        }
        w.close();
    }

    /// Simple name of the configured parse exception.
    pub fn exception_name(&self) -> &str {
        simple_name(&self.config.parse_exception)
    }
}

/// `position` → `readPosition`, `class_` → `readClass_`.
pub fn helper_name(field: &str) -> String {
    let trimmed = field.trim_start_matches('_');
    let mut cs = trimmed.chars();
    match cs.next() {
        Some(c) => format!("read{}{}", c.to_ascii_uppercase(), cs.as_str()),
        None => "readValue".to_string(),
    }
}

fn nested_helper_name(base: &str, depth: usize) -> String {
    match depth {
        0 => base.to_string(),
        n => format!("{base}${n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::members::Origin;

    fn member(field: &str, key: &str, ty: JavaType, shape: Shape, nullable: bool) -> Member {
        Member {
            origin: Origin::Property,
            json_key: key.into(),
            field: field.into(),
            getter: crate::naming::getter_name(field),
            doc: key.into(),
            example: None,
            ty,
            shape,
            nullable,
            bounds: None,
            enums: Vec::new(),
        }
    }

    #[test]
    fn scalar_reads_and_declarations() {
        let config = GeneratorConfig::default();
        let e = MemberEmitter::new(&config);
        let mut imports = Imports::new(&config.package);

        let code = member("code", "code", JavaType::Int, Shape::Scalar(JavaType::Int), false);
        assert_eq!(e.field_decl(&code, &mut imports), "private final int code;");
        assert_eq!(e.read_stmt(&code, &mut imports), "this.code = json.getInt(\"code\");");

        let age = member("age", "age", JavaType::Int, Shape::Scalar(JavaType::Int), true);
        assert_eq!(e.field_decl(&age, &mut imports), "@Nullable private final Integer age;");
        assert_eq!(
            e.read_stmt(&age, &mut imports),
            "this.age = json.isNull(\"age\") ? null : json.getInt(\"age\");"
        );

        let when = member("createdAt", "created_at", JavaType::DateTime, Shape::Scalar(JavaType::DateTime), false);
        assert_eq!(e.field_decl(&when, &mut imports), "@NotNull private final OffsetDateTime createdAt;");
        assert_eq!(
            e.read_stmt(&when, &mut imports),
            "this.createdAt = OffsetDateTime.parse(json.getString(\"created_at\"));"
        );
    }

    #[test]
    fn nested_reads_use_target_constructors_and_lookups() {
        let config = GeneratorConfig::default();
        let e = MemberEmitter::new(&config);
        let mut imports = Imports::new(&config.package);

        let owner = member("owner", "owner", JavaType::Composite("Owner".into()), Shape::Composite("Owner".into()), false);
        assert_eq!(e.read_stmt(&owner, &mut imports), "this.owner = new OwnerImpl(json.getJSONObject(\"owner\"));");

        let status = member("status", "status", JavaType::Enum("Status".into()), Shape::Enum("Status".into()), false);
        assert_eq!(e.read_stmt(&status, &mut imports), "this.status = Status.of(json.getString(\"status\"));");

        let meta = member("meta", "meta", JavaType::Text, Shape::RawJson, true);
        assert_eq!(
            e.read_stmt(&meta, &mut imports),
            "this.meta = json.isNull(\"meta\") ? null : json.get(\"meta\").toString();"
        );
    }

    #[test]
    fn arrays_read_through_helpers() {
        let config = GeneratorConfig::default();
        let e = MemberEmitter::new(&config);
        let mut imports = Imports::new(&config.package);
        let ty = JavaType::List(Box::new(JavaType::NativeArray(Box::new(JavaType::Double))));
        let shape = Shape::Array {
            ty: ty.clone(),
            item: Box::new(Shape::Array {
                ty: JavaType::NativeArray(Box::new(JavaType::Double)),
                item: Box::new(Shape::Scalar(JavaType::Double)),
            }),
        };
        let path = member("path", "path", ty, shape, false);
        assert_eq!(e.read_stmt(&path, &mut imports), "this.path = readPath(json.getJSONArray(\"path\"));");

        let mut w = JavaWriter::new();
        e.array_helpers(&path, &mut imports, &mut w);
        let src = w.into_string();
        assert!(src.contains("private static List<double[]> readPath(JSONArray array) throws JsonParseException {"));
        assert!(src.contains("out.add(readPath$1(array.getJSONArray(i)));"));
        assert!(src.contains("private static double[] readPath$1(JSONArray array) throws JsonParseException {"));
        assert!(src.contains("double[] out = new double[array.length()];"));
        assert!(src.contains("out[i] = array.getDouble(i);"));
        assert!(src.contains("return Collections.unmodifiableList(out);"));
    }

    #[test]
    fn nested_helpers_never_meet_a_sibling_member_helper() {
        let config = GeneratorConfig::default();
        let e = MemberEmitter::new(&config);
        let mut imports = Imports::new(&config.package);
        let grid = JavaType::NativeArray(Box::new(JavaType::NativeArray(Box::new(JavaType::Long))));
        let path = member(
            "path",
            "path",
            grid.clone(),
            Shape::Array {
                ty: grid,
                item: Box::new(Shape::Array {
                    ty: JavaType::NativeArray(Box::new(JavaType::Long)),
                    item: Box::new(Shape::Scalar(JavaType::Long)),
                }),
            },
            false,
        );
        let row = JavaType::NativeArray(Box::new(JavaType::Long));
        let path_item = member(
            "pathItem",
            "path_item",
            row.clone(),
            Shape::Array { ty: row, item: Box::new(Shape::Scalar(JavaType::Long)) },
            false,
        );

        let mut w = JavaWriter::new();
        e.array_helpers(&path, &mut imports, &mut w);
        e.array_helpers(&path_item, &mut imports, &mut w);
        let src = w.into_string();
        let declared: Vec<_> = src
            .lines()
            .filter_map(|l| l.strip_prefix("private static "))
            .filter_map(|l| l.split_whitespace().nth(1))
            .map(|l| l.split('(').next().unwrap_or(l))
            .collect();
        assert_eq!(declared, ["readPath", "readPath$1", "readPathItem"]);
        assert!(src.contains("out[i] = readPath$1(array.getJSONArray(i));"));
    }

    #[test]
    fn fractional_integer_bounds_round_inward() {
        let config = GeneratorConfig::default();
        let e = MemberEmitter::new(&config);
        let mut imports = Imports::new(&config.package);
        let mut level = member("level", "level", JavaType::Int, Shape::Scalar(JavaType::Int), false);
        level.bounds = Some((Some(0.5), Some(9.5)));
        let mut w = JavaWriter::new();
        e.getter_contract(&level, &mut imports, &mut w);
        assert!(w.into_string().contains("@Range(from = 1L, to = 9L)\n"));

        let mut debt = member("debt", "debt", JavaType::Long, Shape::Scalar(JavaType::Long), false);
        debt.bounds = Some((Some(-2.5), None));
        let mut w = JavaWriter::new();
        e.getter_contract(&debt, &mut imports, &mut w);
        assert!(w.into_string().contains("@Range(from = -2L, to = Long.MAX_VALUE)\n"));
    }

    #[test]
    fn getters_carry_annotations_and_docs() {
        let config = GeneratorConfig::default();
        let e = MemberEmitter::new(&config);
        let mut imports = Imports::new(&config.package);
        let mut count = member("count", "count", JavaType::Int, Shape::Scalar(JavaType::Int), false);
        count.bounds = Some((Some(0.0), Some(10.0)));
        count.doc = "How many".into();

        let mut w = JavaWriter::new();
        e.getter_contract(&count, &mut imports, &mut w);
        assert_eq!(
            w.into_string(),
            "/**\n * How many\n */\n@Range(from = 0L, to = 10L)\nint getCount();\n"
        );

        let coords = member(
            "coords",
            "coords",
            JavaType::NativeArray(Box::new(JavaType::Double)),
            Shape::Array { ty: JavaType::NativeArray(Box::new(JavaType::Double)), item: Box::new(Shape::Scalar(JavaType::Double)) },
            true,
        );
        let mut w = JavaWriter::new();
        e.getter_impl(&coords, &mut imports, &mut w);
        let src = w.into_string();
        assert!(src.contains("@Override\n@Nullable\npublic double[] getCoords() {"));
        assert!(src.contains("return coords == null ? null : coords.clone();"));
    }

    #[test]
    fn helper_names() {
        assert_eq!(helper_name("position"), "readPosition");
        assert_eq!(helper_name("class_"), "readClass_");
    }
}
