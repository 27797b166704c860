// Nested enum bodies, emitted inside the contract that uses them.

use crate::ir::EnumNode;

use super::writer::{string_literal, JavaWriter};

pub fn emit_enum(node: &EnumNode, w: &mut JavaWriter) {
    let name = &node.meta.type_name;
    let constants = node.constants();

    let mut doc = vec![node.meta.description().to_string()];
    if let Some(example) = &node.meta.example {
        doc.push(super::writer::example_doc(example));
    }
    w.doc(doc);
    w.open(format!("enum {name}"));
    for (i, c) in constants.iter().enumerate() {
        let end = if i + 1 == constants.len() { ";" } else { "," };
        w.line(format!("{}({}){end}", c.name, string_literal(&c.value)));
    }
    w.blank();
    w.line("private final String value;");
    w.blank();
    w.open(format!("{name}(String value)"));
    w.line("this.value = value;");
    w.close();
    w.blank();
    w.open("public String value()");
    w.line("return value;");
    w.close();
    w.blank();
    w.open(format!("public static {name} of(String value)"));
    w.open(format!("for ({name} constant : values())"));
    w.open("if (constant.value.equals(value))");
    w.line("return constant;");
    w.close();
    w.close();
    w.line(format!("throw new IllegalArgumentException(\"unknown {name}: \" + value);"));
    w.close();
    w.close();
}
