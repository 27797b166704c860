// Indentation-aware text buffer plus Java literal/comment escaping.

use serde_json::Value;

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct JavaWriter {
    buf: String,
    depth: usize,
}

impl JavaWriter {
    pub fn new() -> Self { Self::default() }

    pub fn line(&mut self, s: impl AsRef<str>) {
        let s = s.as_ref();
        if !s.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(s);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// `head {` and indent.
    pub fn open(&mut self, head: impl AsRef<str>) {
        self.line(format!("{} {{", head.as_ref()));
        self.depth += 1;
    }

    /// Dedent and `}`.
    pub fn close(&mut self) {
        self.close_with("");
    }

    /// Dedent and `}` followed by `tail`, e.g. `};`.
    pub fn close_with(&mut self, tail: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(format!("}}{tail}"));
    }

    /// `} <tail> {` at the same depth, e.g. `} catch (RuntimeException e) {`.
    pub fn reopen(&mut self, tail: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(format!("}} {tail} {{"));
        self.depth += 1;
    }

    /// Javadoc block; each entry may span several lines.
    pub fn doc<I, S>(&mut self, paragraphs: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.line("/**");
        for p in paragraphs {
            for l in p.as_ref().lines() {
                let l = escape_doc(l.trim_end());
                if l.is_empty() { self.line(" *") } else { self.line(format!(" * {l}")) }
            }
        }
        self.line(" */");
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Java string literal, quotes included.
pub fn string_literal(s: &str) -> String {
    // JSON string escapes are valid Java escapes
    Value::String(s.to_string()).to_string()
}

/// Neutralize comment terminators inside Javadoc text.
pub fn escape_doc(s: &str) -> String {
    s.replace("*/", "*&#47;")
}

/// Render an example value for Javadoc (`<code>` with HTML escaping).
pub fn example_doc(example: &Value) -> String {
    let raw = example.to_string();
    let escaped = raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    format!("<p>Example: <code>{escaped}</code>")
}

/// Integer literal for a range bound, clamped to `long`.
pub fn long_literal(v: f64) -> String {
    if v <= i64::MIN as f64 {
        "Long.MIN_VALUE".into()
    } else if v >= i64::MAX as f64 {
        "Long.MAX_VALUE".into()
    } else {
        format!("{}L", v.trunc() as i64)
    }
}
