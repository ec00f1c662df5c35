//! Rendering of descriptor values and object blocks.

use pbxpatch_types::ObjectId;

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '/')
}

/// Whether `s` must be written as a quoted string literal.
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty() || !s.chars().all(is_bare_char)
}

/// Render `s` as a bare token when possible, otherwise as a quoted literal.
pub fn quote(s: &str) -> String {
    if !needs_quotes(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Inverse of [`quote`]. Bare tokens are returned unchanged.
pub fn unquote(token: &str) -> String {
    let Some(inner) = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return token.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// `ID /* comment */`, the form every cross-reference takes in the descriptor.
pub fn render_reference(id: &ObjectId, comment: Option<&str>) -> String {
    match comment {
        Some(c) => format!("{id} /* {c} */"),
        None => id.to_string(),
    }
}

/// A property value to be written into the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewValue {
    /// Already-rendered scalar token (bare, quoted, or `ID /* comment */`).
    Scalar(String),
    /// List of already-rendered entries.
    List(Vec<String>),
    /// Nested dictionary, keys kept in the given order.
    Dict(Vec<(String, NewValue)>),
}

impl NewValue {
    pub fn text(s: &str) -> Self {
        NewValue::Scalar(quote(s))
    }

    pub fn reference(id: &ObjectId, comment: Option<&str>) -> Self {
        NewValue::Scalar(render_reference(id, comment))
    }

    /// Render on one line: `(a, b, )`, `{k = v; }`.
    pub fn render_inline(&self) -> String {
        match self {
            NewValue::Scalar(s) => s.clone(),
            NewValue::List(entries) => {
                let mut out = String::from("(");
                for e in entries {
                    out.push_str(e);
                    out.push_str(", ");
                }
                out.push(')');
                out
            }
            NewValue::Dict(props) => {
                let mut out = String::from("{");
                for (k, v) in props {
                    out.push_str(&format!("{} = {}; ", quote(k), v.render_inline()));
                }
                out.push('}');
                out
            }
        }
    }

    /// Render across lines. `indent` is the indentation of the line holding the key.
    pub fn render_multiline(&self, indent: &str) -> String {
        match self {
            NewValue::Scalar(s) => s.clone(),
            NewValue::List(entries) => {
                let mut out = String::from("(\n");
                for e in entries {
                    out.push_str(&format!("{indent}\t{e},\n"));
                }
                out.push_str(indent);
                out.push(')');
                out
            }
            NewValue::Dict(props) => {
                let inner = format!("{indent}\t");
                let mut out = String::from("{\n");
                for (k, v) in props {
                    out.push_str(&format!(
                        "{inner}{} = {};\n",
                        quote(k),
                        v.render_multiline(&inner)
                    ));
                }
                out.push_str(indent);
                out.push('}');
                out
            }
        }
    }
}

/// Builder for a new object definition.
///
/// `isa` is always written first, the remaining keys in sorted order, matching what the
/// build toolchain itself emits.
#[derive(Debug, Clone)]
pub struct ObjectBlock {
    id: ObjectId,
    comment: Option<String>,
    isa: String,
    props: Vec<(String, NewValue)>,
}

impl ObjectBlock {
    pub fn new(id: ObjectId, isa: impl Into<String>) -> Self {
        Self {
            id,
            comment: None,
            isa: isa.into(),
            props: Vec::new(),
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn value(mut self, key: impl Into<String>, value: NewValue) -> Self {
        self.props.push((key.into(), value));
        self
    }

    pub fn scalar(self, key: impl Into<String>, raw: impl Into<String>) -> Self {
        self.value(key, NewValue::Scalar(raw.into()))
    }

    pub fn text(self, key: impl Into<String>, s: &str) -> Self {
        self.value(key, NewValue::text(s))
    }

    pub fn reference(self, key: impl Into<String>, id: &ObjectId, comment: Option<&str>) -> Self {
        self.value(key, NewValue::reference(id, comment))
    }

    pub fn list(self, key: impl Into<String>, entries: Vec<String>) -> Self {
        self.value(key, NewValue::List(entries))
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    fn sorted_props(&self) -> Vec<&(String, NewValue)> {
        let mut props: Vec<_> = self.props.iter().collect();
        props.sort_by(|a, b| a.0.cmp(&b.0));
        props
    }

    fn head(&self) -> String {
        format!(
            "\t\t{} = {{",
            render_reference(&self.id, self.comment.as_deref())
        )
    }

    /// One property per line, as used by most object kinds.
    pub fn render_multiline(&self) -> String {
        let mut out = self.head();
        out.push('\n');
        out.push_str(&format!("\t\t\tisa = {};\n", self.isa));
        for (k, v) in self.sorted_props() {
            out.push_str(&format!(
                "\t\t\t{} = {};\n",
                quote(k),
                v.render_multiline("\t\t\t")
            ));
        }
        out.push_str("\t\t};\n");
        out
    }

    /// Whole object on one line, as used for build files and file references.
    pub fn render_inline(&self) -> String {
        let mut out = self.head();
        out.push_str(&format!("isa = {}; ", self.isa));
        for (k, v) in self.sorted_props() {
            out.push_str(&format!("{} = {}; ", quote(k), v.render_inline()));
        }
        out.push_str("};\n");
        out
    }
}
