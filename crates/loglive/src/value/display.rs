//! Node-style structural inspector, plus Display and Debug for Value

use std::fmt;

use super::{number_to_string, ObjectData, Value};

/// Arrays longer than this are truncated with `... N more items`.
const MAX_ARRAY_ITEMS: usize = 100;

/// Renders values the way Node's `util.inspect` does, on one line.
///
/// Nested containers beyond `depth` collapse to `[Array]` / `[Object]`, and
/// a container reached again through its own contents renders `[Circular]`.
#[derive(Debug, Clone, Copy)]
pub struct Inspector {
    /// Nesting levels to expand below the top-level value
    pub depth: usize,
}

impl Default for Inspector {
    fn default() -> Self {
        Self { depth: 2 }
    }
}

impl Inspector {
    /// Create an inspector with the given depth limit.
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    /// Render a top-level value. Strings render without quotes.
    pub fn render(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.to_string(),
            _ => self.render_nested(value),
        }
    }

    /// Render a value as it appears inside a container. Strings are quoted.
    pub fn render_nested(&self, value: &Value) -> String {
        let mut out = String::new();
        let mut stack = Vec::new();
        self.write_value(&mut out, value, 0, &mut stack);
        out
    }

    fn write_value(&self, out: &mut String, value: &Value, level: usize, stack: &mut Vec<usize>) {
        match value {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) if *n == 0.0 && n.is_sign_negative() => out.push_str("-0"),
            Value::Number(n) => out.push_str(&number_to_string(*n)),
            Value::String(s) => out.push_str(&quote(s)),
            Value::Function(f) => match &f.name {
                Some(name) => {
                    out.push_str("[Function: ");
                    out.push_str(name);
                    out.push(']');
                }
                None => out.push_str("[Function (anonymous)]"),
            },
            Value::Builtin(b) => {
                out.push_str("[Function: ");
                out.push_str(&b.name);
                out.push(']');
            }
            Value::Class(c) => {
                out.push_str("[class ");
                out.push_str(c.name.as_deref().unwrap_or("(anonymous)"));
                if let Some(parent) = c.parent_name() {
                    out.push_str(" extends ");
                    out.push_str(parent);
                }
                out.push(']');
            }
            Value::Array(items) => {
                if stack.contains(&items.id()) {
                    out.push_str("[Circular]");
                    return;
                }
                let items = items.read().clone();
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                if level > self.depth {
                    out.push_str("[Array]");
                    return;
                }
                stack.push(value_id(value));
                out.push_str("[ ");
                for (i, item) in items.iter().take(MAX_ARRAY_ITEMS).enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_value(out, item, level + 1, stack);
                }
                if items.len() > MAX_ARRAY_ITEMS {
                    let more = items.len() - MAX_ARRAY_ITEMS;
                    out.push_str(&format!(
                        ", ... {} more item{}",
                        more,
                        if more == 1 { "" } else { "s" }
                    ));
                }
                out.push_str(" ]");
                stack.pop();
            }
            Value::Object(obj) => {
                if stack.contains(&obj.id()) {
                    out.push_str("[Circular]");
                    return;
                }
                let data = obj.read().clone();
                if data.error.is_some() {
                    self.write_error(out, &data, level);
                    return;
                }
                let prefix = data.class_name().map(str::to_string);
                if data.properties.is_empty() {
                    if let Some(name) = &prefix {
                        out.push_str(name);
                        out.push(' ');
                    }
                    out.push_str("{}");
                    return;
                }
                if level > self.depth {
                    out.push('[');
                    out.push_str(prefix.as_deref().unwrap_or("Object"));
                    out.push(']');
                    return;
                }
                stack.push(value_id(value));
                if let Some(name) = &prefix {
                    out.push_str(name);
                    out.push(' ');
                }
                out.push_str("{ ");
                for (i, (key, item)) in data.properties.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&format_key(key));
                    out.push_str(": ");
                    self.write_value(out, item, level + 1, stack);
                }
                out.push_str(" }");
                stack.pop();
            }
        }
    }

    fn write_error(&self, out: &mut String, data: &ObjectData, level: usize) {
        let text = super::convert::object_to_string(data);
        if level == 0 {
            out.push_str(&text);
        } else {
            out.push('[');
            out.push_str(&text);
            out.push(']');
        }
    }
}

fn value_id(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.id(),
        Value::Object(obj) => obj.id(),
        _ => 0,
    }
}

/// Quote a nested string: single quotes unless the text contains one.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Object keys print bare when they are identifiers, quoted otherwise.
fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_ident = match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if is_ident {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Render a value with the default inspector.
pub fn inspect(value: &Value) -> String {
    Inspector::default().render(value)
}

impl Value {
    /// Human-readable rendering, as shown in annotations.
    pub fn to_display_string(&self) -> String {
        inspect(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&inspect(self))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug quotes strings so `"4"` and `4` stay distinguishable
        f.write_str(&Inspector::default().render_nested(self))
    }
}
