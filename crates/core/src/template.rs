//! Content template rendering for notification channels.
//!
//! Templates are plain strings with two constructs resolved against a JSON
//! payload:
//!
//! - `{{ path.to.value }}` placeholders. Dotted segments walk objects,
//!   numeric segments index arrays. Missing values and `null` render empty.
//! - `{% if path %}...{% else %}...{% endif %}` conditionals (no nesting,
//!   `else` optional, `if not path` negates). Truthiness follows JSON:
//!   `null`, `false`, `0`, `""`, `[]` and `{}` are false.
//!
//! The rendered output is trimmed. [`render_html`] additionally escapes
//! placeholder values for HTML bodies; template markup is kept as written.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

/// Regex pattern matching `{{ placeholder }}` tokens.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*\}\}";

/// Regex pattern matching a single-level `{% if %}` block.
pub const CONDITIONAL_PATTERN: &str = r"(?s)\{%\s*if\s+(not\s+)?([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*%\}(.*?)(?:\{%\s*else\s*%\}(.*?))?\{%\s*endif\s*%\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

static CONDITIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CONDITIONAL_PATTERN).expect("valid regex"));

/// Render a template against a payload.
pub fn render(template: &str, payload: &Value) -> String {
    render_with(template, payload, false)
}

/// Render an HTML template against a payload, escaping every placeholder
/// value.
pub fn render_html(template: &str, payload: &Value) -> String {
    render_with(template, payload, true)
}

fn render_with(template: &str, payload: &Value, escape: bool) -> String {
    let resolved = CONDITIONAL_RE.replace_all(template, |caps: &Captures| {
        let negate = caps.get(1).is_some();
        let condition = lookup(payload, &caps[2]).is_some_and(is_truthy);
        let branch = if condition != negate { caps.get(3) } else { caps.get(4) };
        branch.map(|m| m.as_str().to_string()).unwrap_or_default()
    });

    let rendered = PLACEHOLDER_RE.replace_all(&resolved, |caps: &Captures| {
        let text = lookup(payload, &caps[1]).map(to_text).unwrap_or_default();
        if escape {
            escape_html(&text)
        } else {
            text
        }
    });

    rendered.trim().to_string()
}

/// Resolve a dotted path inside a JSON value.
pub fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(payload, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// JSON truthiness used by conditionals.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape `& < > " '` for inclusion in HTML text or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Fill a deep-link template such as `{base_url}/matters/{id}`.
pub fn deep_link(template: &str, base_url: &str, id: &str) -> String {
    template
        .replace("{base_url}", base_url.trim_end_matches('/'))
        .replace("{id}", id)
}
