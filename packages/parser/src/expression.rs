//! Field references of the form `{data.<identifier>}`.

/// Name of the object the component receives its data context through
pub const DATA_ROOT: &str = "data";

/// If `text` (surrounding whitespace ignored) is exactly one field
/// reference expression, return the referenced field.
///
/// `{data.title}` → `Some("title")`, `Hello {data.title}` → `None`,
/// `{data.a.b}` → `None` (nested paths are not bindable).
pub fn single_field_reference(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    field_of_path(inner.trim())
}

/// Field named by a bare `data.<identifier>` path (no braces)
pub fn field_of_path(path: &str) -> Option<&str> {
    let field = path
        .strip_prefix(DATA_ROOT)?
        .strip_prefix("?.")
        .or_else(|| path.strip_prefix(DATA_ROOT)?.strip_prefix('.'))?;
    is_identifier(field).then_some(field)
}

/// Dotted path segments under the data root: `data.a.b` → `["a", "b"]`
pub fn data_path(expr: &str) -> Option<Vec<&str>> {
    let rest = expr.trim().strip_prefix(DATA_ROOT)?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let rest = rest.strip_prefix("?.").or_else(|| rest.strip_prefix('.'))?;
    let segments: Vec<&str> = rest
        .split('.')
        .map(|s| s.trim_end_matches('?'))
        .collect();
    segments.iter().all(|s| is_identifier(s)).then_some(segments)
}

/// Every `{...}` expression in `text`, as (byte range incl. braces, inner text)
pub fn expressions(text: &str) -> Vec<(std::ops::Range<usize>, &str)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = crate::scanner::skip_balanced(bytes, i) {
                found.push((i..end, &text[i + 1..end - 1]));
                i = end;
                continue;
            }
            // unbalanced tail is not an expression
            break;
        }
        i += 1;
    }
    found
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_reference() {
        assert_eq!(single_field_reference("{data.title}"), Some("title"));
        assert_eq!(single_field_reference("  { data.title }\n"), Some("title"));
        assert_eq!(single_field_reference("{data?.title}"), Some("title"));
    }

    #[test]
    fn test_mixed_content_is_unbound() {
        assert_eq!(single_field_reference("Hello {data.title}"), None);
        assert_eq!(single_field_reference("{data.a} {data.b}"), None);
        assert_eq!(single_field_reference("{data.a.b}"), None);
        assert_eq!(single_field_reference("{props.title}"), None);
        assert_eq!(single_field_reference("{database}"), None);
    }

    #[test]
    fn test_data_path() {
        assert_eq!(data_path("data.author.name"), Some(vec!["author", "name"]));
        assert_eq!(data_path("data"), Some(vec![]));
        assert_eq!(data_path("other.x"), None);
    }

    #[test]
    fn test_expressions_in_text() {
        let text = "Hi {data.name}, you have {data.count} items";
        let exprs = expressions(text);
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[0].1, "data.name");
        assert_eq!(&text[exprs[1].0.clone()], "{data.count}");
    }
}
