//! Module-syntax stripping and component name detection.
//!
//! Component source arrives as a full module (`import React ...`,
//! `export default function Slide({ data }) { ... }`). Before evaluation the
//! import/export syntax is removed and the callable identifier is located.

/// Identifier used when none of the declaration forms match
pub const FALLBACK_COMPONENT: &str = "Component";

/// Source with module syntax removed plus the detected component name
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub body: String,
    pub component: String,
}

pub fn preprocess(source: &str) -> Preprocessed {
    Preprocessed {
        body: strip_module_syntax(source),
        component: component_identifier(source),
    }
}

/// Remove import statements and `export` keywords.
///
/// Byte length is not preserved; callers that need offsets into the
/// original source must scan the original text instead.
pub fn strip_module_syntax(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_import = false;

    for line in source.split_inclusive('\n') {
        let trimmed = line.trim_start();

        if in_import {
            // multi-line `import { a,\n b } from 'x';`
            if trimmed.contains(" from ") || trimmed.starts_with("from ") || trimmed.contains(';') {
                in_import = false;
            }
            continue;
        }

        if trimmed.starts_with("import ") || trimmed.starts_with("import{") {
            let complete = trimmed.contains(" from ")
                || trimmed.trim_end().ends_with(';')
                || trimmed.starts_with("import '")
                || trimmed.starts_with("import \"");
            in_import = !complete;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("export default ") {
            let indent = &line[..line.len() - trimmed.len()];
            let rest_trimmed = rest.trim();
            // `export default Slide;` is a bare re-export and carries no code
            if is_identifier(rest_trimmed.trim_end_matches(';')) {
                continue;
            }
            out.push_str(indent);
            out.push_str(rest);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("export ") {
            let indent = &line[..line.len() - trimmed.len()];
            out.push_str(indent);
            out.push_str(rest);
            continue;
        }

        out.push_str(line);
    }

    out
}

/// Determine the component's callable identifier.
///
/// Tried in order: `export default function Name`, `export default Name`,
/// `function Name`, `const Name =`.
pub fn component_identifier(source: &str) -> String {
    let forms: [fn(&str) -> Option<String>; 4] = [
        |s| find_after(s, "export default function "),
        |s| {
            find_after(s, "export default ").filter(|name| name != "function" && name != "class")
        },
        |s| find_after(s, "function "),
        |s| find_const(s),
    ];

    forms
        .iter()
        .find_map(|form| form(source))
        .unwrap_or_else(|| FALLBACK_COMPONENT.to_string())
}

fn find_after(source: &str, needle: &str) -> Option<String> {
    let mut from = 0;
    while let Some(found) = source[from..].find(needle) {
        let start = from + found + needle.len();
        let name = take_identifier(&source[start..]);
        if !name.is_empty() {
            return Some(name.to_string());
        }
        from = start;
    }
    None
}

fn find_const(source: &str) -> Option<String> {
    let mut from = 0;
    while let Some(found) = source[from..].find("const ") {
        let start = from + found + "const ".len();
        let name = take_identifier(&source[start..]);
        if !name.is_empty() && source[start + name.len()..].trim_start().starts_with('=') {
            return Some(name.to_string());
        }
        from = start;
    }
    None
}

fn take_identifier(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let ident = &text[..end];
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ""
    } else {
        ident
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && take_identifier(text).len() == text.len()
}
