//! Display-name normalization.
//!
//! The sanitized name doubles as the artifact's file name and catalog key,
//! so the transformation is deterministic: merging the same display name
//! twice targets the same artifact.

/// Replaces each run of whitespace with `_` and drops `(` and `)`.
///
/// `"My Report(1).pdf"` becomes `"My_Report1.pdf"`.
pub fn sanitize_display_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        if c == '(' || c == ')' {
            continue;
        }
        out.push(c);
    }

    out
}

/// Returns the name without its final extension.
///
/// A leading dot does not start an extension, so `.profile` is returned
/// unchanged.
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

/// Returns the final extension without the dot, if any.
pub fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}
