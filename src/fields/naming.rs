//! Machine names for fields.
//!
//! Presets, suggestions and manual fields share one namespace, so every name
//! that enters a selection is derived here.

/// Name used when a display name has no alphanumeric characters at all.
const FALLBACK_FIELD_NAME: &str = "field";

/// Turn a display name into a lower-camel-case identifier that is not in `existing`.
///
/// Collisions get a numeric suffix starting at `2`. At most `existing.len() + 1`
/// candidates are probed, so the search always terminates.
pub fn generate_field_name<S: AsRef<str>>(display_name: &str, existing: &[S]) -> String {
    let base = base_identifier(display_name);
    let taken = |candidate: &str| existing.iter().any(|name| name.as_ref() == candidate);
    if !taken(&base) {
        return base;
    }
    (2..=existing.len() + 1)
        .map(|suffix| format!("{base}{suffix}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| format!("{base}{}", existing.len() + 2))
}

fn base_identifier(display_name: &str) -> String {
    let mut ident = String::new();
    let words = display_name
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty());
    for word in words {
        let lower = word.to_ascii_lowercase();
        if ident.is_empty() {
            ident.push_str(&lower);
        } else {
            ident.push_str(&capitalize(&lower));
        }
    }
    if ident.is_empty() {
        return FALLBACK_FIELD_NAME.to_string();
    }
    if ident.starts_with(|ch: char| ch.is_ascii_digit()) {
        return format!("{FALLBACK_FIELD_NAME}{ident}");
    }
    ident
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
