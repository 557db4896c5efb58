//! Note and canvas name normalization.
//!
//! One rule, used by link resolution and duplicate-name checks alike:
//! trim, drop directory components, strip a known file-type suffix,
//! lowercase.

/// File-type suffixes stripped before comparing names. Longest first so
/// `.excalidraw.json` wins over `.json`.
pub const KNOWN_SUFFIXES: &[&str] = &[
    ".excalidraw.json",
    ".excalidraw",
    ".canvas",
    ".json",
    ".md",
    ".txt",
];

/// Normalize a link target, file name, or path for comparison.
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let base = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
        .trim();
    let lower = base.to_lowercase();
    for suffix in KNOWN_SUFFIXES {
        if let Some(stem) = lower.strip_suffix(suffix)
            && !stem.is_empty()
        {
            return stem.trim_end().to_string();
        }
    }
    lower
}
