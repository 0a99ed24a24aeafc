//! Suffix-based exclusion filter.

/// Returns `true` iff `file_name` ends with one of `excluded_suffixes`.
///
/// Matching is case-sensitive and literal; there is no glob support. Empty
/// suffixes never match.
pub fn should_exclude<'a, I>(file_name: &str, excluded_suffixes: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    excluded_suffixes
        .into_iter()
        .any(|suffix| !suffix.is_empty() && file_name.ends_with(suffix.as_str()))
}
