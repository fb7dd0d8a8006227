/// Reduce a client-supplied name to a safe single path component.
///
/// Path separators and whitespace become word breaks joined with `_`, any
/// character outside `[A-Za-z0-9._-]` is dropped, and leading/trailing `.`
/// or `_` are stripped so the result can never be `..` or a dotfile.
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let words: Vec<String> = raw
        .split(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let joined = words.join("_");
    let trimmed = joined.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Lower-cased extension of a file name, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
