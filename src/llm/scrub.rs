use std::borrow::Cow;

const MAX_LOGGED_ERROR_CHARS: usize = 300;
const REDACTED: &str = "[REDACTED]";

/// Markers whose following token is a credential. Bare prefixes like `sk-`
/// count as their own marker.
const MARKERS: [&str; 9] = [
    "Bearer ",
    "bearer ",
    "api-key: ",
    "api_key=",
    "\"api_key\":\"",
    "\"api-key\":\"",
    "\"authorization\":\"Bearer ",
    "sk-",
    "sk-ant-",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|&(_, c)| !is_secret_char(c))
        .map_or(input.len(), |(i, _)| from + i)
}

fn redact_after_marker(text: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(text, content_start);

        // Bare marker with nothing after it.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        text.replace_range(start..end, REDACTED);
        search_from = start + REDACTED.len();
    }
}

/// Redact credentials from upstream error text before it is logged.
///
/// `known_secret` is the configured API key; any literal occurrence is
/// removed in addition to the generic markers.
pub fn redact_secrets<'a>(input: &'a str, known_secret: Option<&str>) -> Cow<'a, str> {
    let known_secret = known_secret.filter(|s| !s.is_empty());
    let has_secret = known_secret.is_some_and(|s| input.contains(s));
    if !has_secret && !MARKERS.iter().any(|m| input.contains(m)) {
        return Cow::Borrowed(input);
    }

    let mut text = input.to_string();
    if let Some(secret) = known_secret {
        text = text.replace(secret, REDACTED);
    }
    for marker in MARKERS {
        redact_after_marker(&mut text, marker);
    }
    Cow::Owned(text)
}

/// Redact and truncate error text for a log line.
pub fn sanitize_for_log(input: &str, known_secret: Option<&str>) -> String {
    let redacted = redact_secrets(input, known_secret);
    truncate_chars(&redacted, MAX_LOGGED_ERROR_CHARS)
}

pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &input[..end]),
        None => input.to_string(),
    }
}
