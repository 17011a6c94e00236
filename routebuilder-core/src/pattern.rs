//! Name and endpoint pattern matching shared by route configuration
//! selection and intercept-from filtering.

use regex::Regex;

/// Matches `name` against `pattern`: exact, then `*` wildcard (as prefix or
/// suffix), then as a whole-string regular expression.
///
/// An invalid regular expression never matches.
pub fn match_pattern(name: &str, pattern: &str) -> bool {
    if name == pattern {
        return true;
    }
    if match_wildcard(name, pattern) {
        return true;
    }
    match_regex(name, pattern)
}

fn match_wildcard(name: &str, pattern: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        if name.starts_with(prefix) {
            return true;
        }
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        if name.ends_with(suffix) {
            return true;
        }
    }
    false
}

fn match_regex(name: &str, pattern: &str) -> bool {
    Regex::new(&format!("^(?:{pattern})$"))
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// Normalizes an endpoint uri so equivalent spellings compare equal:
/// `scheme://path` becomes `scheme:path` and query parameters are sorted.
pub fn normalize_uri(uri: &str) -> String {
    let uri = uri.trim();
    let (base, query) = match uri.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (uri, None),
    };
    let base = match base.split_once(':') {
        Some((scheme, rest)) => format!("{scheme}:{}", rest.trim_start_matches("//")),
        None => base.to_string(),
    };
    match query {
        Some(query) if !query.is_empty() => {
            let mut params: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
            params.sort_unstable();
            format!("{base}?{}", params.join("&"))
        }
        _ => base,
    }
}

/// Matches an endpoint uri against a pattern.
///
/// Tries the raw strings, then their normalized forms; a pattern without
/// query parameters ignores the uri's query.
pub fn match_endpoint(uri: &str, pattern: &str) -> bool {
    if uri == pattern {
        return true;
    }
    let normalized_uri = normalize_uri(uri);
    let normalized_pattern = normalize_uri(pattern);
    if normalized_uri == normalized_pattern {
        return true;
    }
    let candidate = if !pattern.contains('?') {
        normalized_uri
            .split_once('?')
            .map(|(base, _)| base.to_string())
            .unwrap_or(normalized_uri)
    } else {
        normalized_uri
    };
    match_pattern(&candidate, pattern) || match_pattern(&candidate, &normalized_pattern)
}
