/// Normalize a controller base URL: trim whitespace and trailing slashes.
pub fn normalize_base_url(input: &str) -> String {
    input.trim().trim_end_matches('/').to_owned()
}

/// Join path segments onto a base URL with single `/` separators.
pub fn join_path(base: &str, segments: &[&str]) -> String {
    let mut url = normalize_base_url(base);
    for segment in segments {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(segment);
    }
    url
}

/// Append an encoded query string, choosing `?` or `&` based on whether the
/// URL already carries one.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_owned();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}
