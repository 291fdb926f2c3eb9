/// Normalizes a request path (or full URL) into the endpoint key stats are grouped under.
///
/// The scheme/authority and query string are dropped and every all-digit path segment is
/// replaced with `:id`, so `/api/lessons/17/quiz?x=1` becomes `/api/lessons/:id/quiz`.
pub fn normalize_endpoint(target: &str) -> String {
    let path = strip_authority(target);
    let path = path.split(['?', '#']).next().unwrap_or("");

    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    let mut out = String::with_capacity(path.len());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            out.push_str(":id");
        } else {
            out.push_str(segment);
        }
    }

    if out.is_empty() {
        out.push('/');
    }
    out
}

fn strip_authority(target: &str) -> &str {
    let Some((_, rest)) = target.split_once("://") else {
        return target;
    };
    match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "/",
    }
}
