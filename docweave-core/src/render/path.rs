//! Page-relative URL computation.

/// The path of `url` without a scheme and host.
pub fn strip_scheme_and_host(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |slash| &rest[slash..]),
        None => url,
    }
}

fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

/// A URL relative to the page at `from` that points at `to`.
///
/// One `..` is emitted per component of `from` past the common prefix,
/// followed by the remaining components of `to`. Linking a page to itself
/// returns its own (scheme and host stripped) path.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_path = strip_scheme_and_host(from);
    let to_path = strip_scheme_and_host(to);
    let (to_path, fragment) = match to_path.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (to_path, None),
    };

    let from_components = components(from_path);
    let to_components = components(to_path);

    let mut relative = if from_components == to_components {
        to_path.to_string()
    } else {
        let common = from_components
            .iter()
            .zip(&to_components)
            .take_while(|(a, b)| a == b)
            .count();
        let mut parts: Vec<&str> = vec![".."; from_components.len() - common];
        parts.extend(&to_components[common..]);
        parts.join("/")
    };

    if let Some(fragment) = fragment {
        relative.push('#');
        relative.push_str(fragment);
    }
    relative
}

/// Resolve `relative` against the page at `from`; the inverse of [`relative_path`].
pub fn join_relative(from: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        return relative.to_string();
    }
    let mut stack = components(strip_scheme_and_host(from));
    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}

/// A heading or title turned into a URL fragment: whitespace runs become
/// `-`, characters that are not URL-safe are removed.
pub fn url_readable_fragment(text: &str) -> String {
    let mut fragment = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars() {
        if c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')) {
            continue;
        }
        if pending_dash && !fragment.is_empty() {
            fragment.push('-');
        }
        pending_dash = false;
        fragment.push(c);
    }
    fragment
}
