//! Module specifier helpers

/// Split a bare specifier into its package name and optional subpath
///
/// `@scope/pkg/sub/path` -> (`@scope/pkg`, `Some("sub/path")`),
/// `lodash/get` -> (`lodash`, `Some("get")`).
pub fn split_package_specifier(specifier: &str) -> (String, Option<String>) {
    if specifier.starts_with('@') {
        // Scoped package
        let parts: Vec<&str> = specifier.splitn(3, '/').collect();
        if parts.len() >= 2 {
            let package_name = format!("{}/{}", parts[0], parts[1]);
            let subpath = parts.get(2).filter(|s| !s.is_empty()).map(|s| s.to_string());
            (package_name, subpath)
        } else {
            (specifier.to_string(), None)
        }
    } else {
        // Regular package
        match specifier.split_once('/') {
            Some((name, rest)) if !rest.is_empty() => (name.to_string(), Some(rest.to_string())),
            Some((name, _)) => (name.to_string(), None),
            None => (specifier.to_string(), None),
        }
    }
}

/// Whether `specifier` names something outside `own_namespace`
///
/// Relative, absolute and URL-like specifiers always live inside the
/// importing package, as does anything under the package's own name.
pub fn is_external_specifier(specifier: &str, own_namespace: &str) -> bool {
    if specifier.is_empty()
        || specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with('#')
    {
        return false;
    }

    // node:fs, https://..., data:...
    if let Some((scheme, _)) = specifier.split_once(':') {
        if !scheme.contains('/') {
            return false;
        }
    }

    if specifier == own_namespace {
        return false;
    }
    !specifier
        .strip_prefix(own_namespace)
        .is_some_and(|rest| rest.starts_with('/'))
}
