//! Dependency path normalization

/// Normalize a declared dependency target against the declaring function's
/// directory.
///
/// Targets starting with `./` or `../` are resolved relative to `source_dir`;
/// anything else is taken as root-relative. `.` and `..` segments are
/// collapsed; `..` above the root is dropped rather than rejected, since the
/// resolver treats unresolvable targets as external references anyway.
pub fn normalize_dependency(source_dir: &str, target: &str) -> String {
    let joined = if target.starts_with("./") || target.starts_with("../") {
        if source_dir.is_empty() {
            target.to_string()
        } else {
            format!("{}/{}", source_dir, target)
        }
    } else {
        target.to_string()
    };
    collapse(&joined)
}

fn collapse(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
