use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[error("Missing dependency: {name}")]
pub struct MissingDependency {
    pub name: String,
    #[source]
    source: which::Error,
}

/// Resolve every program in `tools` on `PATH`, stopping at the first one
/// that cannot be found.
pub fn check(tools: &[&str]) -> Result<Vec<PathBuf>, MissingDependency> {
    tools
        .iter()
        .map(|name| {
            let path = which::which(name).map_err(|source| MissingDependency {
                name: name.to_string(),
                source,
            })?;
            log::debug!("Found {} at {:?}", name, path);
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_programs_on_path() {
        let found = check(&["sh"]).expect("sh should be on PATH");
        assert_eq!(found.len(), 1);
        assert!(found[0].is_absolute());
    }

    #[test]
    fn names_first_missing_program() {
        let err = check(&["sh", "isobake-no-such-tool", "isobake-also-missing"]).unwrap_err();
        assert_eq!(err.name, "isobake-no-such-tool");
        assert_eq!(err.to_string(), "Missing dependency: isobake-no-such-tool");
    }

    #[test]
    fn empty_list_passes() {
        assert!(check(&[]).unwrap().is_empty());
    }
}
