use crate::domain::dialect::DialectConfig;
use anyhow::{Context, Result};
use std::fs;

/// Load a dialect from a TOML file. Fields left out keep their Locust defaults.
pub fn load_dialect(path: &str) -> Result<DialectConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dialect file {}", path))?;
    let dialect = parse_dialect(&text)
        .with_context(|| format!("Invalid dialect file {}", path))?;
    tracing::info!(path, roots = ?dialect.root_bases, "loaded dialect");
    Ok(dialect)
}

pub fn parse_dialect(text: &str) -> Result<DialectConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::HttpMethod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_dialect_keeps_defaults() {
        let dialect = parse_dialect(
            r#"
root_bases = ["ApiUser"]
task_markers = ["task", "step"]

[verbs]
fetch = "GET"
"#,
        )
        .unwrap();

        assert_eq!(dialect.root_bases, vec!["ApiUser"]);
        assert_eq!(dialect.task_markers, vec!["task", "step"]);
        assert_eq!(dialect.verbs.len(), 1);
        assert_eq!(dialect.verb("fetch"), Some(HttpMethod::Get));
        assert_eq!(dialect.wait_time_attribute, "wait_time");
        assert_eq!(dialect.client_accessors, vec!["client"]);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(parse_dialect("root_base = [\"X\"]\n").is_err());
        assert!(parse_dialect("[verbs]\nfetch = \"BREW\"\n").is_err());
    }

    #[test]
    fn test_load_dialect_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "client_accessors = [\"client\", \"rest\"]").unwrap();

        let dialect = load_dialect(file.path().to_str().unwrap()).unwrap();
        assert_eq!(dialect.client_accessors, vec!["client", "rest"]);
        assert!(load_dialect("/nonexistent/dialect.toml").is_err());
    }
}
