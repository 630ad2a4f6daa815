//! Table-name secret resolution.
//!
//! The logical table name arrives as a JSON blob `{ "tableName": "..." }`
//! from the deployment's secret store. It is resolved exactly once, before
//! the listener binds, and injected into the server state; a resolution
//! failure is fatal to startup.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Environment variable carrying the raw secret blob. Takes precedence over
/// the configured secret file.
pub const TABLE_NAME_SECRET_ENV: &str = "TABLE_NAME_SECRET";

#[derive(Debug, Deserialize)]
struct TableNameSecret {
    #[serde(rename = "tableName")]
    table_name: String,
}

/// Resolve the logical table name from `TABLE_NAME_SECRET` or, failing that,
/// the secret file at `secret_file`.
pub fn resolve_table_name(secret_file: &str) -> Result<String> {
    let blob = match std::env::var(TABLE_NAME_SECRET_ENV) {
        Ok(raw) => raw,
        Err(_) => std::fs::read_to_string(secret_file)
            .with_context(|| format!("cannot read table-name secret from {secret_file}"))?,
    };
    parse_table_name(&blob)
}

fn parse_table_name(blob: &str) -> Result<String> {
    let secret: TableNameSecret =
        serde_json::from_str(blob).context("table-name secret is not valid JSON")?;
    let name = secret.table_name.trim();
    if name.is_empty() {
        return Err(anyhow!("table-name secret has an empty tableName"));
    }
    // The name becomes part of a file path; refuse separators outright.
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(anyhow!("table-name secret contains path separators"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_blob() {
        let name = parse_table_name(r#"{ "tableName": "listings" }"#).expect("parse");
        assert_eq!(name, "listings");
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert!(parse_table_name(r#"{ "tableName": "  " }"#).is_err());
        assert!(parse_table_name(r#"{ "table": "listings" }"#).is_err());
        assert!(parse_table_name("not json").is_err());
    }

    #[test]
    fn rejects_path_separators() {
        assert!(parse_table_name(r#"{ "tableName": "../etc/passwd" }"#).is_err());
        assert!(parse_table_name(r#"{ "tableName": "a/b" }"#).is_err());
    }

    #[test]
    fn reads_blob_from_file() {
        let tmp = std::env::temp_dir().join(format!("table_secret_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&tmp, r#"{ "tableName": "listings-test" }"#).expect("write secret");
        let name = resolve_table_name(tmp.to_str().expect("utf8 path")).expect("resolve");
        assert_eq!(name, "listings-test");
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(resolve_table_name("/nonexistent/secret.json").is_err());
    }
}
