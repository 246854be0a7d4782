use std::path::Path;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Assembled once at startup and injected through `AppState`; nothing reads
/// ambient environment state after this.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let openai_api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            // The key is sometimes present only in a local .env file that was
            // never exported into the process environment; scan it directly
            // before giving up.
            _ => recover_key_from_env_file(Path::new(".env"))
                .context("OPENAI_API_KEY is not set and could not be recovered from .env")?,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openai_api_key,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Scans a dotenv-style file for an `OPENAI_API_KEY=` line, stripping
/// surrounding quotes. Errors when the file or the line is absent.
fn recover_key_from_env_file(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;

    for line in contents.lines() {
        if let Some(value) = line.trim().strip_prefix("OPENAI_API_KEY=") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if !value.is_empty() {
                return Ok(value.to_string());
            }
        }
    }

    anyhow::bail!("No OPENAI_API_KEY entry in {}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_recover_key_from_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DATABASE_URL=postgres://localhost/inframap").unwrap();
        writeln!(file, "OPENAI_API_KEY=\"sk-test-abc123\"").unwrap();

        let key = recover_key_from_env_file(file.path()).unwrap();
        assert_eq!(key, "sk-test-abc123");
    }

    #[test]
    fn test_recover_key_strips_single_quotes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "OPENAI_API_KEY='sk-test-xyz'").unwrap();

        let key = recover_key_from_env_file(file.path()).unwrap();
        assert_eq!(key, "sk-test-xyz");
    }

    #[test]
    fn test_recover_key_missing_entry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DATABASE_URL=postgres://localhost/inframap").unwrap();

        assert!(recover_key_from_env_file(file.path()).is_err());
    }

    #[test]
    fn test_recover_key_missing_file() {
        assert!(recover_key_from_env_file(Path::new("/definitely/not/here/.env")).is_err());
    }
}
