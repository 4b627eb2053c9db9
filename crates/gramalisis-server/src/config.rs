use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

/// Server settings, read from `GRAMALISIS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// JSON file replacing the built-in learning stages
    pub stages_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            db_path: PathBuf::from("gramalisis.db"),
            jwt_secret: DEFAULT_JWT_SECRET.into(),
            stages_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match lookup("GRAMALISIS_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("GRAMALISIS_PORT is not a port number: {}", raw))?,
            None => defaults.port,
        };

        Ok(Self {
            host: lookup("GRAMALISIS_HOST").unwrap_or(defaults.host),
            port,
            db_path: lookup("GRAMALISIS_DB_PATH").map_or(defaults.db_path, PathBuf::from),
            jwt_secret: lookup("GRAMALISIS_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            stages_path: lookup("GRAMALISIS_STAGES_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.uses_default_secret());
        assert_eq!(config.addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GRAMALISIS_HOST", "127.0.0.1"),
            ("GRAMALISIS_PORT", "8080"),
            ("GRAMALISIS_DB_PATH", "/tmp/g.db"),
            ("GRAMALISIS_JWT_SECRET", "s3cret"),
            ("GRAMALISIS_STAGES_PATH", "stages.json"),
        ]))
        .unwrap();

        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.db_path, PathBuf::from("/tmp/g.db"));
        assert!(!config.uses_default_secret());
        assert_eq!(config.stages_path, Some(PathBuf::from("stages.json")));
    }

    #[test]
    fn test_bad_port() {
        assert!(Config::from_lookup(lookup(&[("GRAMALISIS_PORT", "http")])).is_err());
    }
}
