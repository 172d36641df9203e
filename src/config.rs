use crate::datastore::{StoreOptions, DEFAULT_MANIFEST};
use anyhow::{bail, Context};
use std::path::PathBuf;

const DEFAULT_LOG: &str = "log.txt";
const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Server settings, read from `DOCSTORE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    /// Relative paths are taken from `root`.
    pub log_file: PathBuf,
    pub bind: String,
    pub manifest: String,
    pub documents: Vec<String>,
    pub discover: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let root = match lookup("DOCSTORE_ROOT") {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir().context("reading current directory")?,
        };
        let log_file = root.join(lookup("DOCSTORE_LOG").unwrap_or_else(|| DEFAULT_LOG.to_string()));
        let documents = lookup("DOCSTORE_DOCUMENTS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let discover = match lookup("DOCSTORE_DISCOVER") {
            Some(flag) => parse_flag("DOCSTORE_DISCOVER", &flag)?,
            None => false,
        };

        Ok(Config {
            root,
            log_file,
            bind: lookup("DOCSTORE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            manifest: lookup("DOCSTORE_MANIFEST").unwrap_or_else(|| DEFAULT_MANIFEST.to_string()),
            documents,
            discover,
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::new(self.root.clone())
            .manifest(self.manifest.clone())
            .documents(self.documents.clone())
    }
}

fn parse_flag(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{} must be a boolean, got {:?}", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[("DOCSTORE_ROOT", "/srv/docs")])).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/docs"));
        assert_eq!(config.log_file, PathBuf::from("/srv/docs/log.txt"));
        assert_eq!(config.bind, "127.0.0.1:5000");
        assert_eq!(config.manifest, "package.json");
        assert!(config.documents.is_empty());
        assert!(!config.discover);
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DOCSTORE_ROOT", "/srv/docs"),
            ("DOCSTORE_LOG", "/var/log/docstore.txt"),
            ("DOCSTORE_BIND", "0.0.0.0:8088"),
            ("DOCSTORE_DOCUMENTS", "user.json, post.json,,"),
            ("DOCSTORE_DISCOVER", "Yes"),
        ]))
        .unwrap();
        assert_eq!(config.log_file, PathBuf::from("/var/log/docstore.txt"));
        assert_eq!(config.bind, "0.0.0.0:8088");
        assert_eq!(config.documents, vec!["user.json", "post.json"]);
        assert!(config.discover);

        let options = config.store_options();
        assert_eq!(options.documents, config.documents);
        assert_eq!(options.root, config.root);
    }

    #[test]
    fn rejects_bad_flag() {
        let err = Config::from_lookup(lookup(&[
            ("DOCSTORE_ROOT", "/srv/docs"),
            ("DOCSTORE_DISCOVER", "maybe"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DOCSTORE_DISCOVER"));
    }
}
