//! Persisted plugin configuration: API key, base URL and named endpoint shortcuts.

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

/// Default name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access the configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("configuration store was poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for ConfigError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Snapshot of the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub api_key: String,
    pub base_url: String,

    /// Short names of the API endpoints, mapped to their URLs.
    #[serde(default)]
    pub apis: BTreeMap<String, String>,
}

impl Configuration {
    /// Resolve an endpoint shortcut into its URL. Anything which is not a known shortcut is
    /// assumed to be a URL already and is returned as is.
    pub fn endpoint<'a>(&'a self, name_or_url: &'a str) -> &'a str {
        self.apis
            .get(name_or_url)
            .map(String::as_str)
            .unwrap_or(name_or_url)
    }
}

/// Durable key-value storage of the [`Configuration`].
///
/// There is no protection against concurrent writers, the last one wins.
pub trait ConfigStore {
    /// Load the whole document.
    fn read(&self) -> Result<Configuration, ConfigError>;

    /// Set a single key, rewriting the whole document. Keys unknown to [`Configuration`] are kept.
    fn write(&self, key: &str, value: toml::Value) -> Result<(), ConfigError>;
}

/// [`ConfigStore`] backed by a TOML file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store using [`CONFIG_FILE`] inside given directory.
    pub fn in_dir<P: Into<PathBuf>>(directory: P) -> Self {
        Self::new(directory.into().join(CONFIG_FILE))
    }

    fn read_table(&self) -> Result<toml::Table, ConfigError> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(text.parse::<toml::Table>()?)
    }
}

impl ConfigStore for FileStore {
    fn read(&self) -> Result<Configuration, ConfigError> {
        Ok(toml::Value::Table(self.read_table()?).try_into()?)
    }

    fn write(&self, key: &str, value: toml::Value) -> Result<(), ConfigError> {
        let mut table = self.read_table()?;
        table.insert(key.to_owned(), value);

        log::debug!("Writing '{key}' to {}.", self.path.display());
        std::fs::write(&self.path, toml::to_string_pretty(&table)?)?;
        Ok(())
    }
}

/// [`ConfigStore`] keeping the document in memory. Useful in tests and for hosts which persist
/// the configuration on their own.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<toml::Table>,
}

impl MemoryStore {
    pub fn new(configuration: &Configuration) -> Result<Self, ConfigError> {
        let table = match toml::Value::try_from(configuration)? {
            toml::Value::Table(table) => table,
            _ => toml::Table::new(),
        };
        Ok(Self {
            table: Mutex::new(table),
        })
    }
}

impl ConfigStore for MemoryStore {
    fn read(&self) -> Result<Configuration, ConfigError> {
        let table = self.table.lock()?.clone();
        Ok(toml::Value::Table(table).try_into()?)
    }

    fn write(&self, key: &str, value: toml::Value) -> Result<(), ConfigError> {
        self.table.lock()?.insert(key.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
api_key = "secret"
base_url = "https://api.noegig.at/v1.2"
theme = "dark"

[apis]
pops = "/pops?format=geojson"
trenches = "/trenches"
"#;

    fn store_with_document() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), DOCUMENT).unwrap();
        let store = FileStore::in_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn reading_whole_document() {
        let (_dir, store) = store_with_document();
        let configuration = store.read().unwrap();

        assert_eq!(configuration.api_key, "secret");
        assert_eq!(configuration.base_url, "https://api.noegig.at/v1.2");
        assert_eq!(configuration.apis.len(), 2);
        assert_eq!(configuration.apis["trenches"], "/trenches");
    }

    #[test]
    fn writing_single_key_keeps_the_rest() {
        let (dir, store) = store_with_document();
        store
            .write("api_key", toml::Value::String("rotated".to_owned()))
            .unwrap();

        let configuration = store.read().unwrap();
        assert_eq!(configuration.api_key, "rotated");
        assert_eq!(configuration.apis["pops"], "/pops?format=geojson");

        // Keys the library does not know about survive too.
        let raw = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let table = raw.parse::<toml::Table>().unwrap();
        assert_eq!(
            table.get("theme").and_then(toml::Value::as_str),
            Some("dark")
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        assert!(matches!(store.read(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "api_key = ").unwrap();
        let store = FileStore::in_dir(dir.path());
        assert!(matches!(store.read(), Err(ConfigError::Parse(_))));

        // Valid TOML, but the base URL is missing.
        std::fs::write(dir.path().join(CONFIG_FILE), "api_key = \"x\"").unwrap();
        assert!(matches!(store.read(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn memory_store_last_writer_wins() {
        let store = MemoryStore::new(&Configuration {
            api_key: "first".to_owned(),
            base_url: "http://localhost".to_owned(),
            apis: BTreeMap::new(),
        })
        .unwrap();

        store.write("api_key", "second".into()).unwrap();
        store.write("api_key", "third".into()).unwrap();

        assert_eq!(store.read().unwrap().api_key, "third");
    }

    #[test]
    fn resolving_endpoints() {
        let (_dir, store) = store_with_document();
        let configuration = store.read().unwrap();

        assert_eq!(configuration.endpoint("pops"), "/pops?format=geojson");
        assert_eq!(configuration.endpoint("/custom/path"), "/custom/path");
    }
}
