use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::EntryOrder;

/// Default piece length in bytes (256 KiB)
pub const DEFAULT_PIECE_LENGTH: u64 = 256 * 1024;

/// Port appended to legacy announce urls
pub const DEFAULT_LEGACY_PORT: &str = "6881";

/// Path appended to legacy announce urls
pub const DEFAULT_LEGACY_PATH: &str = "/announce";

/// Default bound on directory nesting below a source directory
pub const MAX_RECURSION: usize = 29;

/// Announce urls beyond this count are dropped
pub const MAX_ANNOUNCE: usize = 100;

/// Name used when an assortment of paths shares no directory
pub const FALLBACK_ROOT_NAME: &str = "root";

/// Size of a SHA-1 piece hash
pub const PIECE_HASH_LEN: usize = 20;

/// Value of the `created by` key
pub const CREATED_BY: &str = concat!("createtorrent/", env!("CARGO_PKG_VERSION"));

/// A set of defaults. The top level of the config file is one, and every
/// `[profiles.<name>]` table is another.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Profile {
    pub announce: Option<Vec<String>>,
    pub port: Option<String>,
    pub path: Option<String>,
    pub piece_length: Option<u64>,
    pub comment: Option<String>,
    pub private: Option<bool>,
    pub inclusive: Option<bool>,
    pub max_depth: Option<usize>,
    pub order: Option<EntryOrder>,
    pub no_date: Option<bool>,
}

impl Profile {
    /// Fill every unset field from `fallback`.
    pub fn or(self, fallback: &Profile) -> Profile {
        Profile {
            announce: self.announce.or_else(|| fallback.announce.clone()),
            port: self.port.or_else(|| fallback.port.clone()),
            path: self.path.or_else(|| fallback.path.clone()),
            piece_length: self.piece_length.or(fallback.piece_length),
            comment: self.comment.or_else(|| fallback.comment.clone()),
            private: self.private.or(fallback.private),
            inclusive: self.inclusive.or(fallback.inclusive),
            max_depth: self.max_depth.or(fallback.max_depth),
            order: self.order.or(fallback.order),
            no_date: self.no_date.or(fallback.no_date),
        }
    }
}

/// User configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub defaults: Profile,
    pub profiles: BTreeMap<String, Profile>,
}

impl Config {
    /// Platform config file location, e.g. `~/.config/createtorrent/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "createtorrent")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the config. An explicit path must exist; the default location is
    /// optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.is_file() => p,
                _ => return Ok(Self::default()),
            },
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Resolve the effective defaults, layering a named profile over the
    /// top-level values.
    pub fn profile(&self, name: Option<&str>) -> Result<Profile> {
        match name {
            None => Ok(self.defaults.clone()),
            Some(name) => {
                let profile = self
                    .profiles
                    .get(name)
                    .with_context(|| format!("Unknown profile: {}", name))?;
                Ok(profile.clone().or(&self.defaults))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_by_tag() {
        assert!(CREATED_BY.starts_with("createtorrent/"));
        assert!(CREATED_BY.len() > "createtorrent/".len());
    }

    #[test]
    fn test_parse_profiles() {
        let config = Config::parse(
            r#"
            announce = ["http://tracker.example.com/a/announce"]
            piece-length = 65536
            order = "filesystem"

            [profiles.private]
            private = true
            announce = ["http://private.example.org/x/announce"]
            "#,
        )
        .unwrap();

        let defaults = config.profile(None).unwrap();
        assert_eq!(defaults.piece_length, Some(65536));
        assert_eq!(defaults.order, Some(EntryOrder::Filesystem));
        assert_eq!(defaults.private, None);

        let private = config.profile(Some("private")).unwrap();
        assert_eq!(private.private, Some(true));
        assert_eq!(private.piece_length, Some(65536));
        assert_eq!(
            private.announce.unwrap(),
            vec!["http://private.example.org/x/announce"]
        );

        assert!(config.profile(Some("missing")).is_err());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::parse("").unwrap();
        assert!(config.profiles.is_empty());
        assert!(config.defaults.announce.is_none());
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
