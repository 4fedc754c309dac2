//! Git configuration files, read for the default identity
//!
//! Files are INI documents (`[user]` section, `name = ...`). Layers are consulted
//! in order and the first one defining a key wins, so the repository's own
//! `config` shadows the user's global files.

use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct GitConfig {
    layers: Vec<Config>,
}

impl GitConfig {
    /// Load every existing file of `paths`, highest priority first
    ///
    /// A file that cannot be parsed is skipped with a warning; it only ever
    /// provides defaults.
    pub fn load(paths: &[PathBuf]) -> Self {
        let layers = paths
            .iter()
            .filter(|path| path.is_file())
            .filter_map(|path| match Self::load_file(path) {
                Ok(config) => {
                    debug!("loaded git config {}", path.display());
                    Some(config)
                }
                Err(err) => {
                    warn!("ignoring unreadable git config {}: {err}", path.display());
                    None
                }
            })
            .collect();

        Self { layers }
    }

    /// Repository config, then `~/.gitconfig`, then `$XDG_CONFIG_HOME/git/config`
    pub fn for_git_dir(git_dir: &Path) -> Self {
        let mut paths = vec![git_dir.join("config")];
        if let Some(dirs) = directories::BaseDirs::new() {
            paths.push(dirs.home_dir().join(".gitconfig"));
            paths.push(dirs.config_dir().join("git").join("config"));
        }

        Self::load(&paths)
    }

    fn load_file(path: &Path) -> Result<Config, config::ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()
    }

    /// Value of a `section.key` entry, e.g. `user.name`
    pub fn get(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .find_map(|config| config.get_string(key).ok())
            .map(|value| unquote(value.trim()).to_string())
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
        .unwrap_or(value)
}
