use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `~/.ngaji/config.yml`. Every field is optional; CLI flags win.
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub source: Option<String>,
    pub page_size: Option<usize>,
    #[serde(alias = "window")]
    pub time_window: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub no_color: Option<bool>,
    pub auto_refresh: Option<bool>,
    /// Seconds between automatic refreshes in watch mode.
    pub refresh_interval: Option<u64>,
    pub quran: Option<QuranConfig>,
    pub videos: Option<VideoConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct QuranConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct VideoConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub query: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub max_results: Option<u32>,
    pub relevance_language: Option<String>,
    pub region_code: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("config file not found '{}'", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write config '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .find_map(|var| env::var_os(var).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    home_dir()
        .map(|home| home.join(".ngaji").join("config.yml"))
        .ok_or(ConfigError::NoHome)
}

/// Resolves a leading `~` against the home directory; other paths pass through.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
        _ => return PathBuf::from(path),
    };
    match home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).display().to_string()
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    let parsed: Option<ConfigFile> = serde_yaml::from_str(contents)?;
    Ok(parsed.unwrap_or_default())
}

/// Reads `path`; a missing file yields the empty config when `allow_missing`.
pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if allow_missing {
                return Ok(ConfigFile::default());
            }
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn default_config_yaml() -> String {
    r#"# ngaji config
#
# Location (default):
#   ~/.ngaji/config.yml
#
# Command-line flags override every value here.

# Which page to browse: quran or videos
source: quran

# Cards per list page
page_size: 12

# Time window for the video page: all, today, week, month
time_window: all

# Output (optional)
# output: ./ngaji.html
# output_format: html

# HTTP
timeout: 10
# proxy: http://127.0.0.1:8080

# Watch mode
auto_refresh: false
refresh_interval: 120

# Output styling
no_color: false

quran:
  base_url: https://api.alquran.cloud/v1

videos:
  base_url: https://www.googleapis.com/youtube/v3
  # api_key: YOUR_YOUTUBE_DATA_API_KEY
  query: ustadz mbois
  keywords:
    - mbois
    - ustadz
  max_results: 50
  relevance_language: id
  region_code: ID
"#
    .to_string()
}

/// Writes the commented starter file unless one exists. Returns whether it wrote.
pub fn ensure_default_config_file(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, default_config_yaml()).map_err(write_err)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaml_parses_with_expected_values() {
        let cfg = parse_config(&default_config_yaml()).unwrap();
        assert_eq!(cfg.source.as_deref(), Some("quran"));
        assert_eq!(cfg.page_size, Some(12));
        assert_eq!(cfg.refresh_interval, Some(120));
        let videos = cfg.videos.unwrap();
        assert_eq!(videos.api_key, None);
        assert_eq!(videos.max_results, Some(50));
        assert_eq!(
            videos.keywords,
            Some(vec!["mbois".to_string(), "ustadz".to_string()])
        );
    }

    #[test]
    fn empty_file_is_default_config() {
        let cfg = parse_config("").unwrap();
        assert!(cfg.source.is_none());
        assert!(cfg.videos.is_none());
    }

    #[test]
    fn window_alias_is_accepted() {
        let cfg = parse_config("window: week\n").unwrap();
        assert_eq!(cfg.time_window.as_deref(), Some("week"));
    }

    #[test]
    fn missing_file_respects_allow_missing() {
        let path = std::env::temp_dir().join("ngaji-config-does-not-exist.yml");
        assert!(load_config(&path, true).is_ok());
        assert!(matches!(
            load_config(&path, false),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn broken_yaml_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("ngaji-bad-{}.yml", std::process::id()));
        std::fs::write(&path, "page_size: [oops\n").unwrap();
        let err = load_config(&path, false).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn tilde_expands_only_as_prefix() {
        assert_eq!(expand_tilde("./a~b.yml"), PathBuf::from("./a~b.yml"));
        assert_eq!(expand_tilde("~user/x"), PathBuf::from("~user/x"));
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/.ngaji/config.yml"), home.join(".ngaji/config.yml"));
        }
    }

    #[test]
    fn ensure_default_writes_once() {
        let dir = std::env::temp_dir().join(format!("ngaji-config-{}", std::process::id()));
        let path = dir.join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        std::fs::write(&path, "source: videos\n").unwrap();
        assert!(!ensure_default_config_file(&path).unwrap());
        let cfg = load_config(&path, false).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(cfg.source.as_deref(), Some("videos"));
    }
}
