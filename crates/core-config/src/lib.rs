//! Configuration loading and parsing.
//!
//! Parses `termline.toml` (or an override path provided by the binary):
//!
//! * `[prompt] primary / continuation`: prompt strings.
//! * `[history] max_entries`: history cap, `0` keeps everything.
//! * `[keymap]`: extra bindings from a code-point sequence (TOML string
//!   escapes such as `"\u0017"` are the usual way to spell control keys) to
//!   an editing function name. These are applied on top of the standard
//!   keymap, so they override it.
//!
//! A missing file or a parse error yields the defaults. Unknown fields are
//! ignored to allow forward evolution.

use anyhow::Result;
use core_keymap::Keymap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::{debug, info, warn};

pub const FILE_NAME: &str = "termline.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    #[serde(default = "PromptConfig::default_primary")]
    pub primary: String,
    #[serde(default = "PromptConfig::default_continuation")]
    pub continuation: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            primary: Self::default_primary(),
            continuation: Self::default_continuation(),
        }
    }
}

impl PromptConfig {
    fn default_primary() -> String {
        "% ".to_string()
    }
    fn default_continuation() -> String {
        "> ".to_string()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
        }
    }
}

impl HistoryConfig {
    const fn default_max_entries() -> usize {
        500
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    /// Sequence -> function name.
    #[serde(default)]
    pub keymap: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File the settings were read from; `None` when defaults are in effect.
    pub source: Option<PathBuf>,
    pub file: ConfigFile, // parsed (or default) data
}

/// Best-effort config path: `./termline.toml` first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("termline").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        debug!(target: "config", path = %path.display(), "config_file_absent");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(
                target: "config",
                path = %path.display(),
                bindings = file.keymap.len(),
                "config_loaded"
            );
            Ok(Config {
                source: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Standard keymap extended with the configured bindings.
    pub fn keymap(&self) -> Keymap {
        let mut keymap = Keymap::standard();
        self.apply_keymap(&mut keymap);
        keymap
    }

    /// Add the configured bindings to `keymap`. Returns how many were applied.
    pub fn apply_keymap(&self, keymap: &mut Keymap) -> usize {
        let mut applied = 0;
        for (sequence, function) in &self.file.keymap {
            let code_points: Vec<char> = sequence.chars().collect();
            if code_points.is_empty() || function.is_empty() {
                warn!(target: "config", function = %function, "keymap_binding_skipped");
                continue;
            }
            keymap.bind_function(&code_points, function.as_str());
            applied += 1;
        }
        applied
    }
}
