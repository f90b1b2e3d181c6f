//! Runtime settings read from the environment (and `.env`, via `dotenvy`).
//!
//! | Variable            | Default                 |
//! |---------------------|-------------------------|
//! | `NEO_CSV_PATH`      | `data/neos.csv`         |
//! | `CAD_JSON_PATH`     | `data/cad.json`         |
//! | `NEO_ORPHAN_POLICY` | `skip`                  |
//! | `LOG_FILE_PATH`     | `logs/neo_explorer.log` |

use anyhow::{Result, anyhow};
use std::path::PathBuf;

use crate::database::OrphanPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub neo_path: PathBuf,
    pub cad_path: PathBuf,
    pub orphan_policy: OrphanPolicy,
    pub log_file_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            neo_path: PathBuf::from("data/neos.csv"),
            cad_path: PathBuf::from("data/cad.json"),
            orphan_policy: OrphanPolicy::Skip,
            log_file_path: PathBuf::from("logs/neo_explorer.log"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Settings::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let orphan_policy = match var("NEO_ORPHAN_POLICY") {
            Some(raw) => raw
                .parse::<OrphanPolicy>()
                .map_err(|e: String| anyhow!("NEO_ORPHAN_POLICY: {e}"))?,
            None => defaults.orphan_policy,
        };

        Ok(Settings {
            neo_path: var("NEO_CSV_PATH").map_or(defaults.neo_path, PathBuf::from),
            cad_path: var("CAD_JSON_PATH").map_or(defaults.cad_path, PathBuf::from),
            orphan_policy,
            log_file_path: var("LOG_FILE_PATH").map_or(defaults.log_file_path, PathBuf::from),
        })
    }
}
