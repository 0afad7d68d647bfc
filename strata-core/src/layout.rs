//! On-disk layout.
//!
//! ```text
//! <base>/
//! ├── episodes/                      # L00001_*.txt, input of the bottom tier
//! ├── digests/
//! │   ├── tracking.json              # TrackingState
//! │   ├── 1_weekly/                  # confirmed artifacts W0001_<title>.json
//! │   │   └── provisional/           # W0002_individual.json
//! │   └── …
//! └── essences/
//!     ├── staging.json               # StagingBuffer (all tiers)
//!     └── confirmed_index.json       # ConfirmedIndex (all tiers)
//! ```

use std::path::{Path, PathBuf};

use crate::config::StrataConfig;
use crate::error::{Error, Result};
use crate::tier::TierDefinition;

const STAGING_FILE: &str = "staging.json";
const INDEX_FILE: &str = "confirmed_index.json";
const TRACKING_FILE: &str = "tracking.json";
const PROVISIONAL_DIR: &str = "provisional";

/// Resolved filesystem locations.
#[derive(Debug, Clone)]
pub struct Layout {
    pub base_dir: PathBuf,
    pub episodes_dir: PathBuf,
    pub digests_dir: PathBuf,
    pub essences_dir: PathBuf,
    pub template_dir: Option<PathBuf>,
}

impl Layout {
    /// Resolve paths from configuration
    pub fn from_config(config: &StrataConfig) -> Self {
        let paths = &config.paths;
        let base = paths.base_dir.clone();
        let resolve = |over: &Option<PathBuf>, default: &str| match over {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => base.join(p),
            None => base.join(default),
        };

        Self {
            episodes_dir: resolve(&paths.episodes_dir, "episodes"),
            digests_dir: resolve(&paths.digests_dir, "digests"),
            essences_dir: resolve(&paths.essences_dir, "essences"),
            template_dir: paths.template_dir.as_ref().map(|t| {
                if t.is_absolute() { t.clone() } else { base.join(t) }
            }),
            base_dir: base,
        }
    }

    /// Directory of a tier's confirmed artifacts
    pub fn tier_dir(&self, tier: &TierDefinition) -> PathBuf {
        self.digests_dir.join(&tier.directory_name)
    }

    /// Directory of a tier's provisional queues
    pub fn provisional_dir(&self, tier: &TierDefinition) -> PathBuf {
        self.tier_dir(tier).join(PROVISIONAL_DIR)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.essences_dir.join(STAGING_FILE)
    }

    pub fn index_path(&self) -> PathBuf {
        self.essences_dir.join(INDEX_FILE)
    }

    pub fn tracking_path(&self) -> PathBuf {
        self.digests_dir.join(TRACKING_FILE)
    }

    pub fn staging_template(&self) -> Option<PathBuf> {
        self.template(STAGING_FILE)
    }

    pub fn index_template(&self) -> Option<PathBuf> {
        self.template(INDEX_FILE)
    }

    pub fn tracking_template(&self) -> Option<PathBuf> {
        self.template(TRACKING_FILE)
    }

    fn template(&self, name: &str) -> Option<PathBuf> {
        self.template_dir.as_ref().map(|dir| dir.join(name))
    }
}

/// File names (not paths) of regular files in a directory, sorted.
///
/// A missing directory yields an empty list.
pub fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::file_io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::file_io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Error::file_io(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::TierRegistry;
    use tempfile::tempdir;

    #[test]
    fn test_default_layout() {
        let layout = Layout::from_config(&StrataConfig::with_base_dir("/data"));
        let registry = TierRegistry::standard();
        let weekly = registry.resolve("weekly").unwrap();

        assert_eq!(layout.episodes_dir, PathBuf::from("/data/episodes"));
        assert_eq!(layout.tier_dir(weekly), PathBuf::from("/data/digests/1_weekly"));
        assert_eq!(
            layout.provisional_dir(weekly),
            PathBuf::from("/data/digests/1_weekly/provisional")
        );
        assert_eq!(layout.staging_path(), PathBuf::from("/data/essences/staging.json"));
        assert!(layout.staging_template().is_none());
    }

    #[test]
    fn test_overrides() {
        let mut config = StrataConfig::with_base_dir("/data");
        config.paths.episodes_dir = Some(PathBuf::from("/var/loops"));
        config.paths.template_dir = Some(PathBuf::from("templates"));
        let layout = Layout::from_config(&config);

        assert_eq!(layout.episodes_dir, PathBuf::from("/var/loops"));
        assert_eq!(
            layout.index_template(),
            Some(PathBuf::from("/data/templates/confirmed_index.json"))
        );
    }

    #[test]
    fn test_list_file_names() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("W0002.json"), "{}").unwrap();
        std::fs::write(dir.path().join("W0001.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("provisional")).unwrap();

        assert_eq!(list_file_names(dir.path()).unwrap(), vec!["W0001.json", "W0002.json"]);
        assert!(list_file_names(&dir.path().join("missing")).unwrap().is_empty());
    }
}
