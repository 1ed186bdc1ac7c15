//! Settings: where the city guides and the reference standards live.
//!
//! Values come from an optional `nfse.toml` in the base directory; every key
//! has a default, so the file may be absent or partial.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the optional settings file inside the base directory.
pub const SETTINGS_FILE: &str = "nfse.toml";

/// Workspace layout settings. Relative paths are resolved against
/// `base_path`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base directory (not read from the file).
    #[serde(skip)]
    pub base_path: PathBuf,
    /// Directory holding one sub-directory per city slug.
    pub guides_dir: PathBuf,
    /// Municipal standard reference document.
    pub municipal_reference: PathBuf,
    /// National standard reference document.
    pub national_reference: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            guides_dir: PathBuf::from("work/guides"),
            municipal_reference: PathBuf::from("data/padrao-municipal.json"),
            // file name as shipped in data/
            national_reference: PathBuf::from("data/padrao-nacioanal.json"),
        }
    }
}

impl Settings {
    /// Loads settings for `base_path`, reading `nfse.toml` there if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be read, or
    /// [`Error::Config`] if it is not valid TOML for these settings.
    pub fn load(base_path: &Path) -> Result<Self> {
        let file = base_path.join(SETTINGS_FILE);
        let mut settings = if file.exists() {
            let text = std::fs::read_to_string(&file).map_err(|source| Error::Io {
                path: file.clone(),
                source,
            })?;
            debug!(path = %file.display(), "settings file loaded");
            toml::from_str(&text).map_err(|source| Error::Config {
                path: file.clone(),
                source,
            })?
        } else {
            Self::default()
        };
        settings.base_path = base_path.to_path_buf();
        Ok(settings)
    }

    /// Defaults rooted at `base_path`, without reading any file.
    #[must_use]
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Resolved path of the municipal reference document.
    #[must_use]
    pub fn municipal_reference_path(&self) -> PathBuf {
        self.base_path.join(&self.municipal_reference)
    }

    /// Resolved path of the national reference document.
    #[must_use]
    pub fn national_reference_path(&self) -> PathBuf {
        self.base_path.join(&self.national_reference)
    }

    /// File locations for one city.
    #[must_use]
    pub fn city(&self, slug: &str) -> CityPaths {
        let dir = self.base_path.join(&self.guides_dir).join(slug);
        CityPaths {
            fields: dir.join(format!("{slug}-fields.json")),
            schema: dir.join(format!("{slug}-schema.json")),
            sample: dir.join(format!("{slug}-json-fake.json")),
            partition: dir.join(format!("{slug}-json-docs.json")),
            doc: dir.join("doc.json"),
            dir,
        }
    }
}

/// Per-city file locations under the guides directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityPaths {
    /// The city's directory.
    pub dir: PathBuf,
    /// Extracted field records (builder input).
    pub fields: PathBuf,
    /// Built schema tree.
    pub schema: PathBuf,
    /// Sample payload.
    pub sample: PathBuf,
    /// Requirement partition.
    pub partition: PathBuf,
    /// Coverage document.
    pub doc: PathBuf,
}
