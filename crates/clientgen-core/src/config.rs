//! Generation options.
//!
//! This module defines the `Options` struct which controls where the client is
//! written, which module name it announces, and which `x-ee.type` overrides are
//! honored. Options can be created programmatically or loaded from a YAML (or
//! TOML) file.
//!
//! # Examples
//!
//! ```no_run
//! use clientgen_core::config::Options;
//!
//! # #[tokio::main]
//! # async fn main() -> clientgen_core::Result<()> {
//! let mut options = Options::new("src/client", "client");
//! options
//!     .use_references
//!     .insert("crate::service::setup#Status".to_string());
//! options.save("clientgen.yaml").await?;
//!
//! let loaded = Options::from_file("clientgen.yaml").await?;
//! assert_eq!(loaded.target_package_name, "client");
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::collections::BTreeSet;
use std::path::Path;

use crate::utils::is_identifier;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Options to use for generating a new client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Directory of the generated file, relative to the module root
    #[serde(default)]
    pub target_directory: String,

    /// Name of the module the generated file is announced as
    #[serde(default = "default_package_name")]
    pub target_package_name: String,

    /// `x-ee.type` names (like `crate::ids#Uuid`) to use instead of generated types.
    ///
    /// Needed for types with a serialization OpenAPI cannot express, e.g. an id
    /// that is documented as a plain string.
    #[serde(default)]
    pub use_references: BTreeSet<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new("", default_package_name())
    }
}

impl Options {
    /// Create new options without any honored references
    pub fn new(target_directory: impl Into<String>, target_package_name: impl Into<String>) -> Self {
        Self {
            target_directory: target_directory.into(),
            target_package_name: target_package_name.into(),
            use_references: BTreeSet::new(),
        }
    }

    /// Add an honored `x-ee.type` name
    pub fn with_reference(mut self, name: impl Into<String>) -> Self {
        self.use_references.insert(name.into());
        self
    }

    /// Check the options before they are used for a run
    pub fn validate(&self) -> crate::Result<()> {
        if !is_identifier(&self.target_package_name) {
            return Err(crate::Error::config(format!(
                "target package name '{}' is not a valid module name",
                self.target_package_name
            )));
        }
        Ok(())
    }

    /// Load options from a file (TOML when the extension is `.toml`, YAML otherwise)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let options = if is_toml(path) {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(options)
    }

    /// Save options to a file, using the same format rules as [`Options::from_file`]
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        fs::write(path, content).await?;
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

fn default_package_name() -> String {
    "client".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_options_roundtrip() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("clientgen.yaml");

        let options = Options::new("src/api", "api").with_reference("crate::ids#Uuid");
        options.save(&file_path).await?;

        let loaded = Options::from_file(&file_path).await?;
        assert_eq!(loaded, options);
        assert!(loaded.use_references.contains("crate::ids#Uuid"));

        Ok(())
    }

    #[tokio::test]
    async fn test_options_toml_roundtrip() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("clientgen.toml");

        let options = Options::new("gen", "blub");
        options.save(&file_path).await?;

        let loaded = Options::from_file(&file_path).await?;
        assert_eq!(loaded, options);

        Ok(())
    }

    #[tokio::test]
    async fn test_options_defaults() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("partial.yaml");
        fs::write(&file_path, "use_references: [\"a#B\"]\n").await?;

        let loaded = Options::from_file(&file_path).await?;
        assert_eq!(loaded.target_directory, "");
        assert_eq!(loaded.target_package_name, "client");
        assert_eq!(loaded.use_references.len(), 1);

        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(Options::default().validate().is_ok());
        assert!(Options::new("", "my-client").validate().is_err());
        assert!(Options::new("", "").validate().is_err());
    }
}
