use crate::error::{Result, SplitError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a split run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Prefix for generated file names
    pub output_base: String,

    /// Casing policy applied to the derived part of each file name
    pub casing: Casing,

    /// Name prefix identifying test entry points
    pub test_prefix: String,

    /// How the enclosing package is loaded
    pub loader: LoaderKind,

    /// Go executable used by the `go list` loader
    pub go_binary: PathBuf,

    /// Final formatting pass over every written file
    pub formatter: FormatterKind,

    /// gofmt executable used by the `gofmt` formatter
    pub gofmt_binary: PathBuf,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_base: String::new(),
            casing: Casing::Snake,
            test_prefix: "Test".to_string(),
            loader: LoaderKind::Auto,
            go_binary: PathBuf::from("go"),
            formatter: FormatterKind::Auto,
            gofmt_binary: PathBuf::from("gofmt"),
        }
    }
}

impl SplitConfig {
    /// Read configuration from a TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
        let config: Self = toml::from_str(&raw).map_err(|e| {
            SplitError::invalid_config(format!("{}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.test_prefix.is_empty() {
            return Err(SplitError::invalid_config("test_prefix must not be empty"));
        }

        if self.output_base.contains('/') || self.output_base.contains('\\') {
            return Err(SplitError::invalid_config(format!(
                "output_base ({:?}) must not contain a path separator",
                self.output_base
            )));
        }

        if self.go_binary.as_os_str().is_empty() {
            return Err(SplitError::invalid_config("go_binary must not be empty"));
        }

        if self.gofmt_binary.as_os_str().is_empty() {
            return Err(SplitError::invalid_config("gofmt_binary must not be empty"));
        }

        Ok(())
    }
}

/// Casing policy for derived file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    /// Keep the test name as written (minus the prefix)
    Verbatim,

    /// Lowercase words joined by underscores
    Snake,
}

impl Casing {
    /// Map the `--snake-case` flag onto a policy
    pub fn from_snake_flag(snake_case: bool) -> Self {
        if snake_case {
            Self::Snake
        } else {
            Self::Verbatim
        }
    }
}

impl Default for Casing {
    fn default() -> Self {
        Self::Snake
    }
}

/// Strategy for loading the package that owns the target file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoaderKind {
    /// `go list`, falling back to a directory scan when `go` is not installed
    Auto,

    /// Always ask the Go toolchain
    GoList,

    /// Scan directories without the Go toolchain
    #[serde(alias = "directory")]
    Dir,
}

impl Default for LoaderKind {
    fn default() -> Self {
        Self::Auto
    }
}

/// How generated files get their final layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatterKind {
    /// gofmt when installed, the built-in layout otherwise
    #[default]
    Auto,

    /// Always pipe through gofmt
    Gofmt,

    /// Built-in layout only
    Builtin,
}
