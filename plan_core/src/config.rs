use crate::types::ExerciseSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rows a freshly built grid is padded up to
pub const DEFAULT_MIN_ROWS: usize = 20;

/// Upper bound on sets generated from the Sets column
pub const DEFAULT_MAX_SETS: usize = 20;

/// Complete editor configuration loaded from a config directory
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub catalog: Catalog,
    pub grid: GridSettings,
}

impl Config {
    /// Load configuration from a directory
    /// Expected structure:
    ///   config/
    ///     grid.toml      - optional grid settings
    ///     catalog/       - .toml files containing [[templates]] arrays
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let grid = Self::load_grid_settings(&dir.join("grid.toml"))?;
        let catalog = Self::load_catalog_dir(&dir.join("catalog"))?;

        Ok(Config { catalog, grid })
    }

    fn load_grid_settings(path: &Path) -> Result<GridSettings, ConfigError> {
        if !path.exists() {
            return Ok(GridSettings::default());
        }

        let content = Self::read_file_with_context(path)?;
        Self::parse_toml_with_context(&content, path)
    }

    /// Load all template files from a directory
    /// Each file can contain one or more [[templates]] entries
    fn load_catalog_dir(dir: &Path) -> Result<Catalog, ConfigError> {
        let mut catalog = Catalog::default();

        if !dir.exists() {
            return Ok(catalog);
        }

        let mut paths = Vec::new();
        for entry in Self::read_dir_with_context(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let content = Self::read_file_with_context(&path)?;
            let wrapper: TemplatesWrapper = Self::parse_toml_with_context(&content, &path)?;
            for template in wrapper.templates {
                catalog.insert(template);
            }
        }

        Ok(catalog)
    }

    // Helper functions for error context

    fn read_dir_with_context(dir: &Path) -> Result<std::fs::ReadDir, ConfigError> {
        std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(dir.to_path_buf()),
        })
    }

    fn read_file_with_context(path: &Path) -> Result<String, ConfigError> {
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(path.to_path_buf()),
        })
    }

    fn parse_toml_with_context<T: serde::de::DeserializeOwned>(
        content: &str,
        path: &Path,
    ) -> Result<T, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            error: e,
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error with optional file path
    #[error("IO error{}: {error}", display_path(.path.as_deref()))]
    Io {
        #[source]
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    /// TOML parse error with file path and location details
    #[error("Parse error in '{}': {error}", .path.display())]
    Parse {
        #[source]
        error: toml::de::Error,
        path: PathBuf,
    },
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| format!(" in '{}'", p.display()))
        .unwrap_or_default()
}

impl ConfigError {
    /// Get the file path associated with this error, if any
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => path.as_deref(),
            ConfigError::Parse { path, .. } => Some(path),
        }
    }

    /// Get a user-friendly description of where the error occurred
    pub fn location_description(&self) -> String {
        match self {
            ConfigError::Io { path: Some(p), .. } => format!("File: {}", p.display()),
            ConfigError::Io { path: None, .. } => "Unknown location".to_string(),
            ConfigError::Parse { error, path } => {
                let mut desc = format!("File: {}", path.display());
                if let Some(span) = error.span() {
                    desc.push_str(&format!("\nPosition: bytes {}..{}", span.start, span.end));
                }
                desc
            }
        }
    }

    /// Get the underlying error message without location info
    pub fn error_message(&self) -> String {
        match self {
            ConfigError::Io { error, .. } => error.to_string(),
            ConfigError::Parse { error, .. } => error.message().to_string(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io {
            error: e,
            path: None,
        }
    }
}

// Wrapper type for TOML parsing

#[derive(Deserialize)]
struct TemplatesWrapper {
    #[serde(default)]
    templates: Vec<ExerciseTemplate>,
}

/// Grid layout settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Minimum number of rows shown, padded with empty rows
    pub min_rows: usize,
    /// Largest set count the Sets column will generate
    pub max_sets: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        GridSettings {
            min_rows: DEFAULT_MIN_ROWS,
            max_sets: DEFAULT_MAX_SETS,
        }
    }
}

/// A pickable exercise with its default sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub default_sets: Vec<ExerciseSet>,
}

/// Read-only catalog of exercise templates, in load order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: Vec<ExerciseTemplate>,
}

impl Catalog {
    pub fn new(templates: Vec<ExerciseTemplate>) -> Self {
        let mut catalog = Catalog::default();
        for template in templates {
            catalog.insert(template);
        }
        catalog
    }

    /// Add a template; a template with the same id is replaced in place
    pub fn insert(&mut self, template: ExerciseTemplate) {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn templates(&self) -> &[ExerciseTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
