//! Directory layout of the generated module

use crate::scanner::UnitCategory;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maps unit categories onto directories under the output root
#[derive(Debug, Clone)]
pub struct TargetLayout {
    root: PathBuf,
    module: String,
}

impl TargetLayout {
    pub fn new(root: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            module: module.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn relative_dir(category: UnitCategory) -> &'static str {
        match category {
            UnitCategory::Entity => "internal/domain",
            UnitCategory::Repository => "internal/repository",
            UnitCategory::Service => "internal/service",
            UnitCategory::Controller => "internal/handler",
            UnitCategory::Job => "internal/jobs",
            UnitCategory::Listener => "internal/events",
            UnitCategory::Configuration => "internal/config",
        }
    }

    pub fn category_dir(&self, category: UnitCategory) -> PathBuf {
        self.root.join(Self::relative_dir(category))
    }

    pub fn entrypoint_dir(&self) -> PathBuf {
        self.root.join("cmd").join(&self.module)
    }

    /// Creates the root, the entrypoint directory and the directory for
    /// `category`. Existing directories are left alone.
    pub fn ensure_skeleton(&self, category: UnitCategory) -> io::Result<PathBuf> {
        fs::create_dir_all(self.entrypoint_dir())?;
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// `path` relative to the output root, with forward slashes
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
