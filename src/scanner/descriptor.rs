//! Build descriptor discovery shared by the Maven and Gradle parsers

use super::error::ScanError;
use super::types::{BuildTool, Dependency};
use super::{gradle, maven};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

/// What one build file declares, before merging across modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    pub tool: BuildTool,
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub parent: Option<ParentRef>,
    pub language_version: Option<String>,
    /// Framework version declared by the build itself (e.g. a Gradle plugin)
    pub framework_version: Option<String>,
    pub modules: Vec<String>,
    pub dependencies: Vec<Dependency>,
}

impl BuildDescriptor {
    /// Group id, falling back to the parent's
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.group_id.as_deref()))
    }
}

/// Returns true if `dir` contains a build descriptor this scanner understands
pub fn has_descriptor(dir: &Path) -> bool {
    dir.join(maven::POM_FILE).is_file() || gradle::build_file(dir).is_some()
}

/// Parses the build descriptor in `dir`. Maven wins when both are present.
pub fn read_descriptor(dir: &Path) -> Result<BuildDescriptor, ScanError> {
    let pom = dir.join(maven::POM_FILE);
    if pom.is_file() {
        debug!(path = %pom.display(), "Parsing Maven descriptor");
        let content = fs::read_to_string(&pom).map_err(|e| ScanError::io(&pom, e))?;
        return maven::parse_pom(&content).map_err(|message| ScanError::Descriptor {
            path: pom.clone(),
            message,
        });
    }

    if let Some(build_file) = gradle::build_file(dir) {
        debug!(path = %build_file.display(), "Parsing Gradle descriptor");
        let content = fs::read_to_string(&build_file).map_err(|e| ScanError::io(&build_file, e))?;
        let settings = gradle::settings_file(dir)
            .map(|path| fs::read_to_string(&path).map_err(|e| ScanError::io(&path, e)))
            .transpose()?;
        return Ok(gradle::parse_gradle(&content, settings.as_deref()));
    }

    Err(ScanError::NotFound(dir.to_path_buf()))
}
