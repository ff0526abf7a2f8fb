//! Structural scanner: build descriptor + categorized source unit inventory

pub mod categorize;
pub mod descriptor;
mod error;
pub mod extractor;
pub mod gradle;
pub mod infrastructure;
pub mod maven;
mod types;

pub use categorize::{categorize, matching_categories};
pub use descriptor::{BuildDescriptor, ParentRef};
pub use error::ScanError;
pub use extractor::{JavaExtractor, StructuralExtractor};
pub use types::{
    AmbiguousUnit, BuildTool, DatabaseKind, Dependency, DependencyScope, FrameworkInfo,
    MessageBroker, ProjectDescriptor, SourceUnit, UnitCategory,
};

use ignore::WalkBuilder;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_LANGUAGE_VERSION: &str = "17";
const SPRING_BOOT_GROUP: &str = "org.springframework.boot";
const ROOT_MODULE: &str = ".";

const EXCLUDED_DIRS: &[&str] = &[
    "target",
    "build",
    "out",
    ".git",
    ".gradle",
    ".idea",
    "node_modules",
];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub include_tests: bool,
    pub max_files: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_tests: false,
            max_files: 20_000,
        }
    }
}

pub struct Scanner {
    extractors: Vec<Box<dyn StructuralExtractor>>,
    options: ScanOptions,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(JavaExtractor::new())],
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_include_tests(mut self, include_tests: bool) -> Self {
        self.options.include_tests = include_tests;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn StructuralExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn scan(&self, source: &Path) -> Result<ProjectDescriptor, ScanError> {
        let start = Instant::now();

        if !source.exists() {
            return Err(ScanError::NotFound(source.to_path_buf()));
        }
        if !source.is_dir() {
            return Err(ScanError::NotADirectory(source.to_path_buf()));
        }

        info!(source = %source.display(), include_tests = self.options.include_tests, "Scanning project");

        let root = descriptor::read_descriptor(source)?;
        let dependencies = self.merge_module_dependencies(source, &root);

        let mut module_dirs = vec![(ROOT_MODULE.to_string(), source.to_path_buf())];
        module_dirs.extend(
            root.modules
                .iter()
                .map(|m| (m.clone(), source.join(m))),
        );

        let mut extracted = Vec::new();
        for (module, dir) in &module_dirs {
            self.collect_units(source, module, dir, &mut extracted);
        }
        extracted.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let base_package = base_package(&extracted)
            .or_else(|| root.effective_group_id().map(str::to_string))
            .unwrap_or_default();

        let mut units: BTreeMap<UnitCategory, Vec<SourceUnit>> = BTreeMap::new();
        let mut ambiguous_units = Vec::new();
        let mut uncategorized = 0usize;

        for unit in extracted {
            let matches = matching_categories(&unit);
            let Some((&chosen, others)) = matches.split_first() else {
                uncategorized += 1;
                debug!(unit = %unit.name, "No category matched, unit is not migrated");
                continue;
            };
            if !others.is_empty() {
                debug!(unit = %unit.name, chosen = %chosen, also = ?others, "Unit matched several categories");
                ambiguous_units.push(AmbiguousUnit {
                    name: unit.qualified_name(),
                    chosen,
                    also_matched: others.to_vec(),
                });
            }
            units.entry(chosen).or_default().push(unit);
        }

        let infra = infrastructure::detect(&dependencies);
        let framework = detect_framework(&root, &dependencies);

        let name = root
            .name
            .clone()
            .or_else(|| root.artifact_id.clone())
            .or_else(|| {
                source
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| "project".to_string());

        let descriptor = ProjectDescriptor {
            name,
            build_tool: root.tool,
            framework,
            language_version: root
                .language_version
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE_VERSION.to_string()),
            base_package,
            group_id: root.effective_group_id().unwrap_or_default().to_string(),
            artifact_id: root.artifact_id.clone().unwrap_or_default(),
            is_multi_module: !root.modules.is_empty(),
            modules: root.modules.clone(),
            dependencies,
            units,
            ambiguous_units,
            uses_document_store: infra.uses_document_store,
            message_broker: infra.message_broker,
            uses_cache: infra.uses_cache,
            primary_database: infra.primary_database,
        };

        info!(
            project = %descriptor.name,
            units = descriptor.total_units(),
            uncategorized,
            dependencies = descriptor.dependencies.len(),
            scan_time_ms = start.elapsed().as_millis() as u64,
            "Scan completed"
        );

        Ok(descriptor)
    }

    /// Root dependencies followed by each module's, skipping exact group+artifact duplicates
    fn merge_module_dependencies(&self, source: &Path, root: &BuildDescriptor) -> Vec<Dependency> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut push_all = |deps: &[Dependency]| {
            for dep in deps {
                if seen.insert(dep.key()) {
                    merged.push(dep.clone());
                }
            }
        };

        push_all(&root.dependencies);

        for module in &root.modules {
            let dir = source.join(module);
            if !descriptor::has_descriptor(&dir) {
                warn!(module = %module, "Module has no build descriptor");
                continue;
            }
            match descriptor::read_descriptor(&dir) {
                Ok(child) => push_all(&child.dependencies),
                Err(e) => warn!(module = %module, error = %e, "Failed to parse module descriptor"),
            }
        }

        merged
    }

    fn source_roots(&self, module_dir: &Path) -> Vec<PathBuf> {
        let mut roots = vec![module_dir.join("src/main/java")];
        if self.options.include_tests {
            roots.push(module_dir.join("src/test/java"));
        }
        roots.into_iter().filter(|p| p.is_dir()).collect()
    }

    fn collect_units(&self, source: &Path, module: &str, module_dir: &Path, out: &mut Vec<SourceUnit>) {
        let include_tests = self.options.include_tests;

        for root in self.source_roots(module_dir) {
            let walker = WalkBuilder::new(&root)
                .hidden(false)
                .git_ignore(true)
                .filter_entry(move |entry| {
                    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                    if !is_dir || entry.depth() == 0 {
                        return true;
                    }
                    let name = entry.file_name().to_string_lossy();
                    !(EXCLUDED_DIRS.contains(&name.as_ref()) || (!include_tests && name == "test"))
                })
                .build();

            for result in walker {
                let entry = match result {
                    Ok(e) => e,
                    Err(err) => {
                        warn!(error = %err, "Failed to read directory entry");
                        continue;
                    }
                };
                let path = entry.path();
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                let Some(extractor) = self.extractors.iter().find(|x| x.handles(path)) else {
                    continue;
                };

                if out.len() >= self.options.max_files {
                    warn!(max_files = self.options.max_files, "Reached file limit, stopping scan");
                    return;
                }

                let content = match std::fs::read_to_string(path) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to read source file");
                        continue;
                    }
                };

                let Some(mut unit) = extractor.extract(path, &content) else {
                    debug!(path = %path.display(), extractor = extractor.name(), "No type declaration found");
                    continue;
                };
                unit.relative_path = path
                    .strip_prefix(source)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/");
                unit.module = module.to_string();
                out.push(unit);
            }
        }
    }
}

/// Package of the `@SpringBootApplication` class, else the longest common package prefix
fn base_package(units: &[SourceUnit]) -> Option<String> {
    if let Some(app) = units
        .iter()
        .find(|u| u.has_annotation("SpringBootApplication") && !u.package.is_empty())
    {
        return Some(app.package.clone());
    }

    let mut packages = units.iter().map(|u| u.package.as_str()).filter(|p| !p.is_empty());
    let first: Vec<&str> = packages.next()?.split('.').collect();
    let common = packages.fold(first, |prefix, pkg| {
        prefix
            .iter()
            .zip(pkg.split('.'))
            .take_while(|(a, b)| **a == *b)
            .map(|(a, _)| *a)
            .collect()
    });

    (!common.is_empty()).then(|| common.join("."))
}

fn detect_framework(root: &BuildDescriptor, dependencies: &[Dependency]) -> Option<FrameworkInfo> {
    let parent_version = root
        .parent
        .as_ref()
        .filter(|p| p.group_id.as_deref() == Some(SPRING_BOOT_GROUP))
        .map(|p| p.version.clone());

    let uses_boot = parent_version.is_some()
        || root.framework_version.is_some()
        || dependencies.iter().any(|d| d.group_id == SPRING_BOOT_GROUP);
    if !uses_boot {
        return None;
    }

    let version = parent_version
        .flatten()
        .or_else(|| root.framework_version.clone())
        .or_else(|| {
            dependencies
                .iter()
                .filter(|d| d.group_id == SPRING_BOOT_GROUP)
                .find_map(|d| d.version.clone())
        });

    Some(FrameworkInfo {
        name: "Spring Boot".to_string(),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn unit(package: &str, annotations: &[&str]) -> SourceUnit {
        SourceUnit {
            name: "X".into(),
            package: package.into(),
            path: PathBuf::from("X.java"),
            relative_path: "X.java".into(),
            module: ".".into(),
            content: String::new(),
            supertypes: vec![],
            interfaces: vec![],
            annotations: annotations.iter().map(|s| s.to_string()).collect(),
            imports: vec![],
        }
    }

    #[test]
    fn test_base_package_prefers_application_class() {
        let units = vec![
            unit("com.acme.orders.model", &[]),
            unit("com.acme.orders", &["SpringBootApplication"]),
        ];
        assert_eq!(base_package(&units).as_deref(), Some("com.acme.orders"));
    }

    #[test]
    fn test_base_package_common_prefix() {
        let units = vec![
            unit("com.acme.orders.model", &[]),
            unit("com.acme.orders.service", &[]),
            unit("com.acme.billing", &[]),
        ];
        assert_eq!(base_package(&units).as_deref(), Some("com.acme"));
        assert_eq!(base_package(&[unit("a.b", &[]), unit("c.d", &[])]), None);
        assert_eq!(base_package(&[]), None);
    }

    #[test]
    fn test_scan_missing_path() {
        let err = Scanner::new().scan(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound(_)));
    }

    #[test]
    fn test_scan_skips_build_output_and_tests() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "pom.xml", "<project><groupId>g</groupId><artifactId>app</artifactId></project>");
        write(root, "src/main/java/g/A.java", "package g;\n@Service\nclass A {}\n");
        write(root, "src/main/java/g/build/B.java", "package g.build;\n@Service\nclass B {}\n");
        write(root, "src/test/java/g/ATest.java", "package g;\n@Service\nclass ATest {}\n");
        write(root, "target/classes/C.java", "package g;\n@Service\nclass C {}\n");

        let descriptor = Scanner::new().scan(root).unwrap();
        let services = descriptor.units(UnitCategory::Service);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].relative_path, "src/main/java/g/A.java");
        assert_eq!(services[0].module, ".");

        let with_tests = Scanner::new().with_include_tests(true).scan(root).unwrap();
        assert_eq!(with_tests.units(UnitCategory::Service).len(), 2);
    }

    #[test]
    fn test_framework_from_parent() {
        let root = maven::parse_pom(
            "<project><parent><groupId>org.springframework.boot</groupId><artifactId>spring-boot-starter-parent</artifactId><version>3.2.0</version></parent><artifactId>a</artifactId></project>",
        )
        .unwrap();
        let framework = detect_framework(&root, &[]).unwrap();
        assert_eq!(framework.version.as_deref(), Some("3.2.0"));
        assert!(detect_framework(
            &maven::parse_pom("<project><artifactId>a</artifactId></project>").unwrap(),
            &[]
        )
        .is_none());
    }
}
