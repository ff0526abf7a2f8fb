//! Gradle build script parsing (Groovy and Kotlin DSL)
//!
//! Build scripts are programs, so this is pattern matching over the common
//! declarative forms rather than evaluation.

use super::descriptor::BuildDescriptor;
use super::types::{BuildTool, Dependency, DependencyScope};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];
const SETTINGS_FILES: &[&str] = &["settings.gradle", "settings.gradle.kts"];

pub fn build_file(dir: &Path) -> Option<PathBuf> {
    BUILD_FILES.iter().map(|f| dir.join(f)).find(|p| p.is_file())
}

pub fn settings_file(dir: &Path) -> Option<PathBuf> {
    SETTINGS_FILES.iter().map(|f| dir.join(f)).find(|p| p.is_file())
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid gradle regex"))
}

fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

pub fn parse_gradle(content: &str, settings: Option<&str>) -> BuildDescriptor {
    static GROUP: OnceLock<Regex> = OnceLock::new();
    static VERSION: OnceLock<Regex> = OnceLock::new();
    static ROOT_NAME: OnceLock<Regex> = OnceLock::new();
    static SOURCE_COMPAT: OnceLock<Regex> = OnceLock::new();
    static TOOLCHAIN: OnceLock<Regex> = OnceLock::new();
    static BOOT_PLUGIN: OnceLock<Regex> = OnceLock::new();

    let group_id = capture(
        regex(&GROUP, r#"(?m)^\s*group\s*=\s*['"]([^'"]+)['"]"#),
        content,
    );
    let version = capture(
        regex(&VERSION, r#"(?m)^\s*version\s*=\s*['"]([^'"]+)['"]"#),
        content,
    );

    let language_version = capture(
        regex(
            &SOURCE_COMPAT,
            r#"sourceCompatibility\s*=\s*(?:JavaVersion\.VERSION_)?['"]?(\d+(?:\.\d+)?)"#,
        ),
        content,
    )
    .or_else(|| {
        capture(
            regex(&TOOLCHAIN, r"JavaLanguageVersion\.of\((\d+)\)"),
            content,
        )
    });

    let framework_version = capture(
        regex(
            &BOOT_PLUGIN,
            r#"id\s*\(?\s*['"]org\.springframework\.boot['"]\s*\)?\s*version\s*['"]([^'"]+)['"]"#,
        ),
        content,
    );

    let (name, modules) = match settings {
        Some(settings) => (
            capture(
                regex(&ROOT_NAME, r#"rootProject\.name\s*=\s*['"]([^'"]+)['"]"#),
                settings,
            ),
            parse_includes(settings),
        ),
        None => (None, Vec::new()),
    };

    BuildDescriptor {
        tool: BuildTool::Gradle,
        group_id,
        artifact_id: name.clone(),
        name,
        version,
        parent: None,
        language_version,
        framework_version,
        modules,
        dependencies: parse_dependencies(content),
    }
}

/// `include 'a', ':b:c'` and `include("a")` forms; `:` separators become `/`
fn parse_includes(settings: &str) -> Vec<String> {
    static INCLUDE: OnceLock<Regex> = OnceLock::new();
    static QUOTED: OnceLock<Regex> = OnceLock::new();

    let include = regex(&INCLUDE, r"(?m)^\s*include\s*\(?([^)\n]+)\)?");
    let quoted = regex(&QUOTED, r#"['"]([^'"]+)['"]"#);

    let mut modules = Vec::new();
    for caps in include.captures_iter(settings) {
        for q in quoted.captures_iter(&caps[1]) {
            let module = q[1].trim_start_matches(':').replace(':', "/");
            if !module.is_empty() && !modules.contains(&module) {
                modules.push(module);
            }
        }
    }
    modules
}

fn scope_for(configuration: &str) -> DependencyScope {
    match configuration {
        c if c.starts_with("test") => DependencyScope::Test,
        "compileOnly" | "annotationProcessor" => DependencyScope::Provided,
        "runtimeOnly" | "runtime" => DependencyScope::Runtime,
        _ => DependencyScope::Compile,
    }
}

fn parse_dependencies(content: &str) -> Vec<Dependency> {
    static DEP: OnceLock<Regex> = OnceLock::new();
    let re = regex(
        &DEP,
        r#"\b(implementation|api|compileOnly|runtimeOnly|annotationProcessor|compile|runtime|testImplementation|testRuntimeOnly|testCompileOnly|testCompile)\s*\(?\s*['"]([^:'"\s]+):([^:'"\s]+)(?::([^'"\s]+))?['"]"#,
    );

    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();
    for caps in re.captures_iter(content) {
        let dependency = Dependency::new(&caps[2], &caps[3]).with_scope(scope_for(&caps[1]));
        if !seen.insert(dependency.key()) {
            continue;
        }
        dependencies.push(match caps.get(4) {
            Some(version) => dependency.with_version(version.as_str()),
            None => dependency,
        });
    }
    dependencies
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILD: &str = r#"
plugins {
    id 'java'
    id 'org.springframework.boot' version '3.1.5'
}

group = 'com.acme'
version = '0.0.1-SNAPSHOT'
sourceCompatibility = '17'

dependencies {
    implementation 'org.springframework.boot:spring-boot-starter-data-jpa'
    implementation("org.apache.commons:commons-lang3:3.13.0")
    compileOnly 'org.projectlombok:lombok'
    runtimeOnly 'org.postgresql:postgresql'
    testImplementation 'org.springframework.boot:spring-boot-starter-test'
    implementation 'org.apache.commons:commons-lang3:3.12.0'
}
"#;

    #[test]
    fn test_parse_build_script() {
        let descriptor = parse_gradle(BUILD, Some("rootProject.name = 'orders'\n"));
        assert_eq!(descriptor.tool, BuildTool::Gradle);
        assert_eq!(descriptor.group_id.as_deref(), Some("com.acme"));
        assert_eq!(descriptor.name.as_deref(), Some("orders"));
        assert_eq!(descriptor.language_version.as_deref(), Some("17"));
        assert_eq!(descriptor.framework_version.as_deref(), Some("3.1.5"));
    }

    #[test]
    fn test_dependencies_with_scopes_and_dedup() {
        let deps = parse_dependencies(BUILD);
        assert_eq!(deps.len(), 5);
        let lang = deps.iter().find(|d| d.artifact_id == "commons-lang3").unwrap();
        assert_eq!(lang.version.as_deref(), Some("3.13.0"));
        let lombok = deps.iter().find(|d| d.artifact_id == "lombok").unwrap();
        assert_eq!(lombok.scope, DependencyScope::Provided);
        let pg = deps.iter().find(|d| d.artifact_id == "postgresql").unwrap();
        assert_eq!(pg.scope, DependencyScope::Runtime);
        let test = deps
            .iter()
            .find(|d| d.artifact_id == "spring-boot-starter-test")
            .unwrap();
        assert_eq!(test.scope, DependencyScope::Test);
    }

    #[test]
    fn test_parse_includes_both_dsls() {
        let groovy = "rootProject.name = 'shop'\ninclude 'api', ':core'\ninclude ':libs:util'\n";
        assert_eq!(
            parse_includes(groovy),
            vec!["api".to_string(), "core".to_string(), "libs/util".to_string()]
        );

        let kotlin = "include(\"web\")\ninclude(\"web\")\n";
        assert_eq!(parse_includes(kotlin), vec!["web".to_string()]);
    }

    #[test]
    fn test_toolchain_version() {
        let descriptor = parse_gradle(
            "java { toolchain { languageVersion = JavaLanguageVersion.of(21) } }",
            None,
        );
        assert_eq!(descriptor.language_version.as_deref(), Some("21"));
        assert!(descriptor.modules.is_empty());
    }
}
