//! Shared helpers for integration tests

#![allow(dead_code)]

use liftbox::llm::MockResponse;
use liftbox::{ProgressEvent, ProgressHandler};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const SPRING_BOOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.springframework.boot</groupId>
    <artifactId>spring-boot-starter-parent</artifactId>
    <version>3.2.0</version>
  </parent>
  <groupId>com.acme</groupId>
  <artifactId>shop</artifactId>
  <version>1.0.0</version>
  <name>shop</name>
  <properties>
    <java.version>21</java.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-data-jpa</artifactId>
    </dependency>
    <dependency>
      <groupId>org.postgresql</groupId>
      <artifactId>postgresql</artifactId>
      <scope>runtime</scope>
    </dependency>
  </dependencies>
</project>
"#;

/// Builds a throwaway Spring Boot project on disk
pub struct JavaProject {
    dir: TempDir,
}

impl JavaProject {
    /// Empty directory, no build descriptor
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Maven project with the default Spring Boot pom
    pub fn maven() -> Self {
        Self::empty().file("pom.xml", SPRING_BOOT_POM)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Sibling directory for generated output; not created
    pub fn output(&self) -> PathBuf {
        self.dir.path().join("generated")
    }

    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("file has a parent"))
            .expect("Failed to create parent directory");
        fs::write(&path, content).expect("Failed to write fixture file");
        self
    }

    pub fn java(self, package_dir: &str, name: &str, body: &str) -> Self {
        let package = package_dir.replace('/', ".");
        let content = format!("package {};\n\n{}\n", package, body);
        self.file(
            &format!("src/main/java/{}/{}.java", package_dir, name),
            &content,
        )
    }

    pub fn entity(self, name: &str) -> Self {
        let body = format!(
            "import jakarta.persistence.Entity;\n\n@Entity\npublic class {} {{\n    private Long id;\n}}",
            name
        );
        self.java("com/acme/shop/domain", name, &body)
    }

    pub fn repository(self, name: &str, entity: &str) -> Self {
        let body = format!(
            "public interface {} extends JpaRepository<{}, Long> {{\n}}",
            name, entity
        );
        self.java("com/acme/shop/repo", name, &body)
    }

    pub fn service(self, name: &str) -> Self {
        let body = format!("@Service\npublic class {} {{\n}}", name);
        self.java("com/acme/shop/service", name, &body)
    }

    pub fn controller(self, name: &str) -> Self {
        let body = format!(
            "@RestController\n@RequestMapping(\"/api\")\npublic class {} {{\n}}",
            name
        );
        self.java("com/acme/shop/web", name, &body)
    }

    pub fn job(self, name: &str) -> Self {
        let body = format!(
            "@Component\npublic class {} {{\n    @Scheduled(fixedRate = 1000)\n    public void run() {{}}\n}}",
            name
        );
        self.java("com/acme/shop/jobs", name, &body)
    }

    pub fn configuration(self, name: &str) -> Self {
        let body = format!("@Configuration\npublic class {} {{\n}}", name);
        self.java("com/acme/shop/config", name, &body)
    }
}

/// Provider answer for a converted unit with one code file
pub fn converted(name: &str) -> MockResponse {
    MockResponse::text(format!(
        r#"Here is the Go code:
{{"name": "{}", "code": "package app\n\ntype {} struct{{}}", "notes": [], "requires_review": false}}"#,
        name, name
    ))
}

/// Provider answer for an entity the provider declines to convert
pub fn dropped(reason: &str) -> MockResponse {
    MockResponse::text(format!(
        r#"{{"skip": true, "skip_reason": "{}"}}"#,
        reason
    ))
}

/// Records every event for later assertions
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
