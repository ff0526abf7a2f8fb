//! Dependency classification over scanned projects

mod support;

use liftbox::dependencies::{Complexity, DependencyClassifier};
use liftbox::scanner::Dependency;
use liftbox::Scanner;
use support::JavaProject;
use yare::parameterized;

const LEGACY_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.acme</groupId>
    <artifactId>legacy</artifactId>
    <version>1.0.0</version>
    <dependencies>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-web</artifactId>
        </dependency>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-security</artifactId>
        </dependency>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-data-redis</artifactId>
        </dependency>
        <dependency>
            <groupId>com.ibm.websphere</groupId>
            <artifactId>was-api</artifactId>
            <version>9.0</version>
        </dependency>
        <dependency>
            <groupId>org.projectlombok</groupId>
            <artifactId>lombok</artifactId>
            <scope>provided</scope>
        </dependency>
    </dependencies>
</project>
"#;

fn classify(key: &str) -> liftbox::DependencyReport {
    let (group, artifact) = key.split_once(':').unwrap();
    DependencyClassifier::with_defaults().analyze(&[Dependency::new(group, artifact)])
}

#[parameterized(
    web = { "org.springframework.boot:spring-boot-starter-web", None },
    jpa = { "org.springframework.boot:spring-boot-starter-data-jpa", Some(Complexity::Medium) },
    redis = { "org.springframework.boot:spring-boot-starter-data-redis", Some(Complexity::Low) },
    security = { "org.springframework.boot:spring-boot-starter-security", Some(Complexity::High) },
    kafka = { "org.springframework.kafka:spring-kafka", Some(Complexity::Medium) },
    jackson = { "com.fasterxml.jackson.core:jackson-databind", Some(Complexity::Low) },
    internal = { "com.acme:billing-client", None },
)]
fn test_replacement_complexity(key: &str, expected: Option<Complexity>) {
    let report = classify(key);
    match expected {
        Some(complexity) => {
            assert_eq!(report.replaceable.len(), 1, "{} should be replaceable", key);
            assert_eq!(report.replaceable[0].complexity, complexity);
            assert!(!report.replaceable[0].alternative.is_empty());
        }
        None => {
            assert_eq!(report.compatible.len(), 1, "{} should be compatible", key);
            assert!(report.replaceable.is_empty());
        }
    }
    assert!(report.unsupported.is_empty());
}

#[test]
fn test_scanned_project_classification() {
    let project = JavaProject::empty().file("pom.xml", LEGACY_POM);
    let descriptor = Scanner::new().scan(project.path()).unwrap();

    let report = DependencyClassifier::with_defaults().analyze(&descriptor.dependencies);

    assert_eq!(report.total(), 5);
    assert_eq!(report.compatible.len(), 1);
    assert_eq!(report.replaceable.len(), 3);
    assert_eq!(report.unsupported, vec!["com.ibm.websphere:was-api".to_string()]);

    let blockers: Vec<_> = report.blockers().iter().map(|r| r.key()).collect();
    assert_eq!(
        blockers,
        vec!["org.springframework.boot:spring-boot-starter-security".to_string()]
    );
}

#[test]
fn test_accepting_replacement_clears_blocker() {
    let project = JavaProject::empty().file("pom.xml", LEGACY_POM);
    let descriptor = Scanner::new().scan(project.path()).unwrap();

    let report = DependencyClassifier::with_defaults().analyze_with_accepted(
        &descriptor.dependencies,
        &[
            "org.springframework.boot:spring-boot-starter-security".to_string(),
            "org.example:not-declared".to_string(),
        ],
    );

    assert!(!report.has_blockers());
    assert_eq!(report.accepted.len(), 1);
    // unsupported entries are reported but never block
    assert_eq!(report.unsupported.len(), 1);
}

#[test]
fn test_render_lists_every_section() {
    let project = JavaProject::empty().file("pom.xml", LEGACY_POM);
    let descriptor = Scanner::new().scan(project.path()).unwrap();
    let report = DependencyClassifier::with_defaults().analyze(&descriptor.dependencies);

    let rendered = report.render();
    assert!(rendered.starts_with(
        "Dependencies: 1 compatible, 3 replaceable, 1 unsupported, 1 blocker(s)"
    ));
    assert!(rendered.contains("| Dependency | Alternative | Complexity | Impact |"));
    assert!(rendered.contains("| org.projectlombok:lombok |"));
    assert!(rendered.contains("Unsupported:\n- com.ibm.websphere:was-api"));
    assert!(rendered.contains("Blockers (accept with --accept <group:artifact>):"));
    assert!(rendered.contains("- org.springframework.boot:spring-boot-starter-security: "));
}

#[test]
fn test_classification_is_stable_across_runs() {
    let project = JavaProject::empty().file("pom.xml", LEGACY_POM);
    let descriptor = Scanner::new().scan(project.path()).unwrap();
    let classifier = DependencyClassifier::with_defaults();

    let first = classifier.analyze(&descriptor.dependencies);
    let second = classifier.analyze(&descriptor.dependencies);
    assert_eq!(first, second);
    assert_eq!(first.render(), second.render());
}
