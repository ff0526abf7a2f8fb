//! Built-in dependency knowledge: replacements, compatible libraries and the deny-list

crate::define_id_enum! {
    /// Effort needed to move off a replaced dependency
    Complexity {
        Low => "low" : "Low",
        Medium => "medium" : "Medium",
        High => "high" : "High",
    }
}

/// A documented replacement for a source-ecosystem dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    /// `group:artifact`, or a fragment of one for substring lookup
    pub key: String,
    pub alternative: String,
    pub impact: String,
    pub complexity: Complexity,
}

impl KnowledgeEntry {
    pub fn new(
        key: impl Into<String>,
        alternative: impl Into<String>,
        impact: impl Into<String>,
        complexity: Complexity,
    ) -> Self {
        Self {
            key: key.into(),
            alternative: alternative.into(),
            impact: impact.into(),
            complexity,
        }
    }
}

const REPLACEMENTS: &[(&str, &str, &str, Complexity)] = &[
    (
        "org.springframework.boot:spring-boot-starter-data-jpa",
        "database/sql with sqlx or GORM",
        "JPA entity lifecycle, lazy loading and derived queries become explicit SQL",
        Complexity::Medium,
    ),
    (
        "org.hibernate:hibernate-core",
        "GORM",
        "Hibernate session semantics and HQL have no direct equivalent",
        Complexity::Medium,
    ),
    (
        "org.springframework.boot:spring-boot-starter-data-mongodb",
        "mongo-go-driver",
        "Repository interfaces must be rewritten against the driver API",
        Complexity::Medium,
    ),
    (
        "org.springframework.boot:spring-boot-starter-data-redis",
        "go-redis",
        "RedisTemplate operations map to client calls; cache annotations are removed",
        Complexity::Low,
    ),
    (
        "org.springframework.boot:spring-boot-starter-security",
        "custom middleware with golang-jwt",
        "Filter chains, method security and session handling are reimplemented by hand",
        Complexity::High,
    ),
    (
        "org.springframework.boot:spring-boot-starter-oauth2-resource-server",
        "golang-jwt with JWKS validation",
        "Token validation and scope checks move into middleware",
        Complexity::High,
    ),
    (
        "org.springframework.kafka:spring-kafka",
        "segmentio/kafka-go",
        "Listener containers become explicit consumer loops",
        Complexity::Medium,
    ),
    (
        "org.springframework.boot:spring-boot-starter-amqp",
        "rabbitmq/amqp091-go",
        "Listener containers and retry policies become explicit consumers",
        Complexity::Medium,
    ),
    (
        "org.springframework.batch:spring-batch-core",
        "hand-written batch jobs",
        "Job repository, restartability and chunk processing must be rebuilt",
        Complexity::High,
    ),
    (
        "org.quartz-scheduler:quartz",
        "robfig/cron",
        "Clustered scheduling and persistent job stores are not provided",
        Complexity::Medium,
    ),
    (
        "org.flywaydb:flyway-core",
        "golang-migrate",
        "Existing migration scripts are reusable; Java-based migrations are not",
        Complexity::Low,
    ),
    (
        "org.liquibase:liquibase-core",
        "golang-migrate",
        "Changelogs must be converted to plain SQL migrations",
        Complexity::Medium,
    ),
    (
        "org.mapstruct:mapstruct",
        "hand-written mapping functions",
        "Generated mappers are replaced by explicit conversion code",
        Complexity::Low,
    ),
    (
        "org.projectlombok:lombok",
        "plain structs",
        "Generated accessors and builders disappear; no runtime impact",
        Complexity::Low,
    ),
    (
        "org.springframework.cloud:spring-cloud-starter-openfeign",
        "net/http clients",
        "Declarative HTTP clients become explicit request code",
        Complexity::Medium,
    ),
    (
        "org.springframework.cloud:spring-cloud-starter-netflix-eureka-client",
        "platform service discovery",
        "Client-side discovery is replaced by DNS or the orchestrator",
        Complexity::High,
    ),
    (
        "io.github.resilience4j",
        "sony/gobreaker",
        "Annotation-driven circuit breakers become explicit wrappers",
        Complexity::Medium,
    ),
    (
        "com.fasterxml.jackson",
        "encoding/json",
        "Custom serializers and mixins must be ported to struct tags or MarshalJSON",
        Complexity::Low,
    ),
    (
        "spring-boot-starter-validation",
        "go-playground/validator",
        "Bean validation annotations become struct tags",
        Complexity::Low,
    ),
    (
        "springdoc-openapi",
        "swaggo/swag",
        "OpenAPI generation moves to comment annotations",
        Complexity::Low,
    ),
];

/// Libraries that have a direct counterpart and need no documented plan
const COMPATIBLE: &[&str] = &[
    "org.springframework.boot:spring-boot-starter",
    "org.springframework.boot:spring-boot-starter-web",
    "org.springframework.boot:spring-boot-starter-actuator",
    "org.springframework.boot:spring-boot-starter-cache",
    "org.postgresql:postgresql",
    "com.mysql:mysql-connector-j",
    "mysql:mysql-connector-java",
    "com.h2database:h2",
];

const COMPATIBLE_FRAGMENTS: &[&str] = &[
    "spring-boot-starter-test",
    "spring-boot-devtools",
    "spring-boot-configuration-processor",
    "junit",
    "mockito",
    "assertj",
    "hamcrest",
    "testcontainers",
    "slf4j",
    "logback",
    "log4j",
    "micrometer",
    "opentelemetry",
    "commons-lang",
    "guava",
];

/// Legacy, proprietary or framework-bound libraries with no migration path
const DENY_FRAGMENTS: &[&str] = &[
    "com.ibm.websphere",
    "weblogic",
    "struts",
    "ejb",
    "com.oracle.coherence",
    "jboss.seam",
    "org.apache.axis",
    "javax.faces",
    "jakarta.faces",
    "org.primefaces",
    "com.vaadin",
    "gwt",
];

pub fn default_knowledge_base() -> Vec<KnowledgeEntry> {
    REPLACEMENTS
        .iter()
        .map(|(key, alternative, impact, complexity)| {
            KnowledgeEntry::new(*key, *alternative, *impact, *complexity)
        })
        .collect()
}

pub fn default_compatible() -> Vec<String> {
    COMPATIBLE.iter().map(|s| s.to_string()).collect()
}

pub fn default_compatible_fragments() -> Vec<String> {
    COMPATIBLE_FRAGMENTS.iter().map(|s| s.to_string()).collect()
}

pub fn default_deny_fragments() -> Vec<String> {
    DENY_FRAGMENTS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_knowledge_keys_unique() {
        let kb = default_knowledge_base();
        let keys: HashSet<_> = kb.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys.len(), kb.len());
    }

    #[test]
    fn test_compatible_and_deny_disjoint() {
        for denied in DENY_FRAGMENTS {
            assert!(COMPATIBLE.iter().all(|c| !c.contains(denied)), "{}", denied);
        }
    }

    #[test]
    fn test_complexity_order() {
        assert!(Complexity::Low < Complexity::High);
        assert_eq!(Complexity::from_name("HIGH"), Some(Complexity::High));
    }
}
