//! Scan result types: source units, dependencies and the project descriptor

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

crate::define_id_enum! {
    /// Category a source unit is converted under
    UnitCategory {
        Entity => "entity" : "Entity" | "entities",
        Repository => "repository" : "Repository" | "repositories",
        Service => "service" : "Service" | "services",
        Controller => "controller" : "Controller" | "controllers",
        Job => "job" : "Job" | "jobs",
        Listener => "listener" : "Listener" | "listeners" | "events",
        Configuration => "configuration" : "Configuration" | "config",
    }
}

crate::define_id_enum! {
    /// Dependency scope as declared in the build descriptor
    DependencyScope {
        Compile => "compile" : "Compile",
        Runtime => "runtime" : "Runtime",
        Provided => "provided" : "Provided",
        Test => "test" : "Test",
        System => "system" : "System",
        Import => "import" : "Import",
    }
}

impl Default for DependencyScope {
    fn default() -> Self {
        DependencyScope::Compile
    }
}

crate::define_id_enum! {
    BuildTool {
        Maven => "maven" : "Maven",
        Gradle => "gradle" : "Gradle",
    }
}

crate::define_id_enum! {
    MessageBroker {
        Kafka => "kafka" : "Kafka",
        RabbitMq => "rabbitmq" : "RabbitMQ" | "rabbit",
        ActiveMq => "activemq" : "ActiveMQ",
    }
}

crate::define_id_enum! {
    DatabaseKind {
        Postgres => "postgres" : "PostgreSQL" | "postgresql",
        MySql => "mysql" : "MySQL",
        MariaDb => "mariadb" : "MariaDB",
        Oracle => "oracle" : "Oracle",
        SqlServer => "sqlserver" : "SQL Server" | "mssql",
        H2 => "h2" : "H2",
        MongoDb => "mongodb" : "MongoDB" | "mongo",
    }
}

impl DatabaseKind {
    pub fn is_relational(&self) -> bool {
        !matches!(self, DatabaseKind::MongoDb)
    }
}

/// One external dependency declared in a build descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scope: DependencyScope,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            scope: DependencyScope::Compile,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    /// `group:artifact`, the identity used for de-duplication and lookup
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}", self.key(), version),
            None => f.write_str(&self.key()),
        }
    }
}

/// A single source type found by the scanner. Not mutated after scanning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Primary type name
    pub name: String,
    pub package: String,
    pub path: PathBuf,
    /// Path relative to the source root, used as the unit identifier in audits
    pub relative_path: String,
    /// Module the unit belongs to ("." for the root module)
    pub module: String,
    pub content: String,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

impl SourceUnit {
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    /// True if `name` appears among supertypes or implemented interfaces
    pub fn inherits(&self, name: &str) -> bool {
        self.supertypes.iter().chain(&self.interfaces).any(|t| t == name)
    }

    /// Hex SHA-256 of the unit content
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.content.as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    pub name: String,
    pub version: Option<String>,
}

/// A unit that matched more than one categorization rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousUnit {
    pub name: String,
    pub chosen: UnitCategory,
    pub also_matched: Vec<UnitCategory>,
}

/// Aggregate scan result. Produced once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    pub build_tool: BuildTool,
    pub framework: Option<FrameworkInfo>,
    pub language_version: String,
    pub base_package: String,
    pub group_id: String,
    pub artifact_id: String,
    pub modules: Vec<String>,
    pub is_multi_module: bool,
    pub dependencies: Vec<Dependency>,
    pub units: BTreeMap<UnitCategory, Vec<SourceUnit>>,
    #[serde(default)]
    pub ambiguous_units: Vec<AmbiguousUnit>,
    pub uses_document_store: bool,
    pub message_broker: Option<MessageBroker>,
    pub uses_cache: bool,
    pub primary_database: Option<DatabaseKind>,
}

impl ProjectDescriptor {
    pub fn units(&self, category: UnitCategory) -> &[SourceUnit] {
        self.units.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unit_counts(&self) -> BTreeMap<UnitCategory, usize> {
        UnitCategory::ALL
            .iter()
            .map(|c| (*c, self.units(*c).len()))
            .collect()
    }

    pub fn total_units(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    /// Multi-line human-readable overview
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Project: {} ({})\n", self.name, self.build_tool));
        if let Some(framework) = &self.framework {
            out.push_str(&format!(
                "Framework: {} {}\n",
                framework.name,
                framework.version.as_deref().unwrap_or("(unknown version)")
            ));
        }
        out.push_str(&format!("Java: {}\n", self.language_version));
        out.push_str(&format!("Base package: {}\n", self.base_package));
        if self.is_multi_module {
            out.push_str(&format!("Modules: {}\n", self.modules.join(", ")));
        }
        out.push_str(&format!("Dependencies: {}\n", self.dependencies.len()));
        for (category, count) in self.unit_counts() {
            out.push_str(&format!("  {:<14} {}\n", category.name(), count));
        }
        if let Some(db) = self.primary_database {
            out.push_str(&format!("Database: {}\n", db));
        }
        if let Some(broker) = self.message_broker {
            out.push_str(&format!("Message broker: {}\n", broker));
        }
        if self.uses_cache {
            out.push_str("Cache: yes\n");
        }
        out
    }
}
