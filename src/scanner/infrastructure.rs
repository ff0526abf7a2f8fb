//! Infrastructure flags derived from the aggregated dependency list

use super::types::{DatabaseKind, Dependency, MessageBroker};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Infrastructure {
    pub uses_document_store: bool,
    pub message_broker: Option<MessageBroker>,
    pub uses_cache: bool,
    pub primary_database: Option<DatabaseKind>,
}

const DOCUMENT_STORE_FRAGMENTS: &[&str] = &["mongodb", "spring-data-mongodb"];

const BROKER_FRAGMENTS: &[(&str, MessageBroker)] = &[
    ("kafka", MessageBroker::Kafka),
    ("amqp", MessageBroker::RabbitMq),
    ("rabbit", MessageBroker::RabbitMq),
    ("activemq", MessageBroker::ActiveMq),
    ("artemis", MessageBroker::ActiveMq),
];

const CACHE_FRAGMENTS: &[&str] = &[
    "spring-boot-starter-cache",
    "redis",
    "jedis",
    "lettuce",
    "caffeine",
    "ehcache",
    "hazelcast",
];

const RELATIONAL_FRAGMENTS: &[(&str, DatabaseKind)] = &[
    ("postgresql", DatabaseKind::Postgres),
    ("mysql", DatabaseKind::MySql),
    ("mariadb", DatabaseKind::MariaDb),
    ("ojdbc", DatabaseKind::Oracle),
    ("mssql", DatabaseKind::SqlServer),
    ("sqlserver", DatabaseKind::SqlServer),
    ("h2database", DatabaseKind::H2),
];

pub fn detect(dependencies: &[Dependency]) -> Infrastructure {
    let keys: Vec<String> = dependencies.iter().map(|d| d.key().to_lowercase()).collect();
    let any = |fragment: &str| keys.iter().any(|k| k.contains(fragment));

    let uses_document_store = DOCUMENT_STORE_FRAGMENTS.iter().any(|f| any(f));

    let message_broker = BROKER_FRAGMENTS
        .iter()
        .find(|(fragment, _)| any(fragment))
        .map(|(_, broker)| *broker);

    let uses_cache = CACHE_FRAGMENTS.iter().any(|f| any(f));

    // A relational engine wins over a document store when both are declared
    let primary_database = RELATIONAL_FRAGMENTS
        .iter()
        .find(|(fragment, _)| any(fragment))
        .map(|(_, db)| *db)
        .or(uses_document_store.then_some(DatabaseKind::MongoDb));

    Infrastructure {
        uses_document_store,
        message_broker,
        uses_cache,
        primary_database,
    }
}
