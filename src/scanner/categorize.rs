//! Unit categorization rules
//!
//! Rules are evaluated in a fixed order and the first match decides the
//! category. Every matching rule is still reported so the scanner can record
//! units that would fit more than one category.

use super::extractor::body_annotations;
use super::types::{SourceUnit, UnitCategory};

const ENTITY_ANNOTATIONS: &[&str] = &[
    "Entity",
    "Table",
    "Document",
    "Embeddable",
    "MappedSuperclass",
];

const REPOSITORY_SUPERTYPES: &[&str] = &[
    "JpaRepository",
    "CrudRepository",
    "PagingAndSortingRepository",
    "MongoRepository",
    "ReactiveCrudRepository",
    "Repository",
];

const CONTROLLER_ANNOTATIONS: &[&str] = &["RestController", "Controller"];

const LISTENER_ANNOTATIONS: &[&str] = &[
    "KafkaListener",
    "RabbitListener",
    "JmsListener",
    "EventListener",
    "SqsListener",
];

const CONFIGURATION_ANNOTATIONS: &[&str] = &["Configuration", "ConfigurationProperties"];

struct Signals<'a> {
    unit: &'a SourceUnit,
    body: Vec<String>,
}

impl Signals<'_> {
    fn any_annotation(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.unit.has_annotation(n))
    }

    fn any_body_annotation(&self, names: &[&str]) -> bool {
        self.body.iter().any(|a| names.contains(&a.as_str()))
    }
}

fn is_entity(s: &Signals) -> bool {
    s.any_annotation(ENTITY_ANNOTATIONS)
}

fn is_repository(s: &Signals) -> bool {
    s.unit.has_annotation("Repository") || REPOSITORY_SUPERTYPES.iter().any(|t| s.unit.inherits(t))
}

fn is_controller(s: &Signals) -> bool {
    s.any_annotation(CONTROLLER_ANNOTATIONS)
}

fn is_service(s: &Signals) -> bool {
    s.unit.has_annotation("Service")
}

fn is_job(s: &Signals) -> bool {
    s.any_body_annotation(&["Scheduled"])
}

fn is_listener(s: &Signals) -> bool {
    s.any_body_annotation(LISTENER_ANNOTATIONS)
}

fn is_configuration(s: &Signals) -> bool {
    s.any_annotation(CONFIGURATION_ANNOTATIONS)
}

const RULES: &[(UnitCategory, fn(&Signals) -> bool)] = &[
    (UnitCategory::Entity, is_entity),
    (UnitCategory::Repository, is_repository),
    (UnitCategory::Controller, is_controller),
    (UnitCategory::Service, is_service),
    (UnitCategory::Job, is_job),
    (UnitCategory::Listener, is_listener),
    (UnitCategory::Configuration, is_configuration),
];

/// All categories whose rule matches `unit`, in rule order.
/// The first entry is the category the unit is filed under; an empty result
/// means the unit is not migrated.
pub fn matching_categories(unit: &SourceUnit) -> Vec<UnitCategory> {
    let signals = Signals {
        unit,
        body: body_annotations(&unit.content),
    };
    RULES
        .iter()
        .filter(|(_, rule)| rule(&signals))
        .map(|(category, _)| *category)
        .collect()
}

pub fn categorize(unit: &SourceUnit) -> Option<UnitCategory> {
    matching_categories(unit).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::extractor::{JavaExtractor, StructuralExtractor};
    use std::path::Path;
    use yare::parameterized;

    fn unit(content: &str) -> SourceUnit {
        JavaExtractor::new()
            .extract(Path::new("X.java"), content)
            .expect("unit")
    }

    #[parameterized(
        entity = { "@Entity\nclass A {}", Some(UnitCategory::Entity) },
        document = { "@Document(collection = \"a\")\nclass A {}", Some(UnitCategory::Entity) },
        repository_annotation = { "@Repository\nclass A {}", Some(UnitCategory::Repository) },
        repository_interface = { "interface A extends CrudRepository<A, Long> {}", Some(UnitCategory::Repository) },
        rest_controller = { "@RestController\nclass A {}", Some(UnitCategory::Controller) },
        service = { "@Service\nclass A {}", Some(UnitCategory::Service) },
        job = { "@Component\nclass A {\n @Scheduled(fixedRate = 1000)\n void t() {}\n}", Some(UnitCategory::Job) },
        listener = { "@Component\nclass A {\n @KafkaListener(topics = \"t\")\n void on(String m) {}\n}", Some(UnitCategory::Listener) },
        configuration = { "@Configuration\nclass A {}", Some(UnitCategory::Configuration) },
        plain = { "class A {}", None },
        dto = { "@Data\nclass A {}", None },
    )]
    fn test_categorize(content: &str, expected: Option<UnitCategory>) {
        assert_eq!(categorize(&unit(content)), expected);
    }

    #[test]
    fn test_first_match_wins_and_all_matches_reported() {
        let u = unit(
            "@Configuration\nclass Wiring {\n @EventListener\n void ready() {}\n}",
        );
        assert_eq!(
            matching_categories(&u),
            vec![UnitCategory::Listener, UnitCategory::Configuration]
        );
        assert_eq!(categorize(&u), Some(UnitCategory::Listener));
    }

    #[test]
    fn test_service_with_scheduled_method_is_service() {
        let u = unit("@Service\nclass Billing {\n @Scheduled(cron = \"0 0 * * * *\")\n void close() {}\n}");
        assert_eq!(categorize(&u), Some(UnitCategory::Service));
        assert_eq!(matching_categories(&u).len(), 2);
    }
}
