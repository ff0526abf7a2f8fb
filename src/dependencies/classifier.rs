use super::knowledge::{
    default_compatible, default_compatible_fragments, default_deny_fragments,
    default_knowledge_base, KnowledgeEntry,
};
use super::report::{DependencyReport, Replacement};
use crate::scanner::Dependency;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Replaceable(usize),
    Compatible,
    Unsupported,
}

/// Partitions declared dependencies into compatible, replaceable and unsupported
///
/// Lookup order per `group:artifact` key:
/// 1. exact knowledge-base key
/// 2. knowledge-base key contained in the dependency key
/// 3. compatible key or fragment
/// 4. deny-list fragment
/// 5. otherwise compatible
#[derive(Debug, Clone)]
pub struct DependencyClassifier {
    knowledge: Vec<KnowledgeEntry>,
    exact: HashMap<String, usize>,
    compatible: Vec<String>,
    deny_fragments: Vec<String>,
}

impl Default for DependencyClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DependencyClassifier {
    pub fn with_defaults() -> Self {
        let mut compatible = default_compatible();
        compatible.extend(default_compatible_fragments());
        Self::new(default_knowledge_base(), compatible, default_deny_fragments())
    }

    /// `compatible` entries match either exactly or as a fragment of the key
    pub fn new(knowledge: Vec<KnowledgeEntry>, compatible: Vec<String>, deny: Vec<String>) -> Self {
        let exact = knowledge
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();
        Self {
            knowledge,
            exact,
            compatible,
            deny_fragments: deny,
        }
    }

    pub fn knowledge(&self) -> &[KnowledgeEntry] {
        &self.knowledge
    }

    fn classify(&self, key: &str) -> Verdict {
        if let Some(&i) = self.exact.get(key) {
            return Verdict::Replaceable(i);
        }
        if let Some(i) = self.knowledge.iter().position(|e| key.contains(&e.key)) {
            return Verdict::Replaceable(i);
        }
        if self
            .compatible
            .iter()
            .any(|c| key == c || key.contains(c.as_str()))
        {
            return Verdict::Compatible;
        }
        if self.deny_fragments.iter().any(|d| key.contains(d.as_str())) {
            return Verdict::Unsupported;
        }
        Verdict::Compatible
    }

    pub fn analyze(&self, dependencies: &[Dependency]) -> DependencyReport {
        let mut report = DependencyReport::default();

        for dep in dependencies {
            let key = dep.key();
            let verdict = self.classify(&key);
            debug!(dependency = %key, verdict = ?verdict, "Classified dependency");

            match verdict {
                Verdict::Replaceable(i) => {
                    let entry = &self.knowledge[i];
                    report.replaceable.push(Replacement {
                        dependency: dep.clone(),
                        alternative: entry.alternative.clone(),
                        impact: entry.impact.clone(),
                        complexity: entry.complexity,
                        matched: entry.key.clone(),
                    });
                }
                Verdict::Compatible => report.compatible.push(dep.clone()),
                Verdict::Unsupported => {
                    if !report.unsupported.contains(&key) {
                        report.unsupported.push(key);
                    }
                }
            }
        }

        report
    }

    /// [`analyze`](Self::analyze), then accept each of `accepted` that names a replacement
    pub fn analyze_with_accepted(
        &self,
        dependencies: &[Dependency],
        accepted: &[String],
    ) -> DependencyReport {
        let mut report = self.analyze(dependencies);
        for key in accepted {
            if !report.accept(key) {
                debug!(dependency = %key, "Accepted key is not a replaceable dependency");
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::knowledge::Complexity;
    use yare::parameterized;

    fn dep(key: &str) -> Dependency {
        let (g, a) = key.split_once(':').unwrap();
        Dependency::new(g, a)
    }

    #[parameterized(
        exact_kb = { "org.springframework.boot:spring-boot-starter-data-jpa", "replaceable" },
        fragment_kb = { "com.fasterxml.jackson.core:jackson-databind", "replaceable" },
        compatible_exact = { "org.postgresql:postgresql", "compatible" },
        compatible_fragment = { "org.junit.jupiter:junit-jupiter", "compatible" },
        starter_web = { "org.springframework.boot:spring-boot-starter-web", "compatible" },
        deny = { "org.apache.struts:struts2-core", "unsupported" },
        deny_websphere = { "com.ibm.websphere:was-api", "unsupported" },
        unknown = { "com.example:something-internal", "compatible" },
    )]
    fn test_classification(key: &str, expected: &str) {
        let classifier = DependencyClassifier::with_defaults();
        let verdict = match classifier.classify(key) {
            Verdict::Replaceable(_) => "replaceable",
            Verdict::Compatible => "compatible",
            Verdict::Unsupported => "unsupported",
        };
        assert_eq!(verdict, expected);
    }

    #[test]
    fn test_custom_compatible_fragment_wins_over_deny() {
        let classifier = DependencyClassifier::new(
            vec![],
            vec!["acme-platform".to_string()],
            vec!["com.acme".to_string()],
        );
        let report = classifier.analyze(&[
            dep("com.acme:acme-platform-starter"),
            dep("com.acme:legacy-bus"),
        ]);
        assert_eq!(report.compatible.len(), 1);
        assert_eq!(report.compatible[0].key(), "com.acme:acme-platform-starter");
        assert_eq!(report.unsupported, vec!["com.acme:legacy-bus"]);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let deps: Vec<_> = [
            "org.springframework.boot:spring-boot-starter-security",
            "org.springframework.boot:spring-boot-starter-web",
            "org.apache.struts:struts2-core",
            "org.projectlombok:lombok",
        ]
        .iter()
        .map(|k| dep(k))
        .collect();

        let classifier = DependencyClassifier::with_defaults();
        let first = classifier.analyze(&deps);
        for _ in 0..5 {
            assert_eq!(classifier.analyze(&deps), first);
        }
        assert_eq!(first.replaceable.len(), 2);
        assert_eq!(first.compatible.len(), 1);
        assert_eq!(first.unsupported, vec!["org.apache.struts:struts2-core"]);
        assert!(first.has_blockers());
    }

    #[test]
    fn test_accepted_clears_blockers() {
        let deps = vec![dep("org.springframework.boot:spring-boot-starter-security")];
        let report = DependencyClassifier::with_defaults().analyze_with_accepted(
            &deps,
            &["org.springframework.boot:spring-boot-starter-security".to_string()],
        );
        assert!(!report.has_blockers());
        assert_eq!(report.replaceable[0].complexity, Complexity::High);
    }

    #[test]
    fn test_custom_knowledge_base() {
        let classifier = DependencyClassifier::new(
            vec![KnowledgeEntry::new("acme:legacy", "new", "rewrite", Complexity::High)],
            vec![],
            vec!["forbidden".into()],
        );
        let report = classifier.analyze(&[dep("acme:legacy"), dep("x:forbidden-lib"), dep("x:y")]);
        assert_eq!(report.replaceable.len(), 1);
        assert_eq!(report.unsupported.len(), 1);
        assert_eq!(report.compatible.len(), 1);
    }
}
