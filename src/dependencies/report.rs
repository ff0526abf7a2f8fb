use super::knowledge::Complexity;
use crate::scanner::Dependency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// A dependency that maps onto a documented alternative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub dependency: Dependency,
    pub alternative: String,
    pub impact: String,
    pub complexity: Complexity,
    /// Knowledge-base key the dependency was matched against
    pub matched: String,
}

impl Replacement {
    pub fn key(&self) -> String {
        self.dependency.key()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub compatible: Vec<Dependency>,
    pub replaceable: Vec<Replacement>,
    /// `group:artifact` keys with no migration path
    pub unsupported: Vec<String>,
    /// Replacement keys the operator has explicitly accepted
    #[serde(default)]
    pub accepted: BTreeSet<String>,
}

impl DependencyReport {
    /// High-complexity replacements not yet accepted
    pub fn blockers(&self) -> Vec<&Replacement> {
        self.replaceable
            .iter()
            .filter(|r| r.complexity == Complexity::High && !self.accepted.contains(&r.key()))
            .collect()
    }

    pub fn has_blockers(&self) -> bool {
        !self.blockers().is_empty()
    }

    /// Marks a replacement as accepted. Returns false if `key` is not a replacement.
    pub fn accept(&mut self, key: &str) -> bool {
        if self.replaceable.iter().any(|r| r.key() == key) {
            self.accepted.insert(key.to_string());
            true
        } else {
            false
        }
    }

    pub fn total(&self) -> usize {
        self.compatible.len() + self.replaceable.len() + self.unsupported.len()
    }

    /// One-line count summary
    pub fn summary(&self) -> String {
        format!(
            "{} compatible, {} replaceable, {} unsupported, {} blocker(s)",
            self.compatible.len(),
            self.replaceable.len(),
            self.unsupported.len(),
            self.blockers().len()
        )
    }

    /// Markdown rendering used in dry-run output and the migration report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dependencies: {}\n", self.summary());

        if !self.replaceable.is_empty() {
            let _ = writeln!(out, "| Dependency | Alternative | Complexity | Impact |");
            let _ = writeln!(out, "|---|---|---|---|");
            for r in &self.replaceable {
                let marker = if self.accepted.contains(&r.key()) {
                    " (accepted)"
                } else {
                    ""
                };
                let _ = writeln!(
                    out,
                    "| {} | {} | {}{} | {} |",
                    r.key(),
                    r.alternative,
                    r.complexity.name(),
                    marker,
                    r.impact
                );
            }
            out.push('\n');
        }

        if !self.unsupported.is_empty() {
            let _ = writeln!(out, "Unsupported:");
            for key in &self.unsupported {
                let _ = writeln!(out, "- {}", key);
            }
            out.push('\n');
        }

        let blockers = self.blockers();
        if !blockers.is_empty() {
            let _ = writeln!(out, "Blockers (accept with --accept <group:artifact>):");
            for b in blockers {
                let _ = writeln!(out, "- {}: {}", b.key(), b.impact);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacement(key: &str, complexity: Complexity) -> Replacement {
        let (g, a) = key.split_once(':').unwrap();
        Replacement {
            dependency: Dependency::new(g, a),
            alternative: "alt".into(),
            impact: "impact".into(),
            complexity,
            matched: key.into(),
        }
    }

    #[test]
    fn test_blockers_only_unaccepted_high() {
        let mut report = DependencyReport {
            replaceable: vec![
                replacement("a:low", Complexity::Low),
                replacement("b:medium", Complexity::Medium),
                replacement("c:high", Complexity::High),
            ],
            ..Default::default()
        };
        assert!(report.has_blockers());
        assert_eq!(report.blockers().len(), 1);

        assert!(report.accept("c:high"));
        assert!(!report.has_blockers());
        assert!(!report.accept("missing:dep"));
        assert!(report.render().contains("(accepted)"));
    }

    #[test]
    fn test_no_replacements_no_blockers() {
        let report = DependencyReport::default();
        assert!(!report.has_blockers());
        assert_eq!(
            report.summary(),
            "0 compatible, 0 replaceable, 0 unsupported, 0 blocker(s)"
        );
    }

    #[test]
    fn test_render_lists_unsupported() {
        let report = DependencyReport {
            unsupported: vec!["org.apache.struts:struts2-core".into()],
            ..Default::default()
        };
        assert!(report.render().contains("- org.apache.struts:struts2-core"));
    }
}
