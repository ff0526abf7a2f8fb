//! Dependency classification: can this project be migrated, and at what cost

mod classifier;
pub mod knowledge;
mod report;

pub use classifier::DependencyClassifier;
pub use knowledge::{Complexity, KnowledgeEntry};
pub use report::{DependencyReport, Replacement};
