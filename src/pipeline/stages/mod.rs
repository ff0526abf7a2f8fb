// Migration stages, one file per stage kind in run order.
//
// Discovery and dependency analysis only compute; they never write outside
// the checkpoint. The unit stages share one implementation parameterized by
// category.

use super::context::MigrationContext;
use crate::checkpoint::{Stage, StageOutput};
use anyhow::Result;
use async_trait::async_trait;

#[path = "01_discovery.rs"]
pub mod discovery;
#[path = "02_dependencies.rs"]
pub mod dependencies;
#[path = "03_units.rs"]
pub mod units;
#[path = "04_final_assembly.rs"]
pub mod final_assembly;

pub use dependencies::DependencyStage;
pub use discovery::DiscoveryStage;
pub use final_assembly::{FinalAssemblyStage, MigrationManifest, MANIFEST_FILE, REPORT_FILE};
pub use units::UnitStage;

#[async_trait]
pub trait MigrationStage: Send + Sync {
    fn stage(&self) -> Stage;

    async fn execute(&self, context: &mut MigrationContext<'_>) -> Result<StageOutput>;
}

pub fn stage_for(stage: Stage) -> Box<dyn MigrationStage> {
    if let Some(category) = stage.category() {
        return Box::new(UnitStage::new(category));
    }
    match stage {
        Stage::Discovery => Box::new(DiscoveryStage),
        Stage::Dependencies => Box::new(DependencyStage),
        _ => Box::new(FinalAssemblyStage),
    }
}
