//! C11 Pipeline Coordinator: use-case orchestration over the domain ports,
//! sequencing parse → annotate → embed+index → record for a batch of files.

pub mod coordinator;
pub mod deps;
pub mod progress;

pub use coordinator::{PipelineCoordinator, PipelineStage, ProgressCallback};
pub use deps::PipelineDeps;
pub use progress::{BatchOutcome, BatchStatus, PipelinePhase, PipelineProgress};
