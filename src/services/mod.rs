pub mod artifacts;
pub mod pipeline;

pub use artifacts::{StagingArea, StatsDocument, BINARY_FILE, HEADER_FILE, PREVIEW_FILE, STATS_FILE};
pub use pipeline::{
    Pipeline, PipelineFailure, PipelineRunner, PipelineStage, ProcessOutcome, RunReport,
};
