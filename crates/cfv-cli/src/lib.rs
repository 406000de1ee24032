//! Library side of the `cfv` binary: logging setup and the pipeline run.

pub mod logging;
pub mod pipeline;
pub mod types;
