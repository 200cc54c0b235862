use std::path::PathBuf;

use thiserror::Error;

use crate::shader::ShaderStage;

/// Failures that abort renderer startup.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read shader source {}: {source}", .path.display())]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("failed to link shader program: {log}")]
    ProgramLink { log: String },

    #[error("cannot create GL object: {0}")]
    Allocation(String),
}
