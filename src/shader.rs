//! Shader source loading, compilation, and program linking.

use std::path::Path;

use glow::HasContext;

use crate::error::RenderError;

/// Driver info logs are reported at most this many bytes.
pub const INFO_LOG_LIMIT: usize = 512;

/// Pipeline stage a shader object is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_kind(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Reads a whole shader source file into a string.
pub fn load_source(path: impl AsRef<Path>) -> Result<String, RenderError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| RenderError::ShaderIo {
        path: path.to_path_buf(),
        source,
    })
}

pub fn compile(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader, RenderError> {
    unsafe {
        let shader = gl
            .create_shader(stage.gl_kind())
            .map_err(RenderError::Allocation)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = truncate_log(&gl.get_shader_info_log(shader)).to_string();
            gl.delete_shader(shader);
            return Err(RenderError::ShaderCompile { stage, log });
        }
        Ok(shader)
    }
}

pub fn link_program(
    gl: &glow::Context,
    vertex_shader: glow::Shader,
    fragment_shader: glow::Shader,
) -> Result<glow::Program, RenderError> {
    unsafe {
        let program = gl.create_program().map_err(RenderError::Allocation)?;
        gl.attach_shader(program, vertex_shader);
        gl.attach_shader(program, fragment_shader);
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);

        // The compiled artifacts now live inside the program object;
        // the shader objects are retired either way.
        gl.detach_shader(program, vertex_shader);
        gl.detach_shader(program, fragment_shader);
        gl.delete_shader(vertex_shader);
        gl.delete_shader(fragment_shader);

        if !linked {
            let log = truncate_log(&gl.get_program_info_log(program)).to_string();
            gl.delete_program(program);
            return Err(RenderError::ProgramLink { log });
        }
        Ok(program)
    }
}

/// Compiles a vertex and a fragment shader and links them into a program.
pub fn build_program(
    gl: &glow::Context,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<glow::Program, RenderError> {
    let vertex_shader = compile(gl, ShaderStage::Vertex, vertex_source)?;
    let fragment_shader = match compile(gl, ShaderStage::Fragment, fragment_source) {
        Ok(shader) => shader,
        Err(err) => {
            unsafe { gl.delete_shader(vertex_shader) };
            return Err(err);
        }
    };
    link_program(gl, vertex_shader, fragment_shader)
}

/// Caps a driver log at `INFO_LOG_LIMIT` bytes without splitting a
/// UTF-8 sequence.
fn truncate_log(log: &str) -> &str {
    if log.len() <= INFO_LOG_LIMIT {
        return log;
    }
    let mut end = INFO_LOG_LIMIT;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    &log[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_source_missing_file() {
        let err = load_source("shaders/does_not_exist.glsl").unwrap_err();
        assert!(matches!(err, RenderError::ShaderIo { .. }));
        assert!(err.to_string().contains("does_not_exist.glsl"));
    }

    #[test]
    fn load_source_reads_whole_file() {
        let path = std::env::temp_dir().join("tri_glow_load_source_test.glsl");
        let src = "#version 330 core\nvoid main() {}\n";
        std::fs::write(&path, src).unwrap();
        assert_eq!(load_source(&path).unwrap(), src);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn short_log_untouched() {
        assert_eq!(truncate_log("0:1(10): error: syntax error"), "0:1(10): error: syntax error");
        assert_eq!(truncate_log(""), "");
    }

    #[test]
    fn long_log_capped() {
        let log = "e".repeat(3 * INFO_LOG_LIMIT);
        assert_eq!(truncate_log(&log).len(), INFO_LOG_LIMIT);
    }

    #[test]
    fn cap_lands_on_char_boundary() {
        // Three-byte chars put the 512-byte mark inside a sequence.
        let log = "€".repeat(INFO_LOG_LIMIT);
        let cut = truncate_log(&log);
        assert!(cut.len() <= INFO_LOG_LIMIT);
        assert!(!cut.is_empty());
        assert_eq!(cut.len() % '€'.len_utf8(), 0);
    }

    #[test]
    fn stage_names() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");
        assert_eq!(ShaderStage::Vertex.gl_kind(), glow::VERTEX_SHADER);
        assert_eq!(ShaderStage::Fragment.gl_kind(), glow::FRAGMENT_SHADER);
    }
}
