//! Drawer for a single static triangle given in normalized device coordinates.

use crate::error::RenderError;
use crate::shader;

/// One triangle, three xyz vertices, tightly packed.
pub const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.0, 0.5, 0.0,
];

pub struct Drawer {
    pub program: Option<glow::Program>,
    num_vtx: usize,
    pub vertex_array: Option<glow::VertexArray>,
    vertex_buffer: Option<glow::Buffer>,
}

impl Default for Drawer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawer {
    pub fn new() -> Self {
        Drawer {
            program: None,
            num_vtx: 0,
            vertex_array: None,
            vertex_buffer: None,
        }
    }

    /// Compiles and links the two shader sources into this drawer's program.
    pub fn compile_shader(
        &mut self,
        gl: &glow::Context,
        vertex_shader_source: &str,
        fragment_shader_source: &str,
    ) -> Result<(), RenderError> {
        let program = shader::build_program(gl, vertex_shader_source, fragment_shader_source)?;
        self.program = Some(program);
        Ok(())
    }

    /// Uploads the vertex positions and records the attribute layout.
    ///
    /// Must be called after `compile_shader`; the attribute location is
    /// queried from the linked program.
    pub fn set_vtx2xyz(&mut self, gl: &glow::Context, vtx2xyz: &[f32]) -> Result<(), RenderError> {
        self.num_vtx = vtx2xyz.len() / 3;
        use glow::HasContext as _;
        unsafe {
            let vertex_array = gl
                .create_vertex_array()
                .map_err(RenderError::Allocation)?;
            let vbo = gl.create_buffer().map_err(RenderError::Allocation)?;

            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vtx2xyz),
                glow::STATIC_DRAW,
            );

            gl.use_program(self.program);

            let loc_xyz = gl
                .get_attrib_location(self.program.unwrap(), "position")
                .ok_or_else(|| {
                    RenderError::Allocation("attribute `position` not found in program".to_string())
                })?;
            gl.vertex_attrib_pointer_f32(
                loc_xyz,
                3,
                glow::FLOAT,
                false,
                3 * std::mem::size_of::<f32>() as i32,
                0,
            );
            gl.enable_vertex_attrib_array(loc_xyz);

            self.vertex_array = Some(vertex_array);
            self.vertex_buffer = Some(vbo);
        }
        Ok(())
    }

    pub fn paint(&self, gl: &glow::Context) {
        use glow::HasContext as _;
        unsafe {
            gl.use_program(self.program);
            gl.bind_vertex_array(self.vertex_array);
            gl.draw_arrays(glow::TRIANGLES, 0, self.num_vtx as i32);
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        use glow::HasContext as _;
        unsafe {
            if let Some(program) = self.program.take() {
                gl.delete_program(program);
            }
            if let Some(vertex_array) = self.vertex_array.take() {
                gl.delete_vertex_array(vertex_array);
            }
            if let Some(vbo) = self.vertex_buffer.take() {
                gl.delete_buffer(vbo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_is_three_points_in_ndc() {
        assert_eq!(TRIANGLE_VERTICES.len(), 9);
        assert!(TRIANGLE_VERTICES.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn fresh_drawer_holds_no_handles() {
        let drawer = Drawer::new();
        assert!(drawer.program.is_none());
        assert!(drawer.vertex_array.is_none());
    }
}
