pub mod drawer_triangle;
pub mod error;
pub mod shader;
pub mod window;
