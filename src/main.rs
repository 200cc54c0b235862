use anyhow::Result;

use tri_glow::window::{self, WindowConfig};

fn main() -> Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).
    window::run(WindowConfig::default())
}
