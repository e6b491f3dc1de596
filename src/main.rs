// src/main.rs
mod app;

use app::App;
use aqua_visual::{RendererConfig, Result};

fn main() -> Result<()> {
    env_logger::init();

    App::run(RendererConfig::default())
}
