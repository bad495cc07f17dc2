//! Records one frame of the demo scene on the recording device and prints the pass trace.
//! Run: cargo run -p debug --bin headless_frame [-- path/to/model.obj]
//! PENUMBRA_MODE / PENUMBRA_TARGET / PENUMBRA_TONE_MAPPING apply as in the windowed demo.

use std::path::PathBuf;

use penumbra_bridge::PenumbraPlugin;
use penumbra_renderer::demo::build_demo_scene;
use penumbra_renderer::RendererConfig;
use penumbra_rhi::headless::RecordingDevice;
use penumbra_rhi::{Command, RenderTargetRef};
use render_api::{FrameInfo, Input, RenderBackend};

const VIEWPORT: (u32, u32) = (1280, 720);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = RendererConfig::from_env();
    let model_path = std::env::args().nth(1).map(PathBuf::from);

    let mut plugin = PenumbraPlugin::new(RecordingDevice::new(), config, VIEWPORT)?;
    plugin.setup(|renderer, device| build_demo_scene(renderer, device, model_path.as_deref()))?;

    let frame = FrameInfo {
        viewport_size: VIEWPORT,
        delta_seconds: 0.0,
    };
    plugin.update(&Input::new(), &frame)?;
    plugin.render_frame(&frame)?;

    let Some(list) = plugin.device().last_submission() else {
        anyhow::bail!("nothing was submitted");
    };
    let renderer = plugin.renderer();
    println!(
        "{:?} mode, target {}: {} passes, {} draws, {} commands",
        renderer.mode(),
        renderer.target().name(),
        list.passes().len(),
        list.draw_count(),
        list.len()
    );
    for pass in list.passes() {
        let target = match pass.target {
            RenderTargetRef::Default => "default".to_string(),
            RenderTargetRef::Framebuffer(id) => format!("framebuffer {}", id.0),
        };
        println!("  {:<18} {:<14} {} draws", pass.label, target, pass.draws);
    }
    let programs = list
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::UseProgram(_)))
        .count();
    println!("{programs} program switches");
    Ok(())
}
