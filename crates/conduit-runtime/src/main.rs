// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Renders a few frames of a colored quad on the headless device and logs
//! what reached it.

mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use conduit_core::renderer::Extent2D;
use conduit_core::{CancellationToken, DeviceConfiguration, DeviceContext, EngineSettings};
use conduit_infra::{GlslReflector, HeadlessDevice};
use conduit_lanes::{Engine, RenderLoop};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "conduit-runtime", version, about = "Drive the command engine headlessly.")]
struct Args {
    /// Engine settings file (RON). Defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 3)]
    frames: usize,

    /// Back buffer width in pixels.
    #[arg(long, default_value_t = 64)]
    width: u32,

    /// Back buffer height in pixels.
    #[arg(long, default_value_t = 64)]
    height: u32,

    /// Print the effective settings as RON and exit.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    print_settings: bool,
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => EngineSettings::default(),
    };
    if args.print_settings {
        println!("{}", settings.to_ron_string()?);
        return Ok(());
    }

    let device = Arc::new(HeadlessDevice::new(Extent2D::new(args.width, args.height)));
    let journal = device.journal();
    let context = Arc::new(DeviceContext::new(DeviceConfiguration {
        device,
        device_pixel_ratio: 1.0,
    }));
    let mut engine = Engine::new(context, Arc::new(GlslReflector::new()), settings)?;
    let scene = scene::Scene::load(&mut engine).context("building the scene")?;

    let mut render_loop = RenderLoop::new(engine, CancellationToken::new());
    for frame in 0..args.frames {
        render_loop
            .engine_mut()
            .request_animation_frame(move |engine| scene.record(engine, frame));
        let Some(report) = render_loop.tick() else {
            break;
        };
        let report = report.with_context(|| format!("rendering frame {frame}"))?;
        log::info!(
            "Frame {}: {} command(s), {} draw(s), {} upload(s), {} error(s).",
            report.frame.0,
            report.commands,
            report.draw_calls,
            report.uniform_uploads,
            report.errors.len()
        );
    }

    let readback = render_loop.engine_mut().read_frame_buffer_pixels();
    render_loop.tick().transpose()?;
    let pixels = readback.wait()?;
    let center = ((pixels.height / 2 * pixels.width + pixels.width / 2) * 4) as usize;
    log::info!(
        "Back buffer {}x{}, center pixel {:?}.",
        pixels.width,
        pixels.height,
        pixels.data.get(center..center + 4)
    );
    log::info!(
        "{} device action(s) recorded, stats of the last frame: {:?}.",
        journal.len(),
        render_loop.engine().frame_stats()
    );
    Ok(())
}
