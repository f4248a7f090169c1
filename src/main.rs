// heightscape main.rs

mod common;
mod config;
mod controller;
mod error;
mod gen;
mod noise;
mod renderer;
mod system_diagnostics;
mod terrain;

use std::time::Instant;
use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::{CursorGrabMode, WindowBuilder};
use crate::config::Args;
use crate::controller::{Command, Controller};
use crate::renderer::Renderer;
use crate::system_diagnostics::SystemDiagnostics;
use crate::terrain::TerrainState;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    args.validate().context("invalid configuration")?;

    SystemDiagnostics::log_startup_info();

    let seed = args.resolve_seed();
    info!("seed {} (pass --seed {} to replay)", seed, seed);
    let mut terrain = TerrainState::new(args.size, seed, !args.no_outlines);
    terrain.regenerate_current().context("initial terrain generation failed")?;

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("heightscape")
        .with_inner_size(PhysicalSize::new(args.width, args.height))
        .build(&event_loop)?;

    let mut renderer = pollster::block_on(Renderer::new(&window))?;
    if let Some(mesh) = terrain.mesh() {
        renderer.upload_terrain(mesh);
        renderer.log_memory();
    }
    let mut controller = Controller::new(args.move_speed, args.mouse_sensitivity);

    // hide and capture the cursor for mouse look
    if renderer.window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
        let _ = renderer.window.set_cursor_grab(CursorGrabMode::Confined);
    }
    renderer.window.set_cursor_visible(false);

    let mut last_time = Instant::now();

    event_loop.run(move |event, target| {
        match event {
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                controller.process_mouse_motion(delta);
            },

            Event::WindowEvent { event, window_id } if window_id == renderer.window.id() => {
                match controller.process_events(&event) {
                    Some(Command::Regenerate) => {
                        // a failed rebuild is logged by the terrain and the old mesh stays up
                        if terrain.regenerate_current().is_ok() {
                            if let Some(mesh) = terrain.mesh() { renderer.upload_terrain(mesh); }
                            renderer.window.request_redraw();
                        }
                    },
                    Some(Command::ToggleWireframe) => {
                        terrain.toggle_wireframe();
                    },
                    Some(Command::Quit) => target.exit(),
                    None => {}
                }

                match event {
                    WindowEvent::CloseRequested => target.exit(),
                    WindowEvent::Resized(size) => renderer.resize(size.width, size.height),
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let dt = (now - last_time).as_secs_f32();
                        last_time = now;

                        controller.update_camera(dt);
                        if let Err(e) = renderer.render(&controller, &terrain) {
                            error!("render failed: {:#}", e);
                            target.exit();
                        }
                    },
                    _ => {}
                }
            },
            Event::AboutToWait => renderer.window.request_redraw(),
            _ => {}
        }
    })?;

    Ok(())
}
