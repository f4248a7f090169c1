use std::time::{SystemTime, UNIX_EPOCH};
use clap::Parser;
use crate::common::DEFAULT_TERRAIN_SIZE;
use crate::error::{Result, TerrainError};
use crate::noise::validate_size;

/// Procedural height-field terrain viewer
#[derive(Parser, Debug, Clone)]
#[command(name = "heightscape")]
#[command(about = "Generates a random height-field terrain and flies a camera over it", long_about = None)]
pub struct Args {
    /// Grid cells per side
    #[arg(short, long, default_value_t = DEFAULT_TERRAIN_SIZE, allow_negative_numbers = true)]
    pub size: i32,

    /// RNG seed (defaults to the current time)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Window width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Start with triangle outlines hidden
    #[arg(long)]
    pub no_outlines: bool,

    /// Camera speed in units per second
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub move_speed: f32,

    /// Degrees of rotation per pixel of mouse motion
    #[arg(long, default_value_t = 0.1, allow_negative_numbers = true)]
    pub mouse_sensitivity: f32,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        validate_size(self.size)?;
        if self.width == 0 || self.height == 0 {
            return Err(TerrainError::InvalidArgument(format!(
                "window must have a non-zero area, got {}x{}", self.width, self.height
            )));
        }
        if !(self.move_speed > 0.0) {
            return Err(TerrainError::InvalidArgument(format!("move speed must be positive, got {}", self.move_speed)));
        }
        if !(self.mouse_sensitivity > 0.0) {
            return Err(TerrainError::InvalidArgument(format!(
                "mouse sensitivity must be positive, got {}", self.mouse_sensitivity
            )));
        }
        Ok(())
    }

    /// Explicit seed, or one taken from the wall clock.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
    }
}
