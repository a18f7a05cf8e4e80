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

//! Command line and `Sandbox.toml` configuration.

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vesta_lanes::{CullingConfig, DrawCallSortMode};

/// Runs the render queue over a synthetic scene.
#[derive(Debug, Parser)]
#[command(name = "sandbox", version)]
pub struct Args {
    /// Path to a TOML configuration file.
    #[arg(long, default_value = "Sandbox.toml")]
    pub config: PathBuf,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Side length of the instanced crate grid.
    #[arg(long)]
    pub grid: Option<u32>,

    /// Draw order of the opaque pass (no_sorting, front_to_back, back_to_front).
    #[arg(long)]
    pub sort: Option<DrawCallSortMode>,

    /// Disable frustum culling.
    #[arg(long)]
    pub no_culling: bool,

    /// Keep culling against the first frame's frustum.
    #[arg(long)]
    pub freeze_culling: bool,
}

/// Settings read from the configuration file, overridable from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Frames to simulate.
    pub frames: u64,
    /// Side length of the crate grid.
    pub grid_size: u32,
    /// Draw order of the opaque pass.
    pub sort_mode: DrawCallSortMode,
    /// Frustum culling switches.
    pub culling: CullingConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            grid_size: 24,
            sort_mode: DrawCallSortMode::FrontToBack,
            culling: CullingConfig::default(),
        }
    }
}

impl SandboxConfig {
    /// Loads `path` if it exists, then applies the command line overrides.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = Self::load(&args.config)?;
        if let Some(frames) = args.frames {
            config.frames = frames;
        }
        if let Some(grid) = args.grid {
            config.grid_size = grid;
        }
        if let Some(sort) = args.sort {
            config.sort_mode = sort;
        }
        if args.no_culling {
            config.culling.enable_frustum_culling = false;
        }
        if args.freeze_culling {
            config.culling.freeze_frustum_culling = true;
        }
        Ok(config)
    }

    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No '{}' found, using the default configuration", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse TOML from '{}'", path.display()))?;
        log::info!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }
}
