use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use driver::{DriverConfig, Roster};
use raster::{Shading, DEFAULT_CAPACITY};
use serde::Deserialize;
use service_abi::{Dimensions, Rgb};
use transport::{ReadSemantics, WaitStrategy};
use triangulator::TriangulatorConfig;

/// Largest grid a session accepts: 64 MiB per matrix.
const MAX_PIXELS: u64 = 4096 * 4096;

/// Settings shared by every participant of a session.
///
/// ```toml
/// triangulators = 4
/// read_semantics = "consume"
/// wait = { park = 250 }
/// dims = { width = 640, height = 480 }
/// initial_color = { r = 0, g = 0, b = 32 }
///
/// [shading]
/// apply_lighting = true
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Raster and depth grid size.
    pub dims: Dimensions,
    /// Number of triangulators, indexed from 1.
    pub triangulators: u32,
    /// What reading a command or reply record does to its payload.
    pub read_semantics: ReadSemantics,
    /// How blocked opens pause between attempts.
    pub wait: WaitStrategy,
    /// Samples each triangulator may hold for one triangle.
    pub scratch_capacity: usize,
    /// Colouring applied when samples are resolved.
    pub shading: Shading,
    /// Colour the raster matrix starts with.
    pub initial_color: Rgb,
    /// Depth the depth matrix starts with.
    pub initial_depth: i32,
    /// Directory of the file-backed store shared by separate processes.
    pub root: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dims: Dimensions::default(),
            triangulators: 1,
            read_semantics: ReadSemantics::default(),
            wait: WaitStrategy::default(),
            scratch_capacity: DEFAULT_CAPACITY,
            shading: Shading::default(),
            initial_color: Rgb::default(),
            initial_depth: 0,
            root: None,
        }
    }
}

impl SessionConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("parsing session config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading session config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Rejects settings no session can run with.
    pub fn validate(&self) -> Result<()> {
        if self.triangulators == 0 {
            bail!("a session needs at least one triangulator");
        }
        if self.dims.pixel_count() == 0 {
            bail!(
                "matrix dimensions {}x{} are empty",
                self.dims.width,
                self.dims.height
            );
        }
        let pixels = u64::from(self.dims.width) * u64::from(self.dims.height);
        if pixels > MAX_PIXELS {
            bail!(
                "matrix dimensions {}x{} exceed the {MAX_PIXELS}-pixel limit",
                self.dims.width,
                self.dims.height
            );
        }
        if self.scratch_capacity == 0 {
            bail!("scratch capacity must be positive");
        }
        Ok(())
    }

    /// Triangulator indices `1..=triangulators`.
    pub fn roster(&self) -> Roster {
        (1..=self.triangulators).collect()
    }

    /// Driver settings derived from this session.
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            dims: self.dims,
            triangulators: self.roster(),
            read_semantics: self.read_semantics,
            initial_color: self.initial_color,
            initial_depth: self.initial_depth,
        }
    }

    /// Settings for triangulator `T<index>`.
    pub fn triangulator_config(&self, index: u32) -> TriangulatorConfig {
        TriangulatorConfig {
            index,
            dims: self.dims,
            shading: self.shading,
            scratch_capacity: self.scratch_capacity,
            read_semantics: self.read_semantics,
        }
    }
}
