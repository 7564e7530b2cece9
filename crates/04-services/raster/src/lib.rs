//! Software triangle rasterizer.
//!
//! Triangles are perspective-divided, outlined with three interpolated lines
//! and filled by pairing edge pixels that share an X coordinate. Samples are
//! collected in a [`PixelScratch`] arena and written into the raster and depth
//! buffers by [`Rasterizer::resolve`].

mod rasterizer;
mod scratch;
mod vector;

use serde::Deserialize;
use service_abi::DrawCommand;

pub use rasterizer::{project, Rasterizer, ResolveStats, TriangleReport, LIGHT_DIRECTION};
pub use scratch::{PixelScratch, Sample, DEFAULT_CAPACITY};
pub use vector::Vec3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    #[error("pixel scratch is full ({capacity} samples)")]
    ScratchOverflow { capacity: usize },
}

/// Texel coordinates tile every 100 units.
pub const TEXEL_PERIOD: i32 = 100;

/// Wraps a texel coordinate into `[0, 100)`.
///
/// Negative values are folded by truncating division and shifted up by one
/// period. A negative multiple of the period lands on exactly 100 after that
/// shift and is folded a second time.
pub fn wrap_texel(mut v: i32) -> i32 {
    if v < 0 {
        v -= TEXEL_PERIOD * (v / TEXEL_PERIOD);
        v += TEXEL_PERIOD;
    }
    if v >= TEXEL_PERIOD {
        v -= TEXEL_PERIOD * (v / TEXEL_PERIOD);
    }
    v
}

/// View-space triangle vertex with texel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub u: i32,
    pub v: i32,
}

/// Surface parameters carried alongside the geometry. Texture and normal map
/// names are opaque; nothing samples them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Material {
    pub texture: String,
    pub normal_map: String,
    pub specular: i32,
    pub emissive: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub material: Material,
}

impl From<DrawCommand> for Triangle {
    fn from(cmd: DrawCommand) -> Self {
        let vertices = std::array::from_fn(|i| Vertex {
            x: cmd.xs[i],
            y: cmd.ys[i],
            z: cmd.zs[i],
            u: cmd.us[i],
            v: cmd.vs[i],
        });
        Self {
            vertices,
            material: Material {
                texture: cmd.texture,
                normal_map: cmd.normal_map,
                specular: cmd.specular,
                emissive: cmd.emissive,
            },
        }
    }
}

/// How resolved samples are coloured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Shading {
    /// Scale the colour of non-emissive faces by the flat lighting factor.
    /// Off by default: the factor is computed and reported but not applied.
    #[serde(default)]
    pub apply_lighting: bool,
}
