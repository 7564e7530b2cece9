use log::{debug, trace};
use service_abi::{Bgra, DepthBuffer, RasterBuffer};

use crate::scratch::{PixelScratch, Sample};
use crate::vector::Vec3;
use crate::{wrap_texel, RasterError, Shading, Triangle, Vertex};

const SCREEN_CENTER: f64 = 500.0;
const DEPTH_SCALE: f64 = 100.0;

/// Fixed direction the flat lighting term is measured against.
pub const LIGHT_DIRECTION: Vec3 = Vec3::new(-1.0, 0.0, 0.0);

/// Perspective-divides a view-space vertex into screen space.
///
/// `x' = 500 + x / (1 + z/100)`, truncated toward zero. Depth and texel
/// coordinates pass through unchanged.
pub fn project(vertex: Vertex) -> Sample {
    let scale = 1.0 + f64::from(vertex.z) / DEPTH_SCALE;
    Sample {
        x: (SCREEN_CENTER + f64::from(vertex.x) / scale) as i32,
        y: (SCREEN_CENTER + f64::from(vertex.y) / scale) as i32,
        z: vertex.z,
        u: vertex.u,
        v: vertex.v,
    }
}

fn lerp(a: i32, b: i32, i: i64, steps: i64) -> i32 {
    let (a, b) = (i128::from(a), i128::from(b));
    // The result lies between `a` and `b`, so it always fits back in i32.
    (a + (b - a) * i128::from(i) / i128::from(steps)) as i32
}

/// Summary of one rasterized triangle.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleReport {
    /// Sample counter after each outline edge (0→1, 1→2, 2→0).
    pub edges: [usize; 3],
    /// Total samples emitted, outline plus interior.
    pub samples: usize,
    /// Edge pixels that found a partner and spawned an interior line.
    pub paired: usize,
    /// Edge pixels left without a partner; their rows stay unfilled.
    pub unpaired: usize,
    /// Flat lighting factor in `[-1, 1]`; `None` for a zero-area face.
    pub lighting: Option<f64>,
}

/// Pixels written by [`Rasterizer::resolve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub written: usize,
    /// Samples that fell outside the buffers.
    pub clipped: usize,
}

#[derive(Clone, Copy, Debug)]
struct Surface {
    lighting: Option<f64>,
    emissive: bool,
}

/// Rasterizer owning its sample arena. Not shared across threads.
#[derive(Debug, Default)]
pub struct Rasterizer {
    scratch: PixelScratch,
    surface: Option<Surface>,
}

impl Rasterizer {
    pub fn new(scratch_capacity: usize) -> Self {
        Self {
            scratch: PixelScratch::with_capacity(scratch_capacity),
            surface: None,
        }
    }

    pub fn scratch(&self) -> &PixelScratch {
        &self.scratch
    }

    /// Drops every sample of the previous triangle.
    pub fn reset(&mut self) {
        self.scratch.reset();
        self.surface = None;
    }

    /// Appends the samples of the line `from → to`, last point exclusive, and
    /// returns the updated sample counter.
    ///
    /// The line is stepped along its longest axis among X, Y and Z; every
    /// column is interpolated with truncating integer division.
    pub fn draw_line(&mut self, from: Sample, to: Sample) -> Result<usize, RasterError> {
        let span = |a: i32, b: i32| (i64::from(b) - i64::from(a)).abs();
        let steps = span(from.x, to.x)
            .max(span(from.y, to.y))
            .max(span(from.z, to.z));
        for i in 0..steps {
            self.scratch.push(Sample {
                x: lerp(from.x, to.x, i, steps),
                y: lerp(from.y, to.y, i, steps),
                z: lerp(from.z, to.z, i, steps),
                u: lerp(from.u, to.u, i, steps),
                v: lerp(from.v, to.v, i, steps),
            })?;
        }
        Ok(self.scratch.len())
    }

    /// Rasterizes `triangle` into the scratch arena, replacing whatever the
    /// previous call left there.
    pub fn draw_triangle(&mut self, triangle: &Triangle) -> Result<TriangleReport, RasterError> {
        self.reset();
        let [a, b, c] = triangle.vertices.map(project);

        let e1 = self.draw_line(a, b)?;
        let e2 = self.draw_line(b, c)?;
        let e3 = self.draw_line(c, a)?;

        let mut paired = 0;
        let mut unpaired = 0;

        // Edge 1 pairs with edges 2 and 3.
        for i in 0..e1 {
            self.scratch.mark_matched(i);
            if self.fill_from(i, e1..e3)? {
                paired += 1;
            } else {
                unpaired += 1;
            }
        }
        // Whatever is left on edge 2 can only pair with edge 3.
        for i in e1..e2 {
            if self.scratch.is_matched(i) {
                continue;
            }
            self.scratch.mark_matched(i);
            if self.fill_from(i, e2..e3)? {
                paired += 1;
            } else {
                unpaired += 1;
            }
        }

        self.scratch.map_texels(wrap_texel);

        let lighting = flat_lighting(triangle.vertices);
        self.surface = Some(Surface {
            lighting,
            emissive: triangle.material.emissive,
        });

        let report = TriangleReport {
            edges: [e1, e2, e3],
            samples: self.scratch.len(),
            paired,
            unpaired,
            lighting,
        };
        debug!(
            "triangle: {} samples, {} paired, {} unpaired, lighting {:?}",
            report.samples, report.paired, report.unpaired, report.lighting
        );
        Ok(report)
    }

    fn fill_from(&mut self, i: usize, candidates: std::ops::Range<usize>) -> Result<bool, RasterError> {
        let Some(j) = self.scratch.find_unmatched_x(candidates, self.scratch.x(i)) else {
            return Ok(false);
        };
        self.scratch.mark_matched(j);
        let (Some(from), Some(to)) = (self.scratch.get(i), self.scratch.get(j)) else {
            return Ok(false);
        };
        self.draw_line(from, to)?;
        Ok(true)
    }

    /// Writes every sample of the last triangle into the buffers.
    ///
    /// Depth takes the sample Z unconditionally. Colour is opaque white,
    /// scaled by the clamped lighting factor when `shading` asks for it and
    /// the face is not emissive.
    pub fn resolve(
        &self,
        raster: &mut RasterBuffer,
        depth: &mut DepthBuffer,
        shading: &Shading,
    ) -> ResolveStats {
        let Some(surface) = self.surface else {
            return ResolveStats::default();
        };
        let intensity = if shading.apply_lighting && !surface.emissive {
            surface.lighting.unwrap_or(0.0).max(0.0)
        } else {
            1.0
        };
        let level = (255.0 * intensity).round() as u8;
        let colour = Bgra {
            b: level,
            g: level,
            r: level,
            a: Bgra::OPAQUE,
        };

        let mut stats = ResolveStats::default();
        for sample in self.scratch.iter() {
            if raster.set(sample.x, sample.y, colour) && depth.set(sample.x, sample.y, sample.z) {
                stats.written += 1;
            } else {
                stats.clipped += 1;
            }
        }
        trace!("resolve: {stats:?}");
        stats
    }
}

/// Flat lighting term from the view-space vertices: the unit face normal
/// dotted with the unit light direction.
fn flat_lighting(vertices: [Vertex; 3]) -> Option<f64> {
    let [p0, p1, p2] = vertices.map(|v| Vec3::new(f64::from(v.x), f64::from(v.y), f64::from(v.z)));
    let normal = (p1 - p0).cross(p2 - p1).normalize()?;
    let light = LIGHT_DIRECTION.normalize()?;
    Some(normal.dot(light))
}
