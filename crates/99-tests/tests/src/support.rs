use runtime_native::SessionConfig;
use service_abi::{Bgra, Dimensions, DrawCommand, Rgb};
use transport::ReadSemantics;

pub const DIMS: Dimensions = Dimensions::new(64, 64);
pub const WHITE: Bgra = Bgra {
    b: 255,
    g: 255,
    r: 255,
    a: Bgra::OPAQUE,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config(triangulators: u32, read_semantics: ReadSemantics) -> SessionConfig {
    init_logging();
    SessionConfig {
        dims: DIMS,
        triangulators,
        read_semantics,
        ..SessionConfig::default()
    }
}

pub fn black() -> Bgra {
    Rgb::default().into()
}

/// Flat right triangle whose screen-space corner sits at `(x, y)` with legs
/// of `size` pixels along +X and +Y.
pub fn corner_triangle(x: i32, y: i32, size: i32) -> DrawCommand {
    let (x, y) = (x - 500, y - 500);
    DrawCommand {
        xs: [x, x + size, x],
        ys: [y, y, y + size],
        zs: [0; 3],
        us: [0, 250, -30],
        vs: [0, 0, 180],
        texture: "stone".into(),
        normal_map: "none".into(),
        specular: 4,
        emissive: false,
    }
}
