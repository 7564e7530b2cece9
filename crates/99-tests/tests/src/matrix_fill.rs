use runtime_native::{Session, SessionConfig};
use service_abi::Rgb;

use crate::support::init_logging;

#[test]
fn full_size_clears_are_byte_exact() {
    init_logging();
    let session = Session::start_in_memory(SessionConfig::default()).unwrap();
    let client = session.client();
    client.clear_raster(Rgb::new(255, 127, 0)).unwrap();
    client.clear_depth(1000).unwrap();

    let raster = client.raster().unwrap().into_bytes();
    assert_eq!(raster.len(), 4_000_000);
    assert!(raster.chunks_exact(4).all(|px| px == [0, 127, 255, 255]));

    let depth = client.depth().unwrap().into_bytes();
    assert_eq!(depth.len(), 4_000_000);
    assert!(depth.chunks_exact(4).all(|d| d == [0xE8, 0x03, 0, 0]));
    session.shutdown().unwrap();
}

#[test]
fn configured_initial_values_seed_the_matrices() {
    init_logging();
    let config = SessionConfig::from_toml_str(
        r#"
        initial_depth = -2
        dims = { width = 16, height = 4 }
        initial_color = { r = 9, g = 0, b = 0 }
        "#,
    )
    .unwrap();
    let session = Session::start_in_memory(config).unwrap();
    let client = session.client();
    assert!(client
        .raster()
        .unwrap()
        .as_bytes()
        .chunks_exact(4)
        .all(|px| px == [0, 0, 9, 255]));
    assert_eq!(client.depth().unwrap().get(15, 3), Some(-2));
    session.shutdown().unwrap();
}
