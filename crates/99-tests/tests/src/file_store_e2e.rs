use std::sync::Arc;

use runtime_native::Session;
use service_abi::Rgb;
use transport::{FileStore, ReadSemantics, RecordId, StoreHandle};

use crate::support::{config, corner_triangle, WHITE};

fn session_on_disk(dir: &tempfile::TempDir, semantics: ReadSemantics) -> Session {
    let store: StoreHandle = Arc::new(FileStore::open(dir.path(), semantics).unwrap());
    Session::start_with_store(config(2, semantics), store).unwrap()
}

#[test]
fn session_runs_over_record_files() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_on_disk(&dir, ReadSemantics::Consume);
    let client = session.client();
    client.clear_raster(Rgb::new(0, 0, 255)).unwrap();
    client.draw(&corner_triangle(10, 10, 16)).unwrap();
    client.draw(&corner_triangle(40, 10, 16)).unwrap();

    let raster = client.raster().unwrap();
    assert_eq!(raster.get(12, 12), Some(WHITE));
    assert_eq!(raster.get(42, 12), Some(WHITE));
    assert_eq!(raster.get(1, 60), Some(Rgb::new(0, 0, 255).into()));
    session.shutdown().unwrap();

    assert!(dir.path().join("rastermatrix").is_file());
    assert!(dir.path().join("depthmatrix").is_file());
    assert!(dir.path().join("T2").is_dir());
    // Consumed command records leave nothing behind.
    assert!(!dir.path().join("driver_in").exists());
}

#[test]
fn retained_records_hold_the_handled_marker() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_on_disk(&dir, ReadSemantics::Retain);
    let client = session.client();
    client.draw(&corner_triangle(4, 4, 8)).unwrap();
    client.clear_depth(12).unwrap();
    assert_eq!(client.depth().unwrap().get(30, 30), Some(12));
    session.shutdown().unwrap();

    let store = FileStore::open(dir.path(), ReadSemantics::Retain).unwrap();
    let driver_in = std::fs::read(store.path(RecordId::driver_in())).unwrap();
    assert_eq!(driver_in, b"0 ");
    let worker_in = std::fs::read(store.path(RecordId::triangulator_in(1))).unwrap();
    assert_eq!(worker_in, b"0 ");
}
