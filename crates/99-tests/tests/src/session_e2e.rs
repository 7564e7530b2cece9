use runtime_native::Session;
use service_abi::{Rgb, DrawCommand};
use transport::{Event, EventKind, ReadSemantics};

use crate::support::{black, config, corner_triangle, DIMS, WHITE};

#[test]
fn draw_lands_in_both_matrices() {
    let session = Session::start_in_memory(config(1, ReadSemantics::Consume)).unwrap();
    let client = session.client();
    client.clear_depth(50).unwrap();
    client.draw(&corner_triangle(4, 4, 12)).unwrap();

    let raster = client.raster().unwrap();
    let depth = client.depth().unwrap();
    assert_eq!(raster.get(4, 4), Some(WHITE));
    assert_eq!(raster.get(6, 6), Some(WHITE));
    assert_eq!(raster.get(40, 40), Some(black()));
    assert_eq!(depth.get(6, 6), Some(0));
    assert_eq!(depth.get(40, 40), Some(50));

    let exits = session.shutdown().unwrap();
    assert!(exits.iter().all(|exit| exit.is_clean()));
}

#[test]
fn draws_rotate_over_every_triangulator() {
    let session = Session::start_in_memory(config(3, ReadSemantics::Consume)).unwrap();
    let client = session.client();
    let corners = [(2, 2), (30, 2), (2, 30), (30, 30)];
    for (x, y) in corners {
        client.draw(&corner_triangle(x, y, 10)).unwrap();
    }
    let raster = client.raster().unwrap();
    for (x, y) in corners {
        assert_eq!(raster.get(x + 1, y + 1), Some(WHITE), "corner ({x}, {y})");
    }

    let exits = session.shutdown().unwrap();
    let mut names: Vec<_> = exits.iter().map(|exit| exit.name.clone()).collect();
    names.sort();
    assert_eq!(names, ["T1", "T2", "T3", "driver"]);
}

#[test]
fn clear_after_draw_wipes_the_triangle() {
    let session = Session::start_in_memory(config(2, ReadSemantics::Consume)).unwrap();
    let client = session.client();
    client.draw(&corner_triangle(8, 8, 20)).unwrap();
    client.clear_raster(Rgb::new(10, 20, 30)).unwrap();
    let raster = client.raster().unwrap();
    let expected = Rgb::new(10, 20, 30).into();
    for y in 0..DIMS.height as i32 {
        for x in 0..DIMS.width as i32 {
            assert_eq!(raster.get(x, y), Some(expected));
        }
    }
    session.shutdown().unwrap();
}

#[test]
fn malformed_commands_are_still_acknowledged() {
    let session = Session::start_in_memory(config(1, ReadSemantics::Consume)).unwrap();
    let client = session.client();
    client
        .submit(&Event::new(EventKind::ClearRaster, ["300", "0", "0"]).unwrap())
        .unwrap();
    let mut draw = corner_triangle(4, 4, 8).to_event().unwrap().params().to_vec();
    draw[18] = "maybe".into();
    client
        .submit(&Event::new(EventKind::Draw, draw).unwrap())
        .unwrap();
    assert!(client
        .raster()
        .unwrap()
        .as_bytes()
        .chunks_exact(4)
        .all(|px| px == black().to_bytes()));
    session.shutdown().unwrap();
}

#[test]
fn degenerate_and_offscreen_triangles_complete() {
    let session = Session::start_in_memory(config(1, ReadSemantics::Consume)).unwrap();
    let client = session.client();
    let point = DrawCommand {
        xs: [-490; 3],
        ys: [-490; 3],
        ..corner_triangle(0, 0, 0)
    };
    client.draw(&point).unwrap();
    client.draw(&corner_triangle(2000, 2000, 30)).unwrap();
    client.draw(&corner_triangle(-40, 10, 50)).unwrap();
    // Only the visible part of the last triangle was written.
    assert_eq!(client.raster().unwrap().get(0, 11), Some(WHITE));
    session.shutdown().unwrap();
}

#[test]
fn retained_reads_run_the_same_protocol() {
    let session = Session::start_in_memory(config(2, ReadSemantics::Retain)).unwrap();
    let client = session.client();
    client.clear_raster(Rgb::new(1, 2, 3)).unwrap();
    client.draw(&corner_triangle(4, 4, 12)).unwrap();
    client.draw(&corner_triangle(30, 30, 12)).unwrap();
    client.clear_depth(-9).unwrap();

    let raster = client.raster().unwrap();
    assert_eq!(raster.get(5, 5), Some(WHITE));
    assert_eq!(raster.get(31, 31), Some(WHITE));
    assert_eq!(raster.get(60, 2), Some(Rgb::new(1, 2, 3).into()));
    assert!(client
        .depth()
        .unwrap()
        .as_bytes()
        .chunks_exact(4)
        .all(|d| d == (-9i32).to_le_bytes()));

    let exits = session.shutdown().unwrap();
    assert_eq!(exits.len(), 3);
    assert!(exits.iter().all(|exit| exit.is_clean()));
}

#[test]
fn cancel_releases_a_session_mid_flight() {
    let session = Session::start_in_memory(config(2, ReadSemantics::Consume)).unwrap();
    session.client().draw(&corner_triangle(1, 1, 5)).unwrap();
    session.cancel();
    let exits = session.join().unwrap();
    assert_eq!(exits.len(), 3);
    assert!(exits.iter().all(|exit| !exit.is_clean()));
}
