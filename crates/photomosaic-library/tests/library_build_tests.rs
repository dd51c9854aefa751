//! Tests building a tile library from an on-disk tile directory.

use std::path::Path;

use image::{Rgb, RgbImage};
use photomosaic_core::AverageColor;
use photomosaic_library::{LibraryError, LibraryHolder, TileLibrary};

fn write_solid_tile(dir: &Path, name: &str, rgb: [u8; 3]) {
    RgbImage::from_pixel(4, 4, Rgb(rgb))
        .save(dir.join(name))
        .expect("fixture tile should be written");
}

#[test]
fn library_build_tests_index_decodable_tiles_and_skip_the_rest() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    write_solid_tile(dir.path(), "b-white.png", [255, 255, 255]);
    write_solid_tile(dir.path(), "a-black.png", [0, 0, 0]);
    std::fs::write(dir.path().join("c-broken.jpg"), b"not an image").expect("fixture write");

    let library = TileLibrary::build(dir.path()).expect("library should build");

    assert_eq!(library.len(), 2);
    assert_eq!(library.skipped_files(), 1);
    assert_eq!(library.entries()[0].key, dir.path().join("a-black.png"));
    assert_eq!(
        library.color_of(&dir.path().join("b-white.png")),
        Some(AverageColor([255.0, 255.0, 255.0]))
    );
}

#[test]
fn library_build_tests_empty_directory_yields_empty_library() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let library = TileLibrary::build(dir.path()).expect("library should build");

    assert!(library.is_empty());
    assert!(library.nearest(&AverageColor::from_rgb8(9, 9, 9)).is_none());
}

#[test]
fn library_build_tests_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let missing = dir.path().join("missing");

    assert!(matches!(
        TileLibrary::build(&missing),
        Err(LibraryError::ReadDir { .. })
    ));
}

#[test]
fn library_build_tests_background_reload_publishes_new_snapshot() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    write_solid_tile(dir.path(), "red.png", [255, 0, 0]);

    let holder = LibraryHolder::default();
    let before = holder.snapshot().expect("snapshot should be readable");

    let tiles = holder
        .spawn_reload(dir.path())
        .expect("reload thread should spawn")
        .join()
        .expect("reload thread should not panic")
        .expect("reload should succeed");

    assert_eq!(tiles, 1);
    assert!(before.is_empty());
    assert_eq!(holder.snapshot().expect("snapshot").len(), 1);
}
