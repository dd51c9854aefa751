//! Integration tests for end-to-end mosaic request handling.

mod common;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use photomosaic_app::{
    AppError, MosaicRequest, MosaicResponse, handle_mosaic_request, process_mosaic_request,
};
use photomosaic_core::TileSize;
use photomosaic_library::{LibraryHolder, TileLibrary};
use photomosaic_mosaic::{MosaicError, MosaicOutput, Strategy};
use photomosaic_render::SolidColorRenderer;

use common::{corner_library, png_upload, test_config};

fn request(strategy: Strategy) -> MosaicRequest {
    MosaicRequest {
        image: png_upload(24, 16),
        tile_size: Some(TileSize::new(4).expect("4 should be valid")),
        strategy,
    }
}

#[test]
fn mosaic_request_tests_single_image_strategies_return_one_mosaic() {
    let holder = LibraryHolder::new(corner_library());
    let renderer = SolidColorRenderer::new(corner_library());

    for strategy in [Strategy::Sequential, Strategy::FanIn] {
        let response = handle_mosaic_request(&holder, &renderer, &test_config(), &request(strategy))
            .expect("request should succeed");

        assert_eq!(response.strategy, strategy.name());
        assert_eq!((response.width, response.height), (24, 16));
        assert_eq!(response.tile_size, 4);
        assert_eq!(response.cells, 24);
        assert_eq!(response.skipped_cells, 0);
        assert!(response.parts.is_empty());

        let mosaic = STANDARD
            .decode(response.mosaic.as_deref().expect("mosaic should be present"))
            .expect("mosaic should be base64");
        let decoded = image::load_from_memory(&mosaic).expect("mosaic should be a JPEG");
        assert_eq!((decoded.width(), decoded.height()), (24, 16));
    }
}

#[test]
fn mosaic_request_tests_fan_out_returns_four_labelled_parts() {
    let holder = LibraryHolder::new(corner_library());
    let renderer = SolidColorRenderer::new(corner_library());

    let response =
        handle_mosaic_request(&holder, &renderer, &test_config(), &request(Strategy::FanOut))
            .expect("request should succeed");

    assert!(response.mosaic.is_none());
    let labels: Vec<&str> = response.parts.iter().map(|part| part.label.as_str()).collect();
    assert_eq!(labels, ["part1", "part2", "part3", "part4"]);
    for part in &response.parts {
        let bytes = STANDARD
            .decode(&part.jpeg_base64)
            .expect("part should be base64");
        let decoded = image::load_from_memory(&bytes).expect("part should be a JPEG");
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }
}

#[test]
fn mosaic_request_tests_original_is_reencoded_jpeg() {
    let holder = LibraryHolder::new(corner_library());
    let renderer = SolidColorRenderer::new(corner_library());

    let completed =
        process_mosaic_request(&holder, &renderer, &test_config(), &request(Strategy::Sequential))
            .expect("request should succeed");
    assert_eq!(&completed.original_jpeg[..2], &[0xFF, 0xD8]);
    assert!(matches!(completed.outcome.output, MosaicOutput::Single(_)));

    let response = completed.to_response();
    assert_eq!(
        STANDARD.decode(&response.original).expect("original should be base64"),
        completed.original_jpeg
    );
    assert_eq!(response.duration_ms, completed.duration.as_millis() as u64);
    assert!(!response.duration.is_empty());
}

#[test]
fn mosaic_request_tests_defaults_tile_size_from_config() {
    let holder = LibraryHolder::new(corner_library());
    let renderer = SolidColorRenderer::new(corner_library());
    let mut request = request(Strategy::Sequential);
    request.tile_size = None;

    let response = handle_mosaic_request(&holder, &renderer, &test_config(), &request)
        .expect("request should succeed");
    assert_eq!(response.tile_size, 15);
    // 24x16 at 15px: quadrants of 12x8 each hold one clipped cell.
    assert_eq!(response.cells, 4);
}

#[test]
fn mosaic_request_tests_reports_library_snapshot() {
    let holder = LibraryHolder::new(corner_library());
    let renderer = SolidColorRenderer::new(corner_library());

    let response =
        handle_mosaic_request(&holder, &renderer, &test_config(), &request(Strategy::FanIn))
            .expect("request should succeed");
    assert_eq!(response.library_tiles, 8);
    assert_eq!(response.library_fingerprint, corner_library().fingerprint());
}

#[test]
fn mosaic_request_tests_response_json_round_trips() {
    let holder = LibraryHolder::new(corner_library());
    let renderer = SolidColorRenderer::new(corner_library());

    let response =
        handle_mosaic_request(&holder, &renderer, &test_config(), &request(Strategy::FanOut))
            .expect("request should succeed");
    let bytes = response.to_json_bytes().expect("response should serialize");
    let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json should parse");
    assert!(value.get("mosaic").is_none());
    assert_eq!(value["parts"][3]["label"], "part4");
    assert_eq!(value["parts"][0]["quadrant"], "top_left");

    let parsed: MosaicResponse = serde_json::from_slice(&bytes).expect("response should parse");
    assert_eq!(parsed, response);
}

#[test]
fn mosaic_request_tests_undecodable_upload_is_client_error() {
    let holder = LibraryHolder::new(corner_library());
    let renderer = SolidColorRenderer::new(corner_library());
    let mut request = request(Strategy::Sequential);
    request.image = b"not an image".to_vec();

    let error = handle_mosaic_request(&holder, &renderer, &test_config(), &request)
        .expect_err("garbage upload should fail");
    assert!(matches!(error, AppError::Decode(_)));
    assert!(error.is_client_error());
}

#[test]
fn mosaic_request_tests_empty_library_is_client_error() {
    let holder = LibraryHolder::new(TileLibrary::default());
    let renderer = SolidColorRenderer::default();

    for strategy in Strategy::ALL {
        let error = handle_mosaic_request(&holder, &renderer, &test_config(), &request(strategy))
            .expect_err("empty library should fail");
        assert!(
            matches!(error, AppError::Mosaic(MosaicError::EmptyLibrary)),
            "{strategy}: {error}"
        );
        assert!(error.is_client_error());
    }
}

#[test]
fn mosaic_request_tests_uses_snapshot_published_before_request() {
    let holder = LibraryHolder::new(TileLibrary::default());
    let renderer = SolidColorRenderer::new(corner_library());
    holder
        .replace(corner_library())
        .expect("replace should succeed");

    let response =
        handle_mosaic_request(&holder, &renderer, &test_config(), &request(Strategy::Sequential))
            .expect("request should see the published library");
    assert_eq!(response.library_tiles, 8);
}
