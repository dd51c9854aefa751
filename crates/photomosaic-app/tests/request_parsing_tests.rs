//! Integration tests for tile size and strategy parsing.

use photomosaic_app::{AppError, parse_strategy, parse_tile_size};
use photomosaic_mosaic::Strategy;

#[test]
fn request_parsing_tests_accepts_positive_tile_sizes() {
    assert_eq!(parse_tile_size("15").expect("15 should parse").get(), 15);
    assert_eq!(parse_tile_size(" 1 ").expect("1 should parse").get(), 1);
}

#[test]
fn request_parsing_tests_rejects_bad_tile_sizes() {
    for raw in ["0", "-3"] {
        let error = parse_tile_size(raw).expect_err("non-positive size should fail");
        assert!(matches!(error, AppError::Core(_)), "{raw}: {error}");
        assert!(error.is_client_error());
    }
    for raw in ["", "ten", "1.5"] {
        let error = parse_tile_size(raw).expect_err("non-numeric size should fail");
        assert!(matches!(error, AppError::InvalidTileSize(_)), "{raw}: {error}");
        assert!(error.is_client_error());
    }
}

#[test]
fn request_parsing_tests_maps_names_and_aliases() {
    let cases = [
        ("sequential", Strategy::Sequential),
        ("no-concurrency", Strategy::Sequential),
        ("fan-out", Strategy::FanOut),
        ("fanout-channel", Strategy::FanOut),
        ("fan-in", Strategy::FanIn),
        ("FANOUT-FANIN", Strategy::FanIn),
    ];
    for (raw, expected) in cases {
        assert_eq!(parse_strategy(raw).expect("known strategy should parse"), expected);
    }
    for strategy in Strategy::ALL {
        assert_eq!(
            parse_strategy(strategy.name()).expect("canonical name should parse"),
            strategy
        );
    }
}

#[test]
fn request_parsing_tests_rejects_unknown_strategy() {
    let error = parse_strategy("pipeline").expect_err("unknown strategy should fail");
    assert!(matches!(error, AppError::UnknownStrategy(name) if name == "pipeline"));
}
