//! Offline pipeline tests: saved model answers in, validated grids out.
//!
//! No provider or API key is needed; everything goes through
//! `process_response`, the same path the CLI's `--from-response` takes.

use pixelprompt::pipeline::sanitize::{clamp_coordinate, sanitize_record};
use pixelprompt::{
    extract, process_response, sanitize, CandidatePixel, DropReason, ErrorKind, GenerationConfig,
    GenerationOutput, PixelGenError, Strategy, ValidPixel, GRID_SIZE,
};
use serde_json::{json, Value};

fn run(raw: &str) -> Result<GenerationOutput, PixelGenError> {
    process_response(raw, &GenerationConfig::default())
}

fn only_pixel(out: &GenerationOutput) -> &ValidPixel {
    assert_eq!(out.pixels.len(), 1, "expected one pixel, got {:?}", out.pixels);
    &out.pixels[0]
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn scenario_fenced_array() {
    let out = run("```json\n[{\"hexCode\":\"#FF0000\",\"column\":7,\"row\":7}]\n```").unwrap();
    assert_eq!(only_pixel(&out), &ValidPixel::new("#FF0000", 7, 7));
    assert_eq!(out.stats.strategy, Some(Strategy::FencedDirect));
    assert_eq!(out.grid.get(7, 7), Some("#FF0000"));
}

#[test]
fn scenario_background_dropped_and_coordinates_clamped() {
    let raw = r##"[{"hexCode":"#FFFFFF","column":0,"row":0},{"hexCode":"#00FF00","column":20,"row":-5}]"##;
    let out = run(raw).unwrap();
    assert_eq!(only_pixel(&out), &ValidPixel::new("#00FF00", 15, 0));
    assert!(!out.grid.is_set(0, 0));
    assert_eq!(out.stats.dropped, 1);
}

#[test]
fn scenario_pattern_scan_on_prose() {
    let raw = "Here you go:\n\"hexCode\": \"#123456\", \"column\": 3, \"row\": 4\nhope it helps!";
    let out = run(raw).unwrap();
    assert_eq!(only_pixel(&out), &ValidPixel::new("#123456", 3, 4));
    assert_eq!(out.stats.strategy, Some(Strategy::PatternScan));
}

#[test]
fn scenario_refusal_is_extraction_failure() {
    let err = run("I cannot help with that.").unwrap_err();
    assert!(matches!(err, PixelGenError::ExtractionFailed { strategies_tried: 4 }));
    assert_eq!(err.kind(), ErrorKind::Extraction);
}

#[test]
fn scenario_later_record_overwrites_earlier() {
    let raw = r##"[{"hexCode":"#AAAAAA","column":1,"row":1},{"hexCode":"#BBBBBB","column":1,"row":1}]"##;
    let out = run(raw).unwrap();
    assert_eq!(only_pixel(&out), &ValidPixel::new("#BBBBBB", 1, 1));
    assert_eq!(out.stats.overwritten, 1);
}

#[test]
fn scenario_pixels_wrapper_object() {
    let out = run(r##"{"pixels":[{"hexCode":"#112233","column":2,"row":3}]}"##).unwrap();
    assert_eq!(only_pixel(&out), &ValidPixel::new("#112233", 2, 3));
}

#[test]
fn scenario_csv_tuples() {
    let raw = "(7, 7), #FF0000\n(8, 7), #00FF00\n(0, 0), #FFFFFF\n";
    let out = run(raw).unwrap();
    assert_eq!(out.stats.strategy, Some(Strategy::PatternScan));
    assert_eq!(
        out.pixels,
        vec![
            ValidPixel::new("#FF0000", 7, 7),
            ValidPixel::new("#00FF00", 8, 7)
        ]
    );
}

#[test]
fn scenario_empty_array_warns_without_failing() {
    let out = run("[]").unwrap();
    assert!(out.pixels.is_empty());
    assert_eq!(out.grid.set_count(), 0);
    let warning = out.warning.expect("empty result must warn");
    assert!(warning.contains('0'), "warning should report the count: {warning}");
}

// ── Recovery paths ───────────────────────────────────────────────────────────

#[test]
fn chatty_answer_with_trailing_commas_is_repaired() {
    let raw = "Sure! Here's a heart:\n[\n  {\"hexCode\": \"#E00000\", \"column\": 5, \"row\": 4},\n  {\"hexCode\": \"#E00000\", \"column\": 6, \"row\": 4},\n]\nLet me know!";
    let out = run(raw).unwrap();
    assert_eq!(out.stats.strategy, Some(Strategy::BracketSpan));
    assert!(out.stats.repaired);
    assert_eq!(out.pixels.len(), 2);
}

#[test]
fn truncated_answer_keeps_complete_records() {
    let raw = r##"[{"hexCode":"#FF0000","column":1,"row":1},{"hexCode":"#00FF00","column":2,"row":2},{"hexCode":"#00"##;
    let out = run(raw).unwrap();
    assert_eq!(out.stats.strategy, Some(Strategy::PatternScan));
    assert_eq!(out.pixels.len(), 2);
}

#[test]
fn bare_keys_in_any_order_are_scanned() {
    let raw = "row: 2, hexCode: \"#0000FF\", column: 9 and then column: 1, row: 1, hexCode: \"#00FFFF\"";
    let out = run(raw).unwrap();
    assert_eq!(
        out.pixels,
        vec![
            ValidPixel::new("#0000FF", 9, 2),
            ValidPixel::new("#00FFFF", 1, 1)
        ]
    );
}

#[test]
fn fallback_order_prefers_earliest_strategy() {
    // Valid JSON that also contains scannable triples: the first strategy wins.
    let raw = r##"[{"hexCode":"#010101","column":0,"row":0}]"##;
    assert_eq!(extract(raw).unwrap().strategy, Strategy::FencedDirect);

    // Each strategy alone, in order, on its own kind of input.
    for (strategy, raw) in [
        (Strategy::FencedDirect, "```\n[]\n```"),
        (Strategy::BracketSpan, "art: [] done"),
        (Strategy::PatternScan, "hexCode: \"#123456\", column: 0, row: 0"),
    ] {
        assert_eq!(extract(raw).unwrap().strategy, strategy, "input: {raw:?}");
    }
}

#[test]
fn malformed_records_are_dropped_not_fatal() {
    let raw = json!([
        {"hexCode": "#123456", "column": 1, "row": 1},
        {"hexCode": 123456, "column": 1, "row": 2},
        {"hexCode": "#654321", "column": "3", "row": 3},
        {"column": 4, "row": 4},
        {"hexCode": "red", "column": 5, "row": 5},
        {"hexCode": " #fff ", "column": 6, "row": 6},
        "not an object",
        null
    ])
    .to_string();
    let out = run(&raw).unwrap();
    assert_eq!(only_pixel(&out), &ValidPixel::new("#123456", 1, 1));
    assert_eq!(out.stats.candidates, 8);
    assert_eq!(out.stats.dropped, 7);
}

#[test]
fn output_serializes_with_camel_case_hex() {
    let out = run(r##"[{"hexCode":"#ABCDEF","column":0,"row":15}]"##).unwrap();
    let value: Value = serde_json::to_value(&out).unwrap();
    assert_eq!(value["pixels"][0]["hexCode"], "#ABCDEF");
    assert_eq!(value["pixels"][0]["row"], 15);
    assert!(value["warning"].is_string());
}

#[test]
fn min_pixels_zero_disables_warning() {
    let config = GenerationConfig::builder().min_pixels(0).build().unwrap();
    let out = process_response("[]", &config).unwrap();
    assert!(out.warning.is_none());
}

// ── Properties ───────────────────────────────────────────────────────────────

#[test]
fn clamping_is_idempotent_and_bounded() {
    for v in [-1e9, -16.0, -0.5, 0.0, 0.9, 7.5, 15.0, 15.99, 16.0, 1e9] {
        let once = clamp_coordinate(v);
        assert!((once as usize) < GRID_SIZE);
        assert_eq!(clamp_coordinate(once as f64), once, "value {v}");
    }
}

#[test]
fn background_never_survives_in_any_case() {
    for hex in ["#FFFFFF", "#ffffff", "#FfFfFf", " #FFFFFF ", "#FFF", "#fff"] {
        let candidate = CandidatePixel::from(json!({"hexCode": hex, "column": 0, "row": 0}));
        assert_eq!(sanitize_record(&candidate), Err(DropReason::Background), "{hex:?}");
    }
}

#[test]
fn sanitize_is_total_on_arbitrary_values() {
    let values = vec![
        json!(null),
        json!(true),
        json!(1.5),
        json!("text"),
        json!([]),
        json!({}),
        json!({"hexCode": null, "column": null, "row": null}),
        json!({"hexCode": "#123456", "column": 1e300, "row": -1e300}),
        json!({"hexCode": "#123456", "column": 2.9, "row": -0.1}),
    ];
    let candidates: Vec<CandidatePixel> = values.into_iter().map(CandidatePixel::from).collect();
    let valid = sanitize(&candidates);
    assert_eq!(
        valid,
        vec![
            ValidPixel::new("#123456", 15, 0),
            ValidPixel::new("#123456", 2, 0)
        ]
    );
}

#[test]
fn grid_and_pixel_list_always_agree() {
    let raw = json!((0..40)
        .map(|i| json!({"hexCode": format!("#{:02X}0000", i * 5), "column": i % 20, "row": i / 3}))
        .collect::<Vec<_>>())
    .to_string();
    let out = run(&raw).unwrap();

    assert_eq!(out.grid.set_count(), out.pixels.len());
    for px in &out.pixels {
        assert_eq!(
            out.grid.get(px.row as usize, px.column as usize),
            Some(px.hex_code.as_str())
        );
    }
    assert_eq!(
        out.stats.candidates,
        out.stats.dropped + out.stats.overwritten + out.stats.pixels
    );
}
