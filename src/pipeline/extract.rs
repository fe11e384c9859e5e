//! Extraction: recover candidate pixel records from free-form model output.
//!
//! Models are told to answer with a bare JSON array and frequently do not:
//! they wrap it in ```` ```json ```` fences, add a sentence before or after,
//! leave trailing commas, get cut off by the token limit, or drop the array
//! syntax altogether. Extraction therefore runs an ordered chain of pure
//! strategies and stops at the first one that recovers a structure:
//!
//! 1. [`Strategy::FencedDirect`] — strip fence markers, parse everything
//! 2. [`Strategy::BracketSpan`]  — parse first `[` .. last `]`, repairing once
//! 3. [`Strategy::WholeText`]    — parse the untouched raw text
//! 4. [`Strategy::PatternScan`]  — regex scan for `hexCode`/`column`/`row` triples
//!
//! An empty array is a success. Only when every strategy comes back empty
//! handed does extraction fail, and that is the single fatal outcome of the
//! whole pipeline.
//!
//! Extraction does not judge the records it finds: field types, ranges and
//! colors are the sanitizer's job.

use crate::error::PixelGenError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// A loosely-typed record as found in the model output.
///
/// Every field is optional and untyped; JSON `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePixel {
    pub hex_code: Option<Value>,
    pub column: Option<Value>,
    pub row: Option<Value>,
}

impl From<Value> for CandidatePixel {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) => Self {
                hex_code: take_field(&mut map, "hexCode"),
                column: take_field(&mut map, "column"),
                row: take_field(&mut map, "row"),
            },
            // Numbers, strings or nested arrays inside the list: keep the slot
            // so indices line up in logs; the sanitizer drops it.
            _ => Self::default(),
        }
    }
}

fn take_field(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}

/// One extraction strategy. Tried in [`Strategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FencedDirect,
    BracketSpan,
    WholeText,
    PatternScan,
}

impl Strategy {
    /// Evaluation order; the first strategy returning `Some` wins.
    pub const ORDER: [Strategy; 4] = [
        Strategy::FencedDirect,
        Strategy::BracketSpan,
        Strategy::WholeText,
        Strategy::PatternScan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::FencedDirect => "fenced_direct",
            Strategy::BracketSpan => "bracket_span",
            Strategy::WholeText => "whole_text",
            Strategy::PatternScan => "pattern_scan",
        }
    }

    /// Run this strategy alone against `raw`.
    pub fn apply(self, raw: &str) -> Option<Extraction> {
        let (items, repaired) = match self {
            Strategy::FencedDirect => (fenced_direct(raw)?, false),
            Strategy::BracketSpan => bracket_span(raw)?,
            Strategy::WholeText => (whole_text(raw)?, false),
            Strategy::PatternScan => {
                return pattern_scan(raw).map(|candidates| Extraction {
                    candidates,
                    strategy: self,
                    repaired: false,
                })
            }
        };
        Some(Extraction {
            candidates: items.into_iter().map(CandidatePixel::from).collect(),
            strategy: self,
            repaired,
        })
    }
}

/// Candidate records plus how they were found.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub candidates: Vec<CandidatePixel>,
    pub strategy: Strategy,
    /// True when [`Strategy::BracketSpan`] only parsed after textual repairs.
    pub repaired: bool,
}

/// Recover candidate records from raw model output.
///
/// # Errors
/// [`PixelGenError::ExtractionFailed`] when no strategy recovers anything.
pub fn extract(raw: &str) -> Result<Extraction, PixelGenError> {
    for strategy in Strategy::ORDER {
        match strategy.apply(raw) {
            Some(extraction) => {
                debug!(
                    "Extraction: {} recovered {} candidates{}",
                    strategy.name(),
                    extraction.candidates.len(),
                    if extraction.repaired { " after repair" } else { "" }
                );
                return Ok(extraction);
            }
            None => debug!("Extraction: {} found nothing", strategy.name()),
        }
    }

    Err(PixelGenError::ExtractionFailed {
        strategies_tried: Strategy::ORDER.len(),
    })
}

// ── Shared: parse an array-like JSON value ──────────────────────────────────

/// Parse `text` as a JSON array, or as an object wrapping one under `pixels`.
fn parse_pixel_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("pixels") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

// ── Strategy 1: strip fences, parse everything ──────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());

/// Remove every code-fence marker and surrounding whitespace.
pub fn strip_fences(raw: &str) -> String {
    RE_FENCE.replace_all(raw, "").trim().to_string()
}

fn fenced_direct(raw: &str) -> Option<Vec<Value>> {
    parse_pixel_array(&strip_fences(raw))
}

// ── Strategy 2: first '[' to last ']', with one repair pass ────────────────

fn bracket_span(raw: &str) -> Option<(Vec<Value>, bool)> {
    let cleaned = strip_fences(raw);
    let start = cleaned.find('[')?;
    let end = cleaned.rfind(']')?;
    if end <= start {
        return None;
    }
    let span = &cleaned[start..=end];

    if let Some(items) = parse_pixel_array(span) {
        return Some((items, false));
    }
    parse_pixel_array(&repair_json(span)).map(|items| (items, true))
}

static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([\]}])").unwrap());
static RE_TRAILING_COMMA_AT_END: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*$").unwrap());
static RE_REPEATED_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",(?:\s*,)+").unwrap());

/// Textual repairs for the usual near-JSON mistakes, applied in a fixed order.
///
/// Trailing commas are removed a second time at the end: `[a,,]` still reads
/// `[a,]` after the first pass.
pub fn repair_json(text: &str) -> String {
    let s = RE_TRAILING_COMMA.replace_all(text, "$1");
    let s = RE_TRAILING_COMMA_AT_END.replace_all(&s, "");
    let s = s.replace(['\n', '\r', '\t'], "");
    let s = RE_REPEATED_COMMAS.replace_all(&s, ",");
    RE_TRAILING_COMMA.replace_all(&s, "$1").into_owned()
}

// ── Strategy 3: the raw text, untouched ─────────────────────────────────────

fn whole_text(raw: &str) -> Option<Vec<Value>> {
    parse_pixel_array(raw)
}

// ── Strategy 4: pattern scan ────────────────────────────────────────────────
//
// Matches three adjacent `key: value` pairs whose keys are hexCode, column and
// row in any order. Keys may be quoted or bare. Values are captured verbatim
// and typed later by the sanitizer.

const FIELD: &str = r#""?\b(hexCode|column|row)\b"?\s*:\s*("[^"]*"|-?\d+(?:\.\d+)?)"#;

static RE_TRIPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{FIELD}\s*,\s*{FIELD}\s*,\s*{FIELD}")).unwrap());

// `(7, 7), #FF0000`: the one-pixel-per-line CSV form some prompts ask for.
static RE_CSV_TUPLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)\s*,?\s*(#[0-9A-Fa-f]{3,8})\b").unwrap()
});

fn pattern_scan(raw: &str) -> Option<Vec<CandidatePixel>> {
    let triples: Vec<CandidatePixel> = RE_TRIPLE
        .captures_iter(raw)
        .filter_map(|caps| {
            let mut candidate = CandidatePixel::default();
            for i in 0..3 {
                let slot = match &caps[1 + 2 * i] {
                    "hexCode" => &mut candidate.hex_code,
                    "column" => &mut candidate.column,
                    _ => &mut candidate.row,
                };
                if slot.is_some() {
                    // Same key twice: not a pixel triple.
                    return None;
                }
                *slot = Some(scalar(&caps[2 + 2 * i]));
            }
            Some(candidate)
        })
        .collect();

    if !triples.is_empty() {
        return Some(triples);
    }

    let tuples: Vec<CandidatePixel> = RE_CSV_TUPLE
        .captures_iter(raw)
        .map(|caps| CandidatePixel {
            hex_code: Some(Value::String(caps[3].to_string())),
            column: Some(scalar(&caps[1])),
            row: Some(scalar(&caps[2])),
        })
        .collect();

    (!tuples.is_empty()).then_some(tuples)
}

/// Type a captured token: quoted text becomes a string, anything else a number.
fn scalar(token: &str) -> Value {
    if let Some(inner) = token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return Value::String(inner.to_string());
    }
    serde_json::from_str::<Value>(token).unwrap_or_else(|_| Value::String(token.to_string()))
}

// ── Tests ────────────────────────────────────────────────────────────────────
