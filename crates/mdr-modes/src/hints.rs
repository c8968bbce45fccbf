//! Layout flags read from the user's description.
//!
//! All free-text heuristics live here; the normalizer only ever sees the
//! resulting booleans.

use mdr_core::NormalizeOptions;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn two_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:two|2|pair\s+of)\s+(?:[a-z-]+\s+)?(?:rect(?:angle)?s?|squares?|circles?|ellipses?|ovals?|triangles?|polygons?|parallelograms?|trapezoids?|shapes?|figures?)\b",
        )
        .expect("pair regex must compile")
    })
}

fn touching_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:touch(?:es|ing)?|overlap(?:s|ping)?|shar(?:e|es|ed|ing)|adjacent|inscribed|circumscribed|inside|within|tangent|intersect(?:s|ing)?|nested|common\s+(?:side|edge|vertex))\b",
        )
        .expect("touching regex must compile")
    })
}

/// Layout intent detected in a description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutHints {
    /// Exactly two instances of one shape kind were asked for.
    pub wants_two: bool,
    /// The user allowed shapes to touch, overlap, or share edges.
    pub allow_touching: bool,
}

impl LayoutHints {
    pub fn from_description(text: &str) -> Self {
        let hints = Self {
            wants_two: two_re().is_match(text),
            allow_touching: touching_re().is_match(text),
        };
        log::debug!("layout hints {:?}", hints);
        hints
    }

    /// Write the flags into normalize options, keeping everything else.
    pub fn apply(&self, options: &NormalizeOptions) -> NormalizeOptions {
        NormalizeOptions {
            allow_touching: self.allow_touching,
            wants_two: self.wants_two,
            ..options.clone()
        }
    }
}
