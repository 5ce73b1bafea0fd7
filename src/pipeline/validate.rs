//! Slide validation: repair loosely-typed generator output into [`Slide`]s.
//!
//! The generator is an unreliable collaborator — it returns arrays where
//! strings were asked for, nests arrays inside arrays, pads sequences past
//! the layout's capacity, and occasionally emits the closing page it was
//! told to omit. This stage absorbs all of that:
//!
//! * The whole input is rejected (→ fallback slide list) only when the root
//!   is not an array or some element has no recognisable `type` tag.
//! * Per-element repairs never reject: `highlight` collapses to a single
//!   string, sequences flatten one level and truncate to
//!   [`MAX_SEQUENCE_ITEMS`], scalars inside sequences coerce to strings.
//! * `final`-tagged elements are stripped — the closing page is synthesized
//!   exactly once by the orchestrator, never taken from the generator.
//!
//! The function is total: every input produces a usable slide list.

use crate::slide::{Slide, DEFAULT_HIGHLIGHT, MAX_SEQUENCE_ITEMS};
use serde_json::Value;
use tracing::{debug, warn};

/// Discriminators that render through the list template.
const LIST_ALIASES: &[&str] = &[
    "list",
    "platforms",
    "comparison",
    "tools",
    "trends",
    "capabilities",
];

/// Normalise a raw slide array into the closed [`Slide`] type.
///
/// Never fails: structurally invalid input degrades to
/// [`fallback_slides`] built from `fallback_title`. The output never
/// contains a `final` slide.
pub fn validate_slides(raw: &Value, fallback_title: &str) -> Vec<Slide> {
    let Some(elements) = raw.as_array() else {
        warn!("Raw slide payload is not an array; using fallback slides");
        return fallback_slides(fallback_title);
    };

    // Reject-all check first: one untagged element invalidates the batch,
    // because slide order is significant and silently dropping an element
    // would reorder the surviving pages relative to the generated narrative.
    for (i, el) in elements.iter().enumerate() {
        match el.get("type").and_then(Value::as_str) {
            Some(tag) if recognised(tag) => {}
            Some(tag) => {
                warn!("Slide {i} has unknown type {tag:?}; using fallback slides");
                return fallback_slides(fallback_title);
            }
            None => {
                warn!("Slide {i} has no string 'type' tag; using fallback slides");
                return fallback_slides(fallback_title);
            }
        }
    }

    let mut slides = Vec::with_capacity(elements.len());
    for el in elements {
        // Tag presence was checked above.
        let tag = el.get("type").and_then(Value::as_str).unwrap_or_default();
        if tag == "final" {
            debug!("Stripping generator-supplied final slide");
            continue;
        }
        slides.push(normalise_slide(tag, el));
    }
    slides
}

/// The minimal two-page slide list used when generation is unavailable or
/// the raw payload was rejected.
pub fn fallback_slides(main_title: &str) -> Vec<Slide> {
    vec![
        Slide::Title {
            title: main_title.to_string(),
            subtitle: Some("Professional Guide & Analysis".to_string()),
            highlight: "📊 Comprehensive Overview".to_string(),
        },
        Slide::List {
            title: "Key Insights".to_string(),
            subtitle: Some("Main takeaways".to_string()),
            description: Some("Essential information from the content".to_string()),
            items: vec![
                "🚀 Important point one".to_string(),
                "💡 Key insight two".to_string(),
                "📊 Critical finding three".to_string(),
            ],
        },
    ]
}

fn recognised(tag: &str) -> bool {
    matches!(tag, "title" | "stat" | "results" | "recommendations" | "cta" | "final")
        || LIST_ALIASES.contains(&tag)
}

fn normalise_slide(tag: &str, el: &Value) -> Slide {
    let title = field_str(el, "title").unwrap_or_default();
    let subtitle = field_str(el, "subtitle");

    if LIST_ALIASES.contains(&tag) {
        return Slide::List {
            title,
            subtitle,
            description: field_str(el, "description"),
            items: string_sequence(el, "items"),
        };
    }

    match tag {
        "title" => Slide::Title {
            title,
            subtitle,
            highlight: normalise_highlight(el),
        },
        "stat" => Slide::Stat {
            title,
            subtitle,
            stats: string_sequence(el, "stats"),
        },
        "results" => Slide::Results {
            title,
            subtitle,
            description: field_str(el, "description"),
            cases: string_sequence(el, "cases"),
        },
        "recommendations" => Slide::Recommendations {
            title,
            subtitle,
            description: field_str(el, "description"),
            sections: string_sequence(el, "sections"),
        },
        "cta" => Slide::Cta {
            title,
            subtitle,
            description: field_str(el, "description"),
            steps: string_sequence(el, "steps"),
            highlight: normalise_highlight(el),
        },
        // recognised() admits nothing else; "final" is filtered by the caller.
        other => {
            debug_assert!(false, "unreachable slide tag {other:?}");
            Slide::List {
                title,
                subtitle,
                description: None,
                items: Vec::new(),
            }
        }
    }
}

/// `highlight` must end up a single string: arrays collapse to their first
/// coercible element, empty arrays and missing fields become the placeholder.
fn normalise_highlight(el: &Value) -> String {
    match el.get("highlight") {
        Some(Value::Array(items)) => items
            .iter()
            .find_map(coerce_scalar)
            .unwrap_or_else(|| DEFAULT_HIGHLIGHT.to_string()),
        Some(v) => coerce_scalar(v).unwrap_or_else(|| DEFAULT_HIGHLIGHT.to_string()),
        None => DEFAULT_HIGHLIGHT.to_string(),
    }
}

/// Flatten one nesting level, coerce scalars to strings, preserve relative
/// order, cap at [`MAX_SEQUENCE_ITEMS`].
fn string_sequence(el: &Value, key: &str) -> Vec<String> {
    let Some(Value::Array(items)) = el.get(key) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Array(inner) => out.extend(inner.iter().filter_map(coerce_scalar)),
            v => out.extend(coerce_scalar(v)),
        }
    }
    out.truncate(MAX_SEQUENCE_ITEMS);
    out
}

fn field_str(el: &Value, key: &str) -> Option<String> {
    el.get(key).and_then(coerce_scalar)
}

/// Strings pass through; numbers and booleans take their display form;
/// null, objects, and (nested) arrays are dropped.
fn coerce_scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
