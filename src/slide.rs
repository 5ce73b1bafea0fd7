//! The closed slide variant type.
//!
//! Everything downstream of the validator works with [`Slide`] — a strict,
//! owned representation of one carousel page. Raw, loosely-typed generator
//! output never crosses past [`crate::pipeline::validate`]; by the time a
//! slide reaches the compiler every sequence field is flat, capped, and
//! string-typed, and `highlight` is a single string.

use serde::{Deserialize, Serialize};

/// Maximum entries kept in any string-sequence field after flattening.
pub const MAX_SEQUENCE_ITEMS: usize = 6;

/// Placeholder used when a `highlight` field is missing or an empty array.
pub const DEFAULT_HIGHLIGHT: &str = "📊 Key insight";

/// Fixed outbound link on the closing page. A hard contract of the brand
/// template, not configurable.
pub const CLOSING_URL: &str = "https://www.projectworklab.com";

/// Domain line printed under the closing-page button.
pub const CLOSING_DOMAIN: &str = "ProjectWorkLab.com";

/// One carousel page, tagged by content shape.
///
/// The `list` discriminator also absorbs the `platforms`, `comparison`,
/// `tools`, `trends`, and `capabilities` aliases the generator is allowed to
/// emit — they all render identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Slide {
    /// Opening page: big title on a dark gradient with a highlight pill.
    Title {
        title: String,
        subtitle: Option<String>,
        highlight: String,
    },
    /// Grid of statistic cards.
    Stat {
        title: String,
        subtitle: Option<String>,
        stats: Vec<String>,
    },
    /// Grid of bullet items (also covers the list-family aliases).
    List {
        title: String,
        subtitle: Option<String>,
        description: Option<String>,
        items: Vec<String>,
    },
    /// Case-study cards.
    Results {
        title: String,
        subtitle: Option<String>,
        description: Option<String>,
        cases: Vec<String>,
    },
    /// Recommendation sections.
    Recommendations {
        title: String,
        subtitle: Option<String>,
        description: Option<String>,
        sections: Vec<String>,
    },
    /// Call-to-action page with numbered steps and a highlight pill.
    Cta {
        title: String,
        subtitle: Option<String>,
        description: Option<String>,
        steps: Vec<String>,
        highlight: String,
    },
    /// Full-bleed closing page. Never produced by the validator; appended
    /// exactly once by the orchestrator.
    Final {
        title: String,
        subtitle: Option<String>,
        description: Option<String>,
        cta_text: String,
    },
}

impl Slide {
    /// The discriminator string this slide serialises under.
    pub fn kind(&self) -> &'static str {
        match self {
            Slide::Title { .. } => "title",
            Slide::Stat { .. } => "stat",
            Slide::List { .. } => "list",
            Slide::Results { .. } => "results",
            Slide::Recommendations { .. } => "recommendations",
            Slide::Cta { .. } => "cta",
            Slide::Final { .. } => "final",
        }
    }

    /// True for the synthesized closing page.
    pub fn is_final(&self) -> bool {
        matches!(self, Slide::Final { .. })
    }

    /// The fixed closing page. Copy is part of the brand template and does
    /// not vary with input content.
    pub fn closing() -> Slide {
        Slide::Final {
            title: "Ready to Transform Your Business?".to_string(),
            subtitle: Some("Let's work together on your next project".to_string()),
            description: Some("Professional consulting and digital solutions".to_string()),
            cta_text: "Contact ProjectWorkLab".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_slide_is_final() {
        let s = Slide::closing();
        assert!(s.is_final());
        assert_eq!(s.kind(), "final");
    }

    #[test]
    fn kind_matches_serde_tag() {
        let s = Slide::Stat {
            title: "Numbers".into(),
            subtitle: None,
            stats: vec!["💰 40% growth".into()],
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["type"], s.kind());
    }
}
