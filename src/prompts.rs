//! Prompts for the generative slide collaborator.
//!
//! Centralising every prompt here keeps the structural slide-list contract in
//! one place and lets unit tests inspect it without a live API call. Nothing
//! in the rest of the crate depends on the prompt wording — only on the JSON
//! shape it demands, which the validator re-checks anyway.

/// Fixed system role for slide generation.
pub const SYSTEM_PROMPT: &str = "You are a LinkedIn content expert who creates comprehensive, \
detailed carousel slides. Always generate exactly 7-8 content slides with substantial, \
professional content.";

/// Marker appended to the source text when it was cut to fit the prompt budget.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated for processing...]";

/// Build the user prompt embedding the (already truncated) source text.
///
/// The embedded schema is the discriminated slide-list contract: an array of
/// objects tagged by `type`, with `highlight` as a single string and
/// `items`/`stats`/`cases` as flat string arrays. The closing page is
/// explicitly excluded — the orchestrator appends it itself.
pub fn slide_prompt(source_text: &str) -> String {
    format!(
        r#"Create exactly 7-8 comprehensive LinkedIn carousel slides from this markdown content. Each slide should be detailed, informative, and engaging for business professionals.

IMPORTANT: Return ONLY valid JSON with proper string formatting (no nested arrays). DO NOT include a final/CTA slide - we'll add that separately.

YOU MUST GENERATE EXACTLY 7-8 CONTENT SLIDES. Here's the structure to follow:

[
  {{"type": "title", "title": "Main Title", "subtitle": "Comprehensive subtitle", "highlight": "📊 Single key insight with context"}},
  {{"type": "stat", "title": "Key Statistics & Market Data", "subtitle": "Numbers that matter", "stats": ["💰 Specific statistic with full context and business impact (40-60 words)", "📈 Detailed metric with background and trend analysis (40-60 words)"]}},
  {{"type": "list", "title": "Core Concepts & Fundamentals", "subtitle": "Essential knowledge", "description": "Foundational understanding and key principles", "items": ["🚀 Comprehensive point with details and context (30-50 words)", "💡 In-depth insight with explanation and implications (30-50 words)"]}},
  {{"type": "results", "title": "Case Studies & Success Stories", "subtitle": "Proven outcomes", "description": "Real-world examples and their significance", "cases": ["🏢 Detailed company case study with specific results and metrics (50-70 words)"]}},
  {{"type": "recommendations", "title": "Strategic Recommendations", "subtitle": "Expert guidance", "description": "Forward-looking strategic direction", "sections": ["🎯 Strategic recommendation with implementation timeline (35-55 words)"]}}
]

CRITICAL REQUIREMENTS:
- MUST generate exactly 7-8 content slides (excluding the final CTA slide we add separately)
- "highlight" must be a SINGLE STRING, not an array
- "items", "stats", "cases", "sections" must be flat arrays of strings
- Each bullet point should be 30-70 words with comprehensive context
- Include specific numbers, percentages, and concrete examples where available
- Use diverse, relevant emojis (no repetition within the same slide)
- DO NOT include a final/CTA slide in your response

Content to analyze:
{source_text}"#
    )
}

/// Truncate source text to the prompt character budget, appending the marker
/// when a cut was made. The cut respects UTF-8 boundaries.
pub fn truncate_source(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}{TRUNCATION_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_source() {
        let p = slide_prompt("## Quarterly numbers");
        assert!(p.contains("## Quarterly numbers"));
        assert!(p.contains("7-8"));
    }

    #[test]
    fn short_source_untouched() {
        assert_eq!(truncate_source("short", 3000), "short");
    }

    #[test]
    fn long_source_cut_with_marker() {
        let long = "x".repeat(5000);
        let t = truncate_source(&long, 3000);
        assert!(t.ends_with(TRUNCATION_MARKER));
        assert_eq!(t.chars().count(), 3000 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let long = "é".repeat(200);
        let t = truncate_source(&long, 100);
        assert!(t.starts_with('é'));
        assert!(t.ends_with(TRUNCATION_MARKER));
    }
}
