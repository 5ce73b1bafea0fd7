//! Markup compilation: a validated slide list becomes one HTML document.
//!
//! Pure and deterministic — the same slide list always produces a
//! byte-identical document, which keeps the stage trivially testable and
//! makes PDF diffs meaningful across runs. All styling is embedded; the only
//! external references are the three brand-mark images, resolved relative to
//! the document's location at render time.
//!
//! Every page block enforces the carousel geometry contract itself: a fixed
//! 1080×1080 box, `page-break-after` on every slide, `page-break-inside`
//! avoided, and print color-adjust forced so gradient backgrounds survive
//! the print pipeline.

use crate::slide::{Slide, CLOSING_DOMAIN, CLOSING_URL};
use std::fmt::Write;

/// Render the complete HTML document, one `<section class="slide">` per
/// slide, in slide order.
pub fn compile_document(slides: &[Slide]) -> String {
    let mut body = String::with_capacity(slides.len() * 1024);
    for slide in slides {
        body.push_str(&compile_slide(slide));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <style>\n{STYLESHEET}\n  </style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Render one page block.
pub fn compile_slide(slide: &Slide) -> String {
    match slide {
        Slide::Title {
            title,
            subtitle,
            highlight,
        } => format!(
            "<section class=\"slide title-slide\">\n\
             <div class=\"logo logo-white\"></div>\n\
             <div class=\"slide-content\">\n\
             <h1>{}</h1>\n{}\
             <div class=\"highlight\">{}</div>\n\
             </div>\n</section>\n",
            escape_html(title),
            opt_tag("h2", subtitle),
            escape_html(highlight),
        ),

        Slide::Stat {
            title,
            subtitle,
            stats,
        } => format!(
            "<section class=\"slide stat-slide\">\n\
             <div class=\"logo logo-normal\"></div>\n\
             <div class=\"slide-content\">\n\
             <h2>{}</h2>\n\
             <div class=\"stats-grid\">{}</div>\n{}\
             </div>\n</section>\n",
            escape_html(title),
            card_grid("stat-item", stats),
            opt_class_tag("p", "subtitle", subtitle),
        ),

        Slide::List {
            title,
            subtitle,
            description,
            items,
        } => format!(
            "<section class=\"slide list-slide\">\n\
             <div class=\"logo logo-normal\"></div>\n\
             <div class=\"slide-content\">\n\
             <h2>{}</h2>\n{}{}\
             <div class=\"items-list\">{}</div>\n\
             </div>\n</section>\n",
            escape_html(title),
            opt_class_tag("p", "subtitle", subtitle),
            opt_class_tag("p", "description", description),
            card_grid("item", items),
        ),

        Slide::Results {
            title,
            subtitle,
            description,
            cases,
        } => format!(
            "<section class=\"slide results-slide\">\n\
             <div class=\"logo logo-dark\"></div>\n\
             <div class=\"slide-content\">\n\
             <h2>{}</h2>\n{}{}\
             <div class=\"cases-grid\">{}</div>\n\
             </div>\n</section>\n",
            escape_html(title),
            opt_class_tag("p", "subtitle", subtitle),
            opt_class_tag("p", "description", description),
            card_grid("case", cases),
        ),

        Slide::Recommendations {
            title,
            subtitle,
            description,
            sections,
        } => format!(
            "<section class=\"slide recommendations-slide\">\n\
             <div class=\"logo logo-white\"></div>\n\
             <div class=\"slide-content\">\n\
             <h2>{}</h2>\n{}{}\
             <div class=\"recommendations-grid\">{}</div>\n\
             </div>\n</section>\n",
            escape_html(title),
            opt_class_tag("p", "subtitle", subtitle),
            opt_class_tag("p", "description", description),
            card_grid("rec", sections),
        ),

        Slide::Cta {
            title,
            subtitle,
            description,
            steps,
            highlight,
        } => format!(
            "<section class=\"slide cta-slide\">\n\
             <div class=\"logo logo-white\"></div>\n\
             <div class=\"slide-content\">\n\
             <h2>{}</h2>\n{}{}\
             <div class=\"steps\">{}</div>\n\
             <div class=\"highlight\">{}</div>\n\
             </div>\n</section>\n",
            escape_html(title),
            opt_tag("h3", subtitle),
            opt_class_tag("p", "description", description),
            card_grid("step", steps),
            escape_html(highlight),
        ),

        Slide::Final {
            title,
            subtitle,
            description,
            cta_text,
        } => format!(
            "<section class=\"slide final-slide\">\n\
             <div class=\"logo-center\"></div>\n\
             <h2>{}</h2>\n{}{}\
             <a href=\"{CLOSING_URL}\" target=\"_blank\" class=\"cta-button\">{}</a>\n\
             <p class=\"domain\">{CLOSING_DOMAIN}</p>\n\
             </section>\n",
            escape_html(title),
            opt_tag("h3", subtitle),
            opt_class_tag("p", "description", description),
            escape_html(cta_text),
        ),
    }
}

/// `<div class='{class}'>…</div>` per entry, order preserved.
fn card_grid(class: &str, entries: &[String]) -> String {
    let mut out = String::new();
    for entry in entries {
        // write! into String cannot fail
        let _ = write!(out, "<div class='{class}'>{}</div>", escape_html(entry));
    }
    out
}

fn opt_tag(tag: &str, text: &Option<String>) -> String {
    match text {
        Some(t) => format!("<{tag}>{}</{tag}>\n", escape_html(t)),
        None => String::new(),
    }
}

fn opt_class_tag(tag: &str, class: &str, text: &Option<String>) -> String {
    match text {
        Some(t) => format!("<{tag} class='{class}'>{}</{tag}>\n", escape_html(t)),
        None => String::new(),
    }
}

/// Minimal HTML escaping for model-supplied text.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Embedded stylesheet. Geometry literals here are the carousel contract:
/// 1080×1080 pages, zero margin, break after every slide.
const STYLESHEET: &str = r#"    @page {
      size: 1080px 1080px;
      margin: 0;
      padding: 0;
    }

    * { margin: 0; padding: 0; box-sizing: border-box; }

    html, body { width: 1080px; height: auto; margin: 0; padding: 0; }

    body {
      font-family: 'Inter', -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
      background: white;
      width: 1080px;
    }

    .slide {
      width: 1080px !important;
      height: 1080px !important;
      min-width: 1080px !important;
      max-width: 1080px !important;
      min-height: 1080px !important;
      max-height: 1080px !important;
      display: flex;
      align-items: center;
      justify-content: center;
      page-break-after: always;
      page-break-inside: avoid;
      position: relative;
      overflow: hidden;
      margin: 0;
      padding: 0;
      box-sizing: border-box;
    }

    .slide-content {
      width: 100%;
      max-width: 900px;
      padding: 40px 50px 60px 50px;
      text-align: center;
    }

    /* Title slide */
    .title-slide {
      background: linear-gradient(135deg, #61A9C8 0%, #335069 100%);
      color: white;
    }
    .title-slide h1 {
      font-size: 56px;
      font-weight: 800;
      line-height: 1.1;
      margin-bottom: 25px;
      letter-spacing: -0.02em;
    }
    .title-slide h2 { font-size: 28px; font-weight: 400; opacity: 0.9; margin-bottom: 35px; }
    .title-slide .highlight {
      font-size: 24px;
      font-weight: 600;
      background: rgba(255,255,255,0.2);
      padding: 18px 35px;
      border-radius: 50px;
      display: inline-block;
    }

    /* Stat slide */
    .stat-slide {
      background: linear-gradient(135deg, #dfeef4 0%, #c0dce9 100%);
      color: #1D273D;
    }
    .stat-slide h2 { font-size: 36px; font-weight: 700; margin-bottom: 40px; color: #335069; line-height: 1.1; }
    .stats-grid { display: grid; gap: 20px; margin-bottom: 35px; }
    .stat-item {
      font-size: 26px;
      font-weight: 600;
      padding: 18px;
      background: rgba(97,169,200,0.2);
      border-radius: 18px;
      border-left: 6px solid #61A9C8;
      line-height: 1.2;
    }
    .stat-slide .subtitle { font-size: 20px; font-style: italic; opacity: 0.8; }

    /* List slides */
    .list-slide {
      background: linear-gradient(135deg, #FFFFFF 0%, #dfeef4 100%);
      color: #1D273D;
    }
    .list-slide h2 { font-size: 36px; font-weight: 700; margin-bottom: 12px; color: #335069; line-height: 1.1; }
    .list-slide .subtitle { font-size: 20px; margin-bottom: 6px; opacity: 0.8; font-weight: 500; color: #61A9C8; }
    .list-slide .description { font-size: 16px; margin-bottom: 25px; opacity: 0.7; font-style: italic; line-height: 1.3; }
    .items-list { display: grid; gap: 20px; text-align: left; }
    .item {
      font-size: 22px;
      font-weight: 500;
      padding: 16px 22px;
      background: rgba(97,169,200,0.1);
      border-radius: 12px;
      border-left: 5px solid #61A9C8;
      line-height: 1.2;
    }

    /* Results slide */
    .results-slide {
      background: linear-gradient(135deg, #c0dce9 0%, #a0cbde 100%);
      color: #1D273D;
    }
    .results-slide h2 { font-size: 36px; font-weight: 700; margin-bottom: 12px; color: #335069; line-height: 1.1; }
    .results-slide .subtitle { font-size: 20px; margin-bottom: 6px; opacity: 0.8; font-weight: 500; color: #1D273D; }
    .results-slide .description { font-size: 16px; margin-bottom: 25px; opacity: 0.7; font-style: italic; line-height: 1.3; }
    .cases-grid { display: grid; gap: 20px; text-align: left; }
    .case {
      font-size: 22px;
      font-weight: 600;
      padding: 18px 22px;
      background: rgba(255,255,255,0.6);
      border-radius: 12px;
      border-left: 5px solid #335069;
      line-height: 1.2;
    }

    /* Recommendations slide */
    .recommendations-slide {
      background: linear-gradient(135deg, #80bad2 0%, #61A9C8 100%);
      color: white;
    }
    .recommendations-slide h2 { font-size: 42px; font-weight: 700; margin-bottom: 15px; color: white; }
    .recommendations-slide .subtitle { font-size: 22px; margin-bottom: 8px; opacity: 0.9; font-weight: 500; }
    .recommendations-slide .description { font-size: 18px; margin-bottom: 30px; opacity: 0.8; font-style: italic; line-height: 1.4; }
    .recommendations-grid { display: grid; gap: 25px; text-align: left; }
    .rec {
      font-size: 26px;
      font-weight: 600;
      padding: 25px;
      background: rgba(255,255,255,0.2);
      border-radius: 15px;
      border-left: 6px solid white;
      line-height: 1.3;
    }

    /* CTA slide */
    .cta-slide {
      background: linear-gradient(135deg, #335069 0%, #1D273D 100%);
      color: white;
    }
    .cta-slide h2 { font-size: 46px; font-weight: 800; margin-bottom: 15px; color: #61A9C8; }
    .cta-slide h3 { font-size: 24px; font-weight: 500; margin-bottom: 8px; opacity: 0.9; }
    .cta-slide .description { font-size: 18px; margin-bottom: 30px; opacity: 0.8; font-style: italic; line-height: 1.4; }
    .steps { display: grid; gap: 18px; margin-bottom: 35px; text-align: left; }
    .step {
      font-size: 20px;
      font-weight: 600;
      padding: 18px 22px;
      background: rgba(97,169,200,0.2);
      border-radius: 12px;
      line-height: 1.3;
    }
    .cta-slide .highlight {
      font-size: 22px;
      font-weight: 700;
      background: #61A9C8;
      padding: 18px 25px;
      border-radius: 20px;
      display: inline-block;
      color: white;
    }

    /* Brand mark: top-right, three variants by background darkness */
    .logo {
      position: absolute;
      top: -20px;
      right: 50px;
      width: 180px;
      height: 180px;
      background-size: contain;
      background-repeat: no-repeat;
      background-position: center;
      opacity: 0.95;
      z-index: 10;
    }
    .logo-normal { background-image: url('logo.png'); }
    .logo-white  { background-image: url('logo-white.png'); }
    .logo-dark   { background-image: url('logo-dark.png'); }

    /* Final slide: full-bleed, centered mark, no corner logo */
    .final-slide {
      background: linear-gradient(135deg, #1D273D 0%, #335069 100%);
      color: white;
      display: flex;
      flex-direction: column;
      align-items: center;
      justify-content: center;
      text-align: center;
    }
    .final-slide .logo-center {
      width: 250px;
      height: 250px;
      background-image: url('logo-white.png');
      background-size: contain;
      background-repeat: no-repeat;
      background-position: center;
      margin-bottom: 40px;
      opacity: 1;
    }
    .final-slide h2 { font-size: 48px; font-weight: 800; margin-bottom: 20px; color: #61A9C8; }
    .final-slide h3 { font-size: 28px; font-weight: 500; margin-bottom: 15px; opacity: 0.9; }
    .final-slide .description { font-size: 20px; margin-bottom: 40px; opacity: 0.8; font-style: italic; line-height: 1.4; }
    .final-slide .cta-button {
      font-size: 24px;
      font-weight: 700;
      background: #61A9C8;
      color: white;
      padding: 20px 40px;
      border-radius: 30px;
      display: inline-block;
      text-transform: uppercase;
      letter-spacing: 1px;
      box-shadow: 0 8px 20px rgba(97,169,200,0.3);
      text-decoration: none;
    }
    .final-slide .domain { font-size: 16px; margin-top: 30px; opacity: 0.7; }

    /* Print: keep backgrounds, one slide per sheet */
    @media print {
      .slide {
        -webkit-print-color-adjust: exact;
        color-adjust: exact;
        print-color-adjust: exact;
      }
    }"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_slides() -> Vec<Slide> {
        vec![
            Slide::Title {
                title: "AI & Business".into(),
                subtitle: Some("A field guide".into()),
                highlight: "📊 One insight".into(),
            },
            Slide::Stat {
                title: "Numbers".into(),
                subtitle: None,
                stats: vec!["💰 40% growth".into(), "📈 2x faster".into()],
            },
            Slide::closing(),
        ]
    }

    #[test]
    fn compile_is_deterministic() {
        let slides = sample_slides();
        assert_eq!(compile_document(&slides), compile_document(&slides));
    }

    #[test]
    fn one_section_per_slide_in_order() {
        let html = compile_document(&sample_slides());
        assert_eq!(html.matches("<section class=\"slide").count(), 3);
        let title_pos = html.find("title-slide").unwrap();
        let stat_pos = html.find("stat-slide").unwrap();
        let final_pos = html.find("final-slide").unwrap();
        assert!(title_pos < stat_pos && stat_pos < final_pos);
    }

    #[test]
    fn geometry_contract_is_embedded() {
        let html = compile_document(&sample_slides());
        assert!(html.contains("size: 1080px 1080px"));
        assert!(html.contains("page-break-after: always"));
        assert!(html.contains("page-break-inside: avoid"));
        assert!(html.contains("print-color-adjust: exact"));
    }

    #[test]
    fn no_external_network_references() {
        let html = compile_document(&sample_slides());
        // The closing-page link is the only absolute URL; assets are relative.
        assert!(!html.contains("src=\"http"));
        assert!(!html.contains("url('http"));
        assert!(!html.contains("@import"));
    }

    #[test]
    fn model_text_is_escaped() {
        let slides = vec![Slide::Title {
            title: "<script>alert(1)</script> & more".into(),
            subtitle: None,
            highlight: "\"quoted\"".into(),
        }];
        let html = compile_document(&slides);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
        assert!(html.contains("&quot;quoted&quot;"));
    }

    #[test]
    fn brand_mark_variant_matches_background() {
        let html = compile_document(&sample_slides());
        assert!(html.contains("logo logo-white")); // dark title background
        assert!(html.contains("logo logo-normal")); // light stat background
        assert!(html.contains("logo-center")); // full-bleed final page
    }

    #[test]
    fn final_slide_carries_fixed_link() {
        let html = compile_slide(&Slide::closing());
        assert!(html.contains(CLOSING_URL));
        assert!(html.contains("Contact ProjectWorkLab"));
        assert!(html.contains(CLOSING_DOMAIN));
    }

    #[test]
    fn optional_fields_are_omitted_not_empty() {
        let html = compile_slide(&Slide::List {
            title: "T".into(),
            subtitle: None,
            description: None,
            items: vec!["x".into()],
        });
        assert!(!html.contains("class='subtitle'"));
        assert!(!html.contains("class='description'"));
    }
}
