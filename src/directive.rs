//! Directive parsing - turns a markdown document into named sections.
//!
//! A *directive* is the static instruction document that drives one
//! orchestration run. It is parsed once, up front, and read-only afterwards;
//! later stages quote individual sections verbatim in the documents they
//! render (e.g. an "Output & Handoff" appendix in the handoff document).
//!
//! Malformed markdown is not an error condition: it simply yields fewer (or
//! no) sections. Callers must treat an absent section as optional.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One heading of the directive together with the body below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Heading text with the `#` markers stripped.
    pub heading: String,
    /// Heading level (1 for `#`, up to 6 for `######`).
    pub depth: u8,
    /// Lookup-safe key derived from the heading: lowercased, punctuation
    /// stripped, hyphenated.
    pub slug: String,
    /// Raw markdown between this heading and the next heading of
    /// equal-or-lesser depth. Nested subsection text is included.
    pub content: String,
}

/// A parsed directive document.
///
/// Sections are kept as a flattened, ordered list so callers can both look up
/// a section by name and iterate the document in source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    /// Title of the document: the first level-1 heading, falling back to the
    /// first heading of any depth.
    pub title: String,
    /// All headings in source order.
    pub sections: Vec<Section>,
    /// The original markdown, untouched.
    pub raw: String,
}

impl Directive {
    /// Parse a markdown document into a directive.
    ///
    /// Recognizes ATX headings (`#` through `######`). Headings inside fenced
    /// code blocks are ignored. This is a pure transform with no failure mode:
    /// a document without headings parses into a directive with no sections.
    pub fn parse(markdown: &str) -> Self {
        let heading_re = Regex::new(r"^(#{1,6})\s+(.+?)\s*$").unwrap();
        let lines: Vec<&str> = markdown.lines().collect();

        let mut headings: Vec<(usize, u8, String)> = Vec::new();
        let mut in_fence = false;
        for (line_no, line) in lines.iter().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            if let Some(caps) = heading_re.captures(line) {
                headings.push((line_no, caps[1].len() as u8, caps[2].to_string()));
            }
        }

        let mut sections = Vec::with_capacity(headings.len());
        for (idx, (line_no, depth, heading)) in headings.iter().enumerate() {
            // A section runs until the next heading at the same or a shallower
            // level, so subsection text stays inside its parent's content.
            let end = headings[idx + 1..]
                .iter()
                .find(|(_, d, _)| d <= depth)
                .map(|(l, _, _)| *l)
                .unwrap_or(lines.len());
            let content = lines[line_no + 1..end].join("\n").trim().to_string();
            sections.push(Section {
                heading: heading.clone(),
                depth: *depth,
                slug: slugify(heading),
                content,
            });
        }

        let title = sections
            .iter()
            .find(|s| s.depth == 1)
            .or_else(|| sections.first())
            .map(|s| s.heading.clone())
            .unwrap_or_else(|| "Untitled Directive".to_string());

        Self {
            title,
            sections,
            raw: markdown.to_string(),
        }
    }

    /// Find a section by heading text or slug, case-insensitively.
    ///
    /// Returns the first match in source order, or `None`. Absent sections are
    /// an expected condition, not an error.
    pub fn section(&self, name: &str) -> Option<&Section> {
        let wanted = slugify(name);
        self.sections
            .iter()
            .find(|s| s.heading.eq_ignore_ascii_case(name) || s.slug == wanted)
    }
}

/// Normalize heading text into a lookup key.
///
/// Alphanumeric runs are lowercased; everything between them collapses into a
/// single hyphen. Leading and trailing punctuation disappears entirely.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
