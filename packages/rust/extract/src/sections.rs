//! Segmentation of an HTML document into classified sections.
//!
//! The heuristic works in three stages:
//! 1. Noise removal — cookie banners, modals, and newsletter prompts
//!    are detached from a private copy of the tree.
//! 2. Candidate selection — semantic landmark tags, falling back to
//!    h1–h3 heading groups, falling back to the whole `<body>`.
//! 3. Per-candidate extraction — headings, visible text, links, images,
//!    lists, tables, plus a truncated raw-markup snapshot.
//!
//! Classification and noise rules are ordered data tables, not code:
//! adding a rule means adding a table entry.

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;
use url::Url;

use sitescope_shared::{
    Image, Link, ScrapeConfig, Section, SectionContent, SectionType,
};

/// Selectors for overlay chrome that never belongs to page content.
const NOISE_SELECTORS: &[&str] = &[
    "#cookie-banner",
    ".cookie-banner",
    "[id*='cookie']",
    "[class*='cookie']",
    "[aria-label*='cookie']",
    "[aria-label*='Cookie']",
    ".modal",
    ".newsletter",
];

/// Semantic landmark tags, the primary section boundaries.
const LANDMARK_SELECTOR: &str = "header, nav, main, section, footer, article";

/// Heading levels used for the grouping fallback.
const HEADING_SELECTOR: &str = "h1, h2, h3";

/// Keyword tables for type classification, first match wins.
/// Hero keywords only apply to the first candidate.
const HERO_KEYWORDS: &[&str] = &["hero", "welcome", "home"];
const FAQ_KEYWORDS: &[&str] = &["faq", "frequently asked questions"];
const PRICING_KEYWORDS: &[&str] = &["pricing", "per month", "plan"];

/// Word budget for labels derived from body text.
const LABEL_WORDS: usize = 7;

/// Segment a parsed document into an ordered sequence of sections.
///
/// The caller's document is never mutated: noise removal operates on a
/// private clone, so repeated extraction from the same tree is
/// idempotent. Section indices count *candidates*, so a dropped empty
/// candidate leaves a gap in the surviving ids.
pub fn extract_sections(doc: &Html, url: &Url, config: &ScrapeConfig) -> Vec<Section> {
    let mut doc = doc.clone();
    remove_noise(&mut doc);

    let mut sections = Vec::new();
    for (idx, root) in candidate_roots(&doc).into_iter().enumerate() {
        let content = extract_content(&root, url);
        if content.is_empty() {
            // The candidate still consumed its index.
            continue;
        }

        let kind = classify(root.tag(), &content.text, idx);
        let label = derive_label(&content.headings, &content.text);
        let (raw_html, truncated) = serialize_truncated(&root, config.raw_html_budget);

        sections.push(Section {
            id: format!("{kind}-{idx}"),
            kind,
            label,
            source_url: url.to_string(),
            content,
            raw_html,
            truncated,
        });
    }

    debug!(sections = sections.len(), %url, "extracted sections");
    sections
}

// ---------------------------------------------------------------------------
// Noise removal
// ---------------------------------------------------------------------------

/// Detach overlay chrome from the working tree.
fn remove_noise(doc: &mut Html) {
    let mut doomed = Vec::new();
    for selector_str in NOISE_SELECTORS {
        let selector = Selector::parse(selector_str).unwrap();
        doomed.extend(doc.select(&selector).map(|el| el.id()));
    }
    for id in doomed {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate roots
// ---------------------------------------------------------------------------

/// The DOM fragment treated as one section.
///
/// A heading group is a synthetic container: the heading plus its
/// following siblings up to the next h1–h3. The nodes keep their place
/// in the original tree; they are never re-parented.
enum SectionRoot<'a> {
    Container {
        element: ElementRef<'a>,
        tag: String,
    },
    HeadingGroup {
        nodes: Vec<NodeRef<'a, Node>>,
    },
}

impl<'a> SectionRoot<'a> {
    /// Tag name used for classification; synthetic groups and the
    /// `<body>` fallback are generic sections.
    fn tag(&self) -> &str {
        match self {
            Self::Container { tag, .. } => tag,
            Self::HeadingGroup { .. } => "section",
        }
    }

    /// All top-level nodes belonging to this root.
    fn nodes(&self) -> Vec<NodeRef<'a, Node>> {
        match self {
            Self::Container { element, .. } => vec![**element],
            Self::HeadingGroup { nodes } => nodes.clone(),
        }
    }

    /// Serialize the root's markup; groups are wrapped in a `<div>`.
    fn serialize(&self) -> String {
        match self {
            Self::Container { element, .. } => element.html(),
            Self::HeadingGroup { nodes } => {
                let inner: String = nodes.iter().copied().map(serialize_node).collect();
                format!("<div>{inner}</div>")
            }
        }
    }
}

fn serialize_node(node: NodeRef<'_, Node>) -> String {
    if let Some(el) = ElementRef::wrap(node) {
        el.html()
    } else if let Node::Text(text) = node.value() {
        text.to_string()
    } else {
        String::new()
    }
}

/// Pick section candidates in priority order, first non-empty match wins:
/// landmark tags, then heading groups, then the document body.
fn candidate_roots<'a>(doc: &'a Html) -> Vec<SectionRoot<'a>> {
    let landmarks = Selector::parse(LANDMARK_SELECTOR).unwrap();
    let found: Vec<ElementRef<'a>> = doc.select(&landmarks).collect();
    if !found.is_empty() {
        return found
            .into_iter()
            .map(|element| SectionRoot::Container {
                tag: element.value().name().to_string(),
                element,
            })
            .collect();
    }

    let headings = Selector::parse(HEADING_SELECTOR).unwrap();
    let found: Vec<ElementRef<'a>> = doc.select(&headings).collect();
    if !found.is_empty() {
        return found
            .into_iter()
            .map(|heading| SectionRoot::HeadingGroup {
                nodes: heading_group(heading),
            })
            .collect();
    }

    // Whole-body fallback: a non-empty document never yields zero
    // candidates, even for table-only layouts.
    let body = Selector::parse("body").unwrap();
    doc.select(&body)
        .next()
        .map(|element| SectionRoot::Container {
            tag: "section".into(),
            element,
        })
        .into_iter()
        .collect()
}

/// Collect a heading plus its following siblings up to the next h1–h3.
fn heading_group(heading: ElementRef<'_>) -> Vec<NodeRef<'_, Node>> {
    let mut nodes = vec![*heading];
    for sibling in heading.next_siblings() {
        if is_heading(&sibling) {
            break;
        }
        nodes.push(sibling);
    }
    nodes
}

fn is_heading(node: &NodeRef<'_, Node>) -> bool {
    node.value()
        .as_element()
        .is_some_and(|el| matches!(el.name(), "h1" | "h2" | "h3"))
}

// ---------------------------------------------------------------------------
// Content extraction
// ---------------------------------------------------------------------------

fn extract_content(root: &SectionRoot<'_>, url: &Url) -> SectionContent {
    let nodes = root.nodes();

    let li_selector = Selector::parse("li").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let mut content = SectionContent {
        text: visible_text(&nodes),
        ..SectionContent::default()
    };

    for el in descendant_elements(&nodes) {
        match el.value().name() {
            "h1" | "h2" | "h3" => content.headings.push(element_text(&el)),
            "a" => {
                if let Some(href) = el.value().attr("href") {
                    if !href.trim().is_empty() {
                        content.links.push(Link {
                            text: element_text(&el),
                            href: resolve(url, href),
                        });
                    }
                }
            }
            "img" => {
                if let Some(src) = el.value().attr("src") {
                    content.images.push(Image {
                        src: resolve(url, src),
                        alt: el.value().attr("alt").unwrap_or("").trim().to_string(),
                    });
                }
            }
            "ul" | "ol" => {
                let items: Vec<String> = el
                    .select(&li_selector)
                    .map(|li| element_text(&li))
                    .filter(|item| !item.is_empty())
                    .collect();
                if !items.is_empty() {
                    content.lists.push(items);
                }
            }
            "table" => {
                let rows: Vec<Vec<String>> = el
                    .select(&row_selector)
                    .map(|row| {
                        row.select(&cell_selector)
                            .map(|cell| element_text(&cell))
                            .collect::<Vec<String>>()
                    })
                    .filter(|cells| !cells.is_empty())
                    .collect();
                if !rows.is_empty() {
                    content.tables.push(rows);
                }
            }
            _ => {}
        }
    }

    content
}

/// All elements under the root's nodes, in document order.
fn descendant_elements<'a>(nodes: &[NodeRef<'a, Node>]) -> Vec<ElementRef<'a>> {
    nodes
        .iter()
        .flat_map(|node| node.descendants())
        .filter_map(ElementRef::wrap)
        .collect()
}

/// Visible text under the given nodes, whitespace-normalized.
/// Script, style, and template contents are excluded.
fn visible_text(nodes: &[NodeRef<'_, Node>]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for node in nodes {
        collect_visible_text(*node, &mut parts);
    }
    parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_visible_text(node: NodeRef<'_, Node>, parts: &mut Vec<String>) {
    match node.value() {
        Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript" | "template") => {
            return;
        }
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
            return;
        }
        _ => {}
    }
    for child in node.children() {
        collect_visible_text(child, parts);
    }
}

/// Whitespace-normalized text of a single element's subtree.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve against the page URL; an unresolvable value is kept raw.
fn resolve(base: &Url, raw: &str) -> String {
    base.join(raw)
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

// ---------------------------------------------------------------------------
// Classification, labeling, serialization
// ---------------------------------------------------------------------------

fn classify(tag: &str, text: &str, idx: usize) -> SectionType {
    match tag {
        "nav" => SectionType::Nav,
        "footer" => SectionType::Footer,
        _ => {
            let lower = text.to_lowercase();
            if idx == 0 && HERO_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                SectionType::Hero
            } else if FAQ_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                SectionType::Faq
            } else if PRICING_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                SectionType::Pricing
            } else {
                SectionType::Section
            }
        }
    }
}

fn derive_label(headings: &[String], text: &str) -> String {
    if let Some(first) = headings.first() {
        return first.clone();
    }
    let words: Vec<&str> = text.split_whitespace().take(LABEL_WORDS).collect();
    if words.is_empty() {
        "Section".into()
    } else {
        words.join(" ")
    }
}

fn serialize_truncated(root: &SectionRoot<'_>, budget: usize) -> (String, bool) {
    let full = root.serialize();
    if full.chars().count() > budget {
        (full.chars().take(budget).collect(), true)
    } else {
        (full, false)
    }
}
