//! Read-only views over `<table>` elements of a DOM snapshot.
//!
//! Pages are captured with `page.content()` and re-parsed for every step, so
//! nothing here holds on to live browser handles.

use crate::normalize::clean_text;
use aho_corasick::{AhoCorasick, MatchKind};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Parse a CSS selector; malformed selectors simply match nothing.
pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

pub fn select_doc<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => doc.select(&sel).collect(),
        None => Vec::new(),
    }
}

pub fn select_in<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => root.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Whitespace-collapsed text content of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Lower-cased text content, used for keyword classification.
pub fn aggregate_text(el: ElementRef<'_>) -> String {
    element_text(el).to_lowercase()
}

pub fn has_class_hint(el: ElementRef<'_>, hints: &[&str]) -> bool {
    let class = el.value().attr("class").unwrap_or("").to_lowercase();
    let id = el.value().attr("id").unwrap_or("").to_lowercase();
    hints.iter().any(|h| class.contains(h) || id.contains(h))
}

/// Ancestors of `el` that are elements, nearest first.
pub fn element_ancestors<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap)
}

// ── Keyword sets ─────────────────────────────────────────────────────────────

/// Case-insensitive substring matcher over a fixed vocabulary.
pub struct TokenSet {
    matcher: AhoCorasick,
}

impl TokenSet {
    pub fn new(tokens: &[&str]) -> Self {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(tokens)
            .expect("valid keyword patterns");
        Self { matcher }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Number of distinct vocabulary entries present in `text`.
    pub fn distinct_hits(&self, text: &str) -> usize {
        self.matcher
            .find_iter(text)
            .map(|m| m.pattern())
            .collect::<HashSet<_>>()
            .len()
    }
}

// ── Table model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// Whitespace-collapsed text.
    pub text: String,
    /// Individual text lines (text nodes split on newlines), in order.
    pub lines: Vec<String>,
    /// `src` (or `data-src`) of every image inside the cell.
    pub images: Vec<String>,
    pub class: String,
    /// Cell (or something inside it) is flagged as a malus / office score.
    pub malus: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub is_header: bool,
    pub class: String,
}

impl Row {
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn cell_text(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|c| c.text.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct TableView<'a> {
    pub element: ElementRef<'a>,
    pub rows: Vec<Row>,
}

impl<'a> TableView<'a> {
    /// Header row: the first row made of `<th>` or living in `<thead>`,
    /// otherwise the first row.
    pub fn header(&self) -> Option<&Row> {
        self.rows
            .iter()
            .find(|r| r.is_header)
            .or_else(|| self.rows.first())
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        let skip = match self.rows.iter().position(|r| r.is_header) {
            Some(idx) => idx + 1,
            None => 0,
        };
        self.rows.iter().skip(skip).filter(|r| !r.is_header)
    }

    pub fn aggregate_text(&self) -> String {
        aggregate_text(self.element)
    }
}

fn is_malus(el: ElementRef<'_>) -> bool {
    let flagged = |e: ElementRef<'_>| {
        let attr = e.value().attr("data-malus").map(|v| v.trim().to_lowercase());
        let attr_flag = matches!(attr.as_deref(), Some(v) if !v.is_empty() && v != "0" && v != "false");
        attr_flag || has_class_hint(e, &["malus"])
    };
    flagged(el) || el.descendants().filter_map(ElementRef::wrap).any(flagged)
}

fn read_cell(el: ElementRef<'_>) -> Cell {
    let lines: Vec<String> = el
        .text()
        .flat_map(|t| t.split('\n'))
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .collect();
    let images = select_in(el, "img")
        .into_iter()
        .filter_map(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
                .map(str::to_string)
        })
        .collect();
    Cell {
        text: clean_text(&lines.join(" ")),
        lines,
        images,
        class: el.value().attr("class").unwrap_or("").to_string(),
        malus: is_malus(el),
    }
}

fn owning_table<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element_ancestors(el).find(|a| a.value().name() == "table")
}

/// Rows that belong to `table` itself (rows of nested tables are excluded).
pub fn read_table(table: ElementRef<'_>) -> TableView<'_> {
    let mut rows = Vec::new();
    for tr in select_in(table, "tr") {
        if owning_table(tr).map(|t| t.id()) != Some(table.id()) {
            continue;
        }
        let in_thead = element_ancestors(tr)
            .take_while(|a| a.id() != table.id())
            .any(|a| a.value().name() == "thead");
        let cell_elems: Vec<ElementRef<'_>> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .collect();
        if cell_elems.is_empty() {
            continue;
        }
        let all_th = cell_elems.iter().all(|c| c.value().name() == "th");
        rows.push(Row {
            cells: cell_elems.into_iter().map(read_cell).collect(),
            is_header: in_thead || all_th,
            class: tr.value().attr("class").unwrap_or("").to_string(),
        });
    }
    TableView {
        element: table,
        rows,
    }
}

pub fn all_tables(doc: &Html) -> Vec<TableView<'_>> {
    select_doc(doc, "table").into_iter().map(read_table).collect()
}
