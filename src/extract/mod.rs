//! Heuristic extractors for the three league pages.
//!
//! Each extractor is an ordered [`StrategyChain`](crate::core::retry::StrategyChain)
//! over a [`PageSnapshot`]; the first strategy with a non-empty result wins and
//! a page nothing recognises yields an empty list rather than an error.

pub mod lineup;
pub mod roster;
pub mod standings;
pub mod table;

use crate::core::types::LeagueVariant;
use scraper::Html;

pub use lineup::extract_lineups;
pub use roster::extract_rosters;
pub use standings::extract_standings;

/// A parsed DOM capture plus the context the strategies need.
pub struct PageSnapshot {
    pub doc: Html,
    pub variant: LeagueVariant,
    /// Matchday requested by the caller, used when the page does not print one.
    pub matchday_hint: Option<u32>,
}

impl PageSnapshot {
    pub fn new(doc: Html, variant: LeagueVariant) -> Self {
        Self {
            doc,
            variant,
            matchday_hint: None,
        }
    }

    pub fn parse(html: &str, variant: LeagueVariant) -> Self {
        Self::new(Html::parse_document(html), variant)
    }

    pub fn with_matchday(mut self, matchday: Option<u32>) -> Self {
        self.matchday_hint = matchday;
        self
    }
}
