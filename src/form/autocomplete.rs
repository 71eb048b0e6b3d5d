//! City autocomplete: turns typed text into a freshest-wins suggestion list.
//!
//! The controller does no I/O itself. [`Autocomplete::query`] hands back a
//! [`CityQuery`] for the caller to run, and [`Autocomplete::apply`] accepts the
//! outcome. Only the response to the most recently issued query is ever
//! applied, whatever order responses arrive in.

use std::fmt;

use tracing::trace;

use crate::api::CityService;
use crate::model::CitySuggestion;

/// Where the controller is in its search cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    /// No dropdown; nothing pending.
    #[default]
    Idle,
    /// A lookup for the latest query is outstanding.
    Searching,
    /// The latest lookup returned suggestions.
    Populated,
    /// The latest lookup returned nothing or failed.
    Empty,
}

/// A lookup the caller should run against the city service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    /// Sequence number tying the response back to this query.
    pub seq: u64,
    /// The text to search for.
    pub text: String,
}

/// Suggestion list state for the city field.
#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    state: SearchState,
    suggestions: Vec<CitySuggestion>,
    latest_seq: u64,
    highlighted: Option<usize>,
}

impl Autocomplete {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a lookup for `text`.
    ///
    /// Blank text clears the list and returns `None` without any lookup.
    pub fn query(&mut self, text: &str) -> Option<CityQuery> {
        if text.trim().is_empty() {
            self.reset();
            return None;
        }
        self.latest_seq += 1;
        self.state = SearchState::Searching;
        self.highlighted = None;
        Some(CityQuery {
            seq: self.latest_seq,
            text: text.to_string(),
        })
    }

    /// Applies the outcome of the lookup tagged `seq`.
    ///
    /// Returns `false`, leaving state untouched, when `seq` is not the latest
    /// query or the controller stopped searching in the meantime. Failures
    /// degrade to an empty list and are never surfaced.
    pub fn apply<E: fmt::Display>(
        &mut self,
        seq: u64,
        result: Result<Vec<CitySuggestion>, E>,
    ) -> bool {
        if seq != self.latest_seq || self.state != SearchState::Searching {
            trace!(seq, latest = self.latest_seq, "dropping stale city suggestions");
            return false;
        }
        self.suggestions = match result {
            Ok(suggestions) => suggestions,
            Err(e) => {
                trace!(seq, error = %e, "city search failed");
                Vec::new()
            }
        };
        self.highlighted = None;
        self.state = if self.suggestions.is_empty() {
            SearchState::Empty
        } else {
            SearchState::Populated
        };
        true
    }

    /// Runs `query` against `service` and applies the result.
    pub async fn run(&mut self, service: &dyn CityService, query: CityQuery) -> bool {
        let result = service.search(&query.text).await;
        self.apply(query.seq, result)
    }

    /// Commits the suggestion at `index`, returning the name to write into
    /// the city field. Closes the dropdown.
    pub fn select(&mut self, index: usize) -> Option<String> {
        let name = self.suggestions.get(index)?.name.clone();
        self.reset();
        Some(name)
    }

    /// Commits the highlighted suggestion, if any.
    pub fn select_highlighted(&mut self) -> Option<String> {
        self.highlighted.and_then(|i| self.select(i))
    }

    /// Closes the dropdown and forgets the current list.
    pub fn reset(&mut self) {
        self.state = SearchState::Idle;
        self.suggestions.clear();
        self.highlighted = None;
    }

    /// Moves the highlight down, stopping at the last suggestion.
    pub fn highlight_next(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        let last = self.suggestions.len() - 1;
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(i) => (i + 1).min(last),
        });
    }

    /// Moves the highlight up; moving above the first clears it.
    pub fn highlight_prev(&mut self) {
        self.highlighted = match self.highlighted {
            Some(i) if i > 0 => Some(i - 1),
            _ => None,
        };
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn suggestions(&self) -> &[CitySuggestion] {
        &self.suggestions
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Whether the dropdown should be shown.
    pub fn is_open(&self) -> bool {
        self.state != SearchState::Idle
    }
}
