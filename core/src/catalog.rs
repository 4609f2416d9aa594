//! Filtering of the public event catalog.

use crate::remote::EventSummary;

/// Staff-provided catalog criteria; empty criteria match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Only events of this organizer (trimmed, case-insensitive)
    pub organizer_email: Option<String>,
    /// Free-text term matched against the name or the `YYYY-MM-DD` dates
    pub search: Option<String>,
}

/// `YYYY-MM-DD` part of a server date-time
fn date_part(value: Option<&str>) -> &str {
    value.map_or("", |v| v.get(..10).unwrap_or(v))
}

impl EventFilter {
    /// Filter by organizer only
    #[must_use]
    pub fn organizer(email: impl Into<String>) -> Self {
        Self {
            organizer_email: Some(email.into()),
            search: None,
        }
    }

    /// Add a search term
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Whether an event satisfies every criterion
    #[must_use]
    pub fn matches(&self, event: &EventSummary) -> bool {
        let organizer_ok = match self.organizer_email.as_deref().map(str::trim) {
            Some(wanted) if !wanted.is_empty() => event
                .organizer_email
                .as_deref()
                .is_some_and(|email| email.trim().eq_ignore_ascii_case(wanted)),
            _ => true,
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term_lower = term.to_lowercase();
                event
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&term_lower))
                    || date_part(event.event_start_date.as_deref()).contains(term)
                    || date_part(event.event_end_date.as_deref()).contains(term)
            }
            _ => true,
        };

        organizer_ok && search_ok
    }

    /// Keep the matching events, in catalog order
    #[must_use]
    pub fn apply(&self, events: Vec<EventSummary>) -> Vec<EventSummary> {
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}
