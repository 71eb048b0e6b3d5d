//! Trip detail screen — one trip with duration, rating and cover image.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::model::{Trip, TripId, TripStatus};
use crate::tui::action::{Action, ScreenState};
use crate::tui::app::Screen;

/// Formats a day count as `1 Day` or `N Days`.
pub fn format_days(days: i64) -> String {
    if days == 1 {
        "1 Day".to_string()
    } else {
        format!("{days} Days")
    }
}

/// Formats a trip's dates as `start → end`, with `?` for a missing date.
pub fn format_date_range(trip: &Trip) -> String {
    let fmt = |d: Option<chrono::NaiveDate>| {
        d.map_or_else(|| "?".to_string(), |d| d.format("%Y-%m-%d").to_string())
    };
    format!("{} → {}", fmt(trip.start_date), fmt(trip.end_date))
}

/// State for the trip detail screen.
#[derive(Debug, Clone, Default)]
pub struct TripDetailState {
    trip_id: Option<TripId>,
    trip: Option<Trip>,
    /// The city's default image, looked up for planned trips.
    default_image: Option<String>,
    confirm_delete: bool,
}

impl TripDetailState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `trip_id`, using `cached` until a fresh copy arrives.
    pub fn open(&mut self, trip_id: TripId, cached: Option<Trip>) {
        *self = Self {
            trip_id: Some(trip_id),
            trip: cached,
            ..Self::default()
        };
    }

    /// Replaces the displayed trip with a fresh copy.
    pub fn set_trip(&mut self, trip: Trip) {
        if self.trip_id == Some(trip.trip_id) {
            self.trip = Some(trip);
        }
    }

    pub fn set_default_image(&mut self, url: Option<String>) {
        self.default_image = url;
    }

    pub fn trip_id(&self) -> Option<TripId> {
        self.trip_id
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirm_delete
    }

    /// The image to show: the city default for planned trips, otherwise the
    /// trip's own image falling back to the city default.
    pub fn cover_image(&self) -> Option<&str> {
        let trip = self.trip.as_ref()?;
        let own = trip.image_url.as_deref().filter(|u| !u.trim().is_empty());
        match trip.status {
            TripStatus::ToBeVisited => self.default_image.as_deref(),
            TripStatus::Visited => own.or(self.default_image.as_deref()),
        }
    }
}

impl ScreenState for TripDetailState {
    fn handle_key(&mut self, key: KeyEvent) -> Action {
        let Some(trip_id) = self.trip_id else {
            return Action::Navigate(Screen::Dashboard);
        };
        if self.confirm_delete {
            self.confirm_delete = false;
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Action::DeleteTrip(trip_id),
                _ => Action::None,
            };
        }
        match key.code {
            KeyCode::Char('e') if self.trip.is_some() => Action::EditTrip(trip_id),
            KeyCode::Char('d') => {
                self.confirm_delete = true;
                Action::None
            }
            KeyCode::Esc | KeyCode::Char('q') => Action::Navigate(Screen::Dashboard),
            _ => Action::None,
        }
    }
}

fn detail_lines(state: &TripDetailState, trip: &Trip) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().add_modifier(Modifier::BOLD);
    let row = |name: &'static str, text: String| {
        Line::from(vec![
            Span::styled(format!("{name:<12}"), label),
            Span::styled(text, value),
        ])
    };

    let status_color = if trip.status.is_visited() {
        Color::Green
    } else {
        Color::Blue
    };
    let mut lines = vec![
        row(
            "Country",
            trip.city
                .as_ref()
                .and_then(|c| c.country.clone())
                .unwrap_or_else(|| "-".to_string()),
        ),
        row("Dates", format_date_range(trip)),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Status"), label),
            Span::styled(
                trip.status.label(),
                Style::default()
                    .fg(status_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        row("Duration", format_days(trip.duration_days())),
    ];
    if trip.status.is_visited() {
        if let Some(rating) = trip.rating() {
            lines.push(row(
                "Rating",
                format!("{} ({}/5)", rating.stars(), rating.get()),
            ));
        }
        if let Some(remark) = trip.remark() {
            lines.push(row("Remark", remark.to_string()));
        }
    }
    lines.push(row(
        "Cover image",
        state.cover_image().unwrap_or("(none)").to_string(),
    ));
    lines
}

/// Renders the trip detail screen.
#[mutants::skip]
pub fn draw_trip_detail(state: &TripDetailState, frame: &mut Frame, area: Rect) {
    let title = state
        .trip()
        .map(|t| format!(" {} ", t.city_name().unwrap_or("Unknown Destination")))
        .unwrap_or_else(|| " Trip ".to_string());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [content_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    match state.trip() {
        Some(trip) => {
            let paragraph =
                Paragraph::new(detail_lines(state, trip)).wrap(Wrap { trim: false });
            frame.render_widget(paragraph, content_area);
        }
        None => {
            let loading = Paragraph::new("Loading trip...").alignment(Alignment::Center);
            frame.render_widget(loading, content_area);
        }
    }

    let footer = if state.is_confirming_delete() {
        Paragraph::new("Delete this trip permanently? y: confirm  any other key: cancel")
            .style(Style::default().fg(Color::Red))
    } else {
        Paragraph::new("e: edit  d: delete  Esc: back").style(Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(footer, footer_area);
}
