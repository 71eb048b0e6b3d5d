//! Dashboard screen — the logged-in user's trips.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::model::{Trip, TripId};
use crate::tui::action::{Action, ScreenState};

use super::trip_detail::{format_date_range, format_days};

/// State for the dashboard screen.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    trips: Vec<Trip>,
    /// Index of the highlighted trip, or `None` if the list is empty.
    selected: Option<usize>,
    loading: bool,
    /// Trip awaiting delete confirmation.
    pending_delete: Option<TripId>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the list as being (re)loaded.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replaces the trip list, keeping the selection in range.
    pub fn set_trips(&mut self, trips: Vec<Trip>) {
        self.trips = trips;
        self.loading = false;
        self.clamp_selection();
    }

    /// Drops a deleted trip from the list.
    pub fn remove(&mut self, trip_id: TripId) {
        self.trips.retain(|t| t.trip_id != trip_id);
        self.clamp_selection();
    }

    /// Forgets all trips, e.g. on logout.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    /// Looks up a listed trip by id.
    pub fn trip(&self, trip_id: TripId) -> Option<&Trip> {
        self.trips.iter().find(|t| t.trip_id == trip_id)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_trip(&self) -> Option<&Trip> {
        self.selected.and_then(|i| self.trips.get(i))
    }

    pub fn pending_delete(&self) -> Option<TripId> {
        self.pending_delete
    }

    fn clamp_selection(&mut self) {
        self.selected = match (self.selected, self.trips.len()) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), len) => Some(i.min(len - 1)),
        };
        if self
            .pending_delete
            .is_some_and(|id| self.trip(id).is_none())
        {
            self.pending_delete = None;
        }
    }

    fn selected_action(&self, make: fn(TripId) -> Action) -> Action {
        self.selected_trip()
            .map_or(Action::None, |trip| make(trip.trip_id))
    }
}

impl ScreenState for DashboardState {
    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if let Some(trip_id) = self.pending_delete.take() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Action::DeleteTrip(trip_id),
                _ => Action::None,
            };
        }

        let len = self.trips.len();
        match key.code {
            KeyCode::Up => {
                self.selected = self.selected.map(|i| i.saturating_sub(1));
                Action::None
            }
            KeyCode::Down => {
                self.selected = self.selected.map(|i| (i + 1).min(len.saturating_sub(1)));
                Action::None
            }
            KeyCode::Home => {
                self.selected = (len > 0).then_some(0);
                Action::None
            }
            KeyCode::End => {
                self.selected = len.checked_sub(1);
                Action::None
            }
            KeyCode::Enter => self.selected_action(Action::OpenTrip),
            KeyCode::Char('n') => Action::NewTrip,
            KeyCode::Char('e') => self.selected_action(Action::EditTrip),
            KeyCode::Char('d') => {
                self.pending_delete = self.selected_trip().map(|t| t.trip_id);
                Action::None
            }
            KeyCode::Char('r') => Action::RefreshTrips,
            KeyCode::Char('L') => Action::Logout,
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            _ => Action::None,
        }
    }
}

fn trip_row(trip: &Trip) -> Vec<String> {
    let rating = trip
        .rating()
        .filter(|_| trip.status.is_visited())
        .map(|r| r.stars())
        .unwrap_or_default();
    vec![
        trip.city_name().unwrap_or("Unknown Destination").to_string(),
        format_date_range(trip),
        trip.status.label().to_string(),
        format_days(trip.duration_days()),
        rating,
    ]
}

/// Renders the dashboard screen.
#[mutants::skip]
pub fn draw_dashboard(state: &DashboardState, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" My Trips ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [table_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    if state.trips().is_empty() {
        let message = if state.is_loading() {
            "Loading trips..."
        } else {
            "No trips yet. Press 'n' to plan your first destination!"
        };
        let lines = vec![Line::from(""), Line::from(message)];
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            table_area,
        );
    } else {
        let header = Row::new(vec!["Destination", "Dates", "Status", "Duration", "Rating"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let rows: Vec<Row> = state
            .trips()
            .iter()
            .enumerate()
            .map(|(i, trip)| {
                let style = if state.selected() == Some(i) {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else {
                    Style::default()
                };
                Row::new(trip_row(trip)).style(style)
            })
            .collect();

        let widths = [
            Constraint::Min(16),
            Constraint::Length(25),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(6),
        ];
        frame.render_widget(Table::new(rows, widths).header(header), table_area);
    }

    let footer = match state.pending_delete().and_then(|id| state.trip(id)) {
        Some(trip) => Paragraph::new(format!(
            "Delete trip to {}? y: confirm  any other key: cancel",
            trip.city_name().unwrap_or("Unknown Destination")
        ))
        .style(Style::default().fg(Color::Red)),
        None => Paragraph::new(
            "↑/↓: move  Enter: details  n: new  e: edit  d: delete  r: refresh  L: logout  q: quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, footer_area);
}
