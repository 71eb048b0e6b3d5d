//! Help screen — scrollable keybinding reference.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::tui::action::{Action, ScreenState};
use crate::tui::app::Screen;

static LOGIN_KEYS: &[(&str, &str)] = &[
    ("Tab / Shift-Tab", "next / prev field"),
    ("Enter", "sign in"),
    ("F2", "create an account"),
    ("Esc", "quit"),
    ("F1", "help"),
];

static REGISTER_KEYS: &[(&str, &str)] = &[
    ("Tab / Shift-Tab", "next / prev field"),
    ("Enter", "create account"),
    ("F2 / Esc", "back to sign in"),
    ("F1", "help"),
];

static DASHBOARD_KEYS: &[(&str, &str)] = &[
    ("↑/↓", "navigate"),
    ("Home / End", "first / last"),
    ("Enter", "open trip"),
    ("n", "plan a new trip"),
    ("e", "edit trip"),
    ("d", "delete trip (y to confirm)"),
    ("r", "reload trips"),
    ("L", "sign out"),
    ("q / Esc", "quit"),
    ("F1", "help"),
];

static TRIP_DETAIL_KEYS: &[(&str, &str)] = &[
    ("e", "edit trip"),
    ("d", "delete trip (y to confirm)"),
    ("q / Esc", "back to trips"),
    ("F1", "help"),
];

static TRIP_FORM_KEYS: &[(&str, &str)] = &[
    ("Tab / Shift-Tab", "next / prev field"),
    ("↑/↓", "move through city suggestions"),
    ("Enter", "pick suggestion, load image, or save"),
    ("Space", "toggle status / next rating"),
    ("←/→", "change status or rating"),
    ("Alt+s", "toggle status"),
    ("Alt+r", "next rating"),
    ("Shift+Alt+R", "prev rating"),
    ("Esc", "close suggestions, then cancel"),
    ("F1", "help"),
];

static HELP_KEYS: &[(&str, &str)] = &[("↑/↓", "scroll"), ("q / Esc", "back")];

/// State for the help screen.
#[derive(Debug, Clone)]
pub struct HelpState {
    scroll: u16,
    origin: Screen,
}

impl Default for HelpState {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpState {
    /// Creates a new [`HelpState`] scrolled to the top with origin [`Screen::Login`].
    pub fn new() -> Self {
        Self {
            scroll: 0,
            origin: Screen::Login,
        }
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Returns the screen that opened help.
    pub fn origin(&self) -> Screen {
        self.origin
    }

    /// Sets the screen to return to when help is dismissed.
    pub fn set_origin(&mut self, screen: Screen) {
        self.origin = screen;
    }

    pub fn reset(&mut self) {
        self.scroll = 0;
    }
}

impl ScreenState for HelpState {
    fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                Action::None
            }
            KeyCode::Char('q') | KeyCode::Esc => Action::Navigate(self.origin),
            _ => Action::None,
        }
    }
}

fn screen_name(screen: Screen) -> &'static str {
    match screen {
        Screen::Login => "Sign In",
        Screen::Register => "Create Account",
        Screen::Dashboard => "My Trips",
        Screen::TripDetail => "Trip Details",
        Screen::TripForm => "Trip Form",
        Screen::Help => "Help",
    }
}

fn build_section(title: &'static str, keys: &[(&'static str, &'static str)]) -> Vec<Line<'static>> {
    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let key_style = Style::default().fg(Color::Yellow);
    let dim_style = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, header_style)),
    ];
    for (key, desc) in keys {
        lines.push(Line::from(vec![
            Span::styled(format!("  {key:<20}"), key_style),
            Span::styled(*desc, dim_style),
        ]));
    }
    lines
}

fn help_content(origin: Screen) -> Vec<Line<'static>> {
    let keys = match origin {
        Screen::Login => LOGIN_KEYS,
        Screen::Register => REGISTER_KEYS,
        Screen::Dashboard => DASHBOARD_KEYS,
        Screen::TripDetail => TRIP_DETAIL_KEYS,
        Screen::TripForm => TRIP_FORM_KEYS,
        Screen::Help => HELP_KEYS,
    };
    build_section(screen_name(origin), keys)
}

/// Renders the help screen.
#[mutants::skip]
pub fn draw_help(state: &HelpState, frame: &mut Frame, area: Rect) {
    let title = format!(" Help – {} ", screen_name(state.origin()));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [content_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    let content_lines = help_content(state.origin());
    let total = content_lines.len() as u16;
    let capped_scroll = state
        .scroll()
        .min(total.saturating_sub(content_area.height));

    let paragraph = Paragraph::new(content_lines).scroll((capped_scroll, 0));
    frame.render_widget(paragraph, content_area);

    let footer =
        Paragraph::new("↑/↓: scroll  q/Esc: back").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, footer_area);
}
