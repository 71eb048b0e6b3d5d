//! Login screen — email and password form.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::Credentials;
use crate::tui::action::{Action, ScreenState};
use crate::tui::app::Screen;
use crate::tui::widgets::form::{Form, FormField, draw_form};

/// Field index for the email address.
const EMAIL: usize = 0;
/// Field index for the password.
const PASSWORD: usize = 1;

/// State for the login screen.
#[derive(Debug, Clone)]
pub struct LoginState {
    form: Form,
    error: Option<String>,
    busy: bool,
}

impl Default for LoginState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginState {
    /// Creates an empty login form.
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                FormField::new("Email", true),
                FormField::new("Password", true).masked(),
            ]),
            error: None,
            busy: false,
        }
    }

    /// Returns a reference to the form for rendering.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Returns the error from the last login attempt, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shows a failed login and allows another attempt.
    pub fn set_error(&mut self, msg: String) {
        self.error = Some(msg);
        self.busy = false;
    }

    /// Returns `true` while a login request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Resets the form to its initial empty state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn submit(&mut self) -> Action {
        if self.busy {
            return Action::None;
        }
        self.form.clear_errors();
        self.error = None;

        let email = self.form.value(EMAIL).trim().to_string();
        let password = self.form.value(PASSWORD).to_string();
        if email.is_empty() {
            self.form.set_error(EMAIL, "Email is required".into());
        }
        if password.is_empty() {
            self.form.set_error(PASSWORD, "Password is required".into());
        }
        if self.form.has_errors() {
            return Action::None;
        }

        self.busy = true;
        Action::Login(Credentials { email, password })
    }
}

impl ScreenState for LoginState {
    fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.form.focus_next();
                Action::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.focus_prev();
                Action::None
            }
            KeyCode::Char(ch) => {
                self.form.insert_char(ch);
                self.error = None;
                Action::None
            }
            KeyCode::Backspace => {
                self.form.delete_char();
                self.error = None;
                Action::None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::F(2) => Action::Navigate(Screen::Register),
            KeyCode::Esc => Action::Quit,
            _ => Action::None,
        }
    }
}

/// Renders the login screen.
#[mutants::skip]
pub fn draw_login(state: &LoginState, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Welcome to roamlog ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [form_area, error_area, _spacer, footer_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    draw_form(state.form(), frame, form_area);

    if let Some(err) = state.error() {
        let error = Paragraph::new(Line::from(Span::styled(
            err,
            Style::default().fg(Color::Red),
        )));
        frame.render_widget(error, error_area);
    }

    let footer_text = if state.is_busy() {
        "Signing In..."
    } else {
        "Enter: sign in  Tab: next field  F2: create account  Esc: quit"
    };
    let footer = Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, footer_area);
}
