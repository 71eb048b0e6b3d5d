//! Registration screen — create an account.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::Registration;
use crate::tui::action::{Action, ScreenState};
use crate::tui::app::Screen;
use crate::tui::widgets::form::{Form, FormField, draw_form};

const NAME: usize = 0;
const EMAIL: usize = 1;
const PASSWORD: usize = 2;

/// State for the registration screen.
#[derive(Debug, Clone)]
pub struct RegisterState {
    form: Form,
    error: Option<String>,
    busy: bool,
}

impl Default for RegisterState {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterState {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                FormField::new("Full Name", true),
                FormField::new("Email", true),
                FormField::new("Password", true).masked(),
            ]),
            error: None,
            busy: false,
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shows a failed registration and allows another attempt.
    pub fn set_error(&mut self, msg: String) {
        self.error = Some(msg);
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn submit(&mut self) -> Action {
        if self.busy {
            return Action::None;
        }
        self.form.clear_errors();
        self.error = None;

        let name = self.form.value(NAME).trim().to_string();
        let email = self.form.value(EMAIL).trim().to_string();
        let password = self.form.value(PASSWORD).to_string();
        for (index, value, label) in [
            (NAME, &name, "Name"),
            (EMAIL, &email, "Email"),
            (PASSWORD, &password, "Password"),
        ] {
            if value.is_empty() {
                self.form.set_error(index, format!("{label} is required"));
            }
        }
        if self.form.has_errors() {
            return Action::None;
        }

        self.busy = true;
        Action::Register(Registration {
            name,
            email,
            password,
        })
    }
}

impl ScreenState for RegisterState {
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
            KeyCode::F(2) | KeyCode::Esc => Action::Navigate(Screen::Login),
            _ => Action::None,
        }
    }
}

/// Renders the registration screen.
#[mutants::skip]
pub fn draw_register(state: &RegisterState, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Create Account ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [form_area, error_area, _spacer, footer_area] = Layout::vertical([
        Constraint::Length(9),
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
        "Creating Account..."
    } else {
        "Enter: create account  Tab: next field  Esc: back to sign in"
    };
    let footer = Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, footer_area);
}
