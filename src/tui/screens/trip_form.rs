//! Trip form screen — add or edit a trip, with city suggestions.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use crate::form::{FieldEdit, SearchState, TripForm};
use crate::model::{ImageFile, Rating, Trip, TripField, ValidationError};
use crate::tui::action::{Action, ScreenState};
use crate::tui::widgets::form::{FORM_ROW_HEIGHT, Form, FormField, draw_form};

const CITY: usize = 0;
const START: usize = 1;
const END: usize = 2;
const STATUS: usize = 3;
const RATING: usize = 4;
const REMARK: usize = 5;
const IMAGE: usize = 6;

const ALT_SHIFT: KeyModifiers = KeyModifiers::ALT.union(KeyModifiers::SHIFT);

/// State for the trip form screen.
///
/// The text widgets mirror the [`TripForm`] draft; every keystroke is pushed
/// through the controller so its enablement rules apply.
#[derive(Debug)]
pub struct TripFormState {
    form: TripForm,
    fields: Form,
    image_error: Option<String>,
}

impl Default for TripFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl TripFormState {
    pub fn new() -> Self {
        let mut state = Self {
            form: TripForm::new(),
            fields: Form::new(vec![
                FormField::new("Destination", true),
                FormField::new("Start date (YYYY-MM-DD)", true),
                FormField::new("End date (YYYY-MM-DD)", true),
                FormField::new("Status (Space to toggle)", false),
                FormField::new("Rating (←/→)", false),
                FormField::new("Personal remark", false),
                FormField::new("Cover image path (Enter to load)", false),
            ]),
            image_error: None,
        };
        state.sync_from_draft();
        state
    }

    /// Seeds the screen for a new trip or for editing `existing`.
    pub fn open(&mut self, existing: Option<&Trip>) {
        self.form.initialize(existing);
        self.fields.reset();
        self.image_error = None;
        self.sync_from_draft();
    }

    /// Discards the draft and releases its preview.
    pub fn close(&mut self) {
        self.form.close();
        self.fields.reset();
        self.image_error = None;
        self.sync_from_draft();
    }

    pub fn form(&self) -> &TripForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TripForm {
        &mut self.form
    }

    pub fn fields(&self) -> &Form {
        &self.fields
    }

    pub fn image_error(&self) -> Option<&str> {
        self.image_error.as_deref()
    }

    /// Applies an image read from disk, or reports why it was rejected.
    pub fn image_loaded(&mut self, result: Result<ImageFile, std::io::Error>) {
        self.image_error = match result {
            Ok(image) => self.form.set_image(image).err().map(|e| e.to_string()),
            Err(e) => Some(format!("Could not read image: {e}")),
        };
    }

    /// Copies draft values into the widgets and refreshes enablement.
    fn sync_from_draft(&mut self) {
        let draft = self.form.draft();
        let values = [
            (CITY, draft.city_name().to_string()),
            (START, draft.start_date().to_string()),
            (END, draft.end_date().to_string()),
            (REMARK, draft.personal_remark().to_string()),
        ];
        for (index, value) in values {
            self.fields.set_value(index, value);
        }
        self.sync_selectors();
    }

    fn sync_selectors(&mut self) {
        let draft = self.form.draft();
        let status = draft.status().label();
        let rating = draft
            .rating()
            .map(|r| r.stars())
            .unwrap_or_else(|| "not rated".to_string());
        self.fields.set_value(STATUS, status);
        self.fields.set_value(RATING, rating);
        for (index, field) in [
            (RATING, TripField::Rating),
            (REMARK, TripField::PersonalRemark),
            (IMAGE, TripField::Image),
        ] {
            self.fields.set_disabled(index, !self.form.is_enabled(field));
        }
    }

    fn apply(&mut self, edit: FieldEdit) -> Action {
        let index = self.fields.focus();
        match self.form.set_field(edit) {
            Ok(Some(query)) => Action::SearchCities(query),
            Ok(None) => Action::None,
            Err(e) => {
                self.fields.set_error(index, e.to_string());
                Action::None
            }
        }
    }

    fn toggle_status(&mut self) -> Action {
        let next = self.form.draft().status().toggled();
        let action = self.apply(FieldEdit::Status(next));
        self.sync_selectors();
        action
    }

    fn cycle_rating(&mut self, forward: bool) -> Action {
        if !self.form.is_enabled(TripField::Rating) {
            return Action::None;
        }
        let next = Rating::cycle(self.form.draft().rating(), forward);
        let action = self.apply(FieldEdit::Rating(next));
        self.sync_selectors();
        action
    }

    /// Pushes the focused text widget's value into the draft.
    fn push_text(&mut self) -> Action {
        let focus = self.fields.focus();
        let value = self.fields.value(focus).to_string();
        self.fields.clear_errors();
        let edit = match focus {
            CITY => FieldEdit::CityName(value),
            START => FieldEdit::StartDate(value),
            END => FieldEdit::EndDate(value),
            REMARK => FieldEdit::PersonalRemark(value),
            _ => return Action::None,
        };
        self.apply(edit)
    }

    fn handle_text(&mut self, key: KeyEvent) -> Action {
        if self.fields.is_disabled(self.fields.focus()) {
            return Action::None;
        }
        match key.code {
            KeyCode::Char(ch) => self.fields.insert_char(ch),
            KeyCode::Backspace => self.fields.delete_char(),
            _ => return Action::None,
        }
        if self.fields.focus() == IMAGE {
            self.image_error = None;
            return Action::None;
        }
        self.push_text()
    }

    /// Keys that drive the open suggestion dropdown. Returns `None` when the
    /// key is not meant for it.
    fn handle_dropdown(&mut self, key: KeyEvent) -> Option<Action> {
        if self.fields.focus() != CITY || !self.form.autocomplete().is_open() {
            return None;
        }
        match key.code {
            KeyCode::Down => self.form.autocomplete_mut().highlight_next(),
            KeyCode::Up => self.form.autocomplete_mut().highlight_prev(),
            KeyCode::Enter if self.form.autocomplete().highlighted().is_some() => {
                self.form.select_highlighted();
                self.fields
                    .set_value(CITY, self.form.draft().city_name().to_string());
            }
            KeyCode::Esc => self.form.autocomplete_mut().reset(),
            _ => return None,
        }
        Some(Action::None)
    }

    fn submit(&mut self) -> Action {
        if self.fields.focus() == IMAGE {
            let path = self.fields.value(IMAGE).trim();
            if !path.is_empty() {
                return Action::LoadImage(PathBuf::from(path));
            }
        }
        if self.form.is_in_flight() {
            return Action::None;
        }
        self.fields.clear_errors();
        if let Err(e) = self.form.validate() {
            let index = field_index(&e);
            self.fields.set_error(index, e.to_string());
            self.fields.set_focus(index);
        }
        Action::SubmitTrip
    }
}

/// Which widget a validation error belongs to.
fn field_index(error: &ValidationError) -> usize {
    let field = match error {
        ValidationError::MissingRequiredField(field)
        | ValidationError::InvalidDate { field, .. }
        | ValidationError::FieldDisabled(field) => *field,
        ValidationError::InvalidDateRange { .. } => TripField::EndDate,
        ValidationError::InvalidRating(_) => TripField::Rating,
        ValidationError::UnknownStatus(_) => TripField::Status,
    };
    match field {
        TripField::CityName => CITY,
        TripField::StartDate => START,
        TripField::EndDate => END,
        TripField::Status => STATUS,
        TripField::Rating => RATING,
        TripField::PersonalRemark => REMARK,
        TripField::Image => IMAGE,
    }
}

impl ScreenState for TripFormState {
    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers == KeyModifiers::ALT {
            match key.code {
                KeyCode::Char('s') => return self.toggle_status(),
                KeyCode::Char('r') => return self.cycle_rating(true),
                _ => {}
            }
        }
        if key.modifiers == ALT_SHIFT && key.code == KeyCode::Char('R') {
            return self.cycle_rating(false);
        }
        if let Some(action) = self.handle_dropdown(key) {
            return action;
        }

        match (self.fields.focus(), key.code) {
            (_, KeyCode::Tab) => {
                self.fields.focus_next();
                Action::None
            }
            (_, KeyCode::BackTab) => {
                self.fields.focus_prev();
                Action::None
            }
            (_, KeyCode::Esc) => Action::CloseForm,
            (_, KeyCode::Enter) => self.submit(),
            (STATUS, KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => self.toggle_status(),
            (RATING, KeyCode::Right | KeyCode::Char('+') | KeyCode::Char(' ')) => {
                self.cycle_rating(true)
            }
            (RATING, KeyCode::Left | KeyCode::Char('-')) => self.cycle_rating(false),
            (STATUS | RATING, _) => Action::None,
            (_, KeyCode::Char(_) | KeyCode::Backspace) => self.handle_text(key),
            _ => Action::None,
        }
    }
}

/// Renders the trip form screen.
#[mutants::skip]
pub fn draw_trip_form(state: &TripFormState, frame: &mut Frame, area: Rect) {
    let title = if state.form().is_editing() {
        " Edit Trip "
    } else {
        " Plan New Trip "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let fields_height = FORM_ROW_HEIGHT * state.fields().fields().len() as u16;
    let [form_area, preview_area, error_area, _spacer, footer_area] = Layout::vertical([
        Constraint::Length(fields_height),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    draw_form(state.fields(), frame, form_area);

    let preview = state
        .form()
        .draft()
        .preview()
        .map(|p| p.url())
        .unwrap_or_else(|| "(none)".to_string());
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Cover image: ", Style::default().fg(Color::DarkGray)),
            Span::raw(preview),
        ])),
        preview_area,
    );

    if let Some(err) = state.form().error().or(state.image_error()) {
        let error = Paragraph::new(Span::styled(err, Style::default().fg(Color::Red)));
        frame.render_widget(error, error_area);
    }

    let footer_text = if state.form().is_in_flight() {
        "Processing..."
    } else {
        "Tab: next  Enter: save  Alt+s: status  Alt+r: rating  Esc: cancel"
    };
    frame.render_widget(
        Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray)),
        footer_area,
    );

    if state.fields().focus() == CITY {
        draw_dropdown(state, frame, form_area);
    }
}

#[mutants::skip]
fn draw_dropdown(state: &TripFormState, frame: &mut Frame, form_area: Rect) {
    let autocomplete = state.form().autocomplete();
    let items: Vec<ListItem> = match autocomplete.state() {
        SearchState::Idle => return,
        SearchState::Searching => vec![ListItem::new("Searching...")],
        SearchState::Empty => vec![ListItem::new("No cities found")],
        SearchState::Populated => autocomplete
            .suggestions()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let style = if autocomplete.highlighted() == Some(i) {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else {
                    Style::default()
                };
                ListItem::new(s.display()).style(style)
            })
            .collect(),
    };
    let height = (items.len() as u16 + 2).min(form_area.height.saturating_sub(FORM_ROW_HEIGHT));
    let area = Rect {
        x: form_area.x + 2,
        y: form_area.y + FORM_ROW_HEIGHT,
        width: form_area.width.saturating_sub(4),
        height,
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(Span::styled(
                "Suggestions",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(list, area);
}
