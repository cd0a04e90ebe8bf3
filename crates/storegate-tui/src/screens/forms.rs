//! Login and registration forms built on `tui-input`.
//!
//! The forms collect credentials and hand them to the app, which drives
//! the gate; they never touch session state themselves.

use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

/// What the app should do with a completed form.
pub struct LoginSubmit {
    pub email: String,
    pub password: String,
}

pub struct RegisterSubmit {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

// ── Login form ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct LoginForm {
    email: Input,
    password: Input,
    focus: usize,
}

impl LoginForm {
    /// Feed a key into the form. Returns a submit request when the user
    /// confirms with all fields filled.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<LoginSubmit> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % 2;
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + 1) % 2;
                None
            }
            KeyCode::Enter => {
                if self.email.value().is_empty() || self.password.value().is_empty() {
                    return None;
                }
                let submit = LoginSubmit {
                    email: self.email.value().to_owned(),
                    password: self.password.value().to_owned(),
                };
                self.password = Input::default();
                Some(submit)
            }
            _ => {
                let field = if self.focus == 0 {
                    &mut self.email
                } else {
                    &mut self.password
                };
                field.handle_event(&CrosstermEvent::Key(key));
                None
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, busy: bool) {
        let block = Block::default()
            .title("Sign in")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

        render_field(frame, rows[0], "Email   ", self.email.value(), self.focus == 0);
        let masked = "*".repeat(self.password.value().chars().count());
        render_field(frame, rows[1], "Password", &masked, self.focus == 1);

        let hint = if busy {
            "signing in…"
        } else {
            "Enter submit · Tab switch field · Esc back to shop"
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                hint,
                Style::default().add_modifier(Modifier::DIM),
            ))),
            rows[3],
        );
    }
}

// ── Register form ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RegisterForm {
    user_name: Input,
    email: Input,
    password: Input,
    focus: usize,
}

impl RegisterForm {
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<RegisterSubmit> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % 3;
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + 2) % 3;
                None
            }
            KeyCode::Enter => {
                if self.user_name.value().is_empty()
                    || self.email.value().is_empty()
                    || self.password.value().is_empty()
                {
                    return None;
                }
                let submit = RegisterSubmit {
                    user_name: self.user_name.value().to_owned(),
                    email: self.email.value().to_owned(),
                    password: self.password.value().to_owned(),
                };
                self.password = Input::default();
                Some(submit)
            }
            _ => {
                let field = match self.focus {
                    0 => &mut self.user_name,
                    1 => &mut self.email,
                    _ => &mut self.password,
                };
                field.handle_event(&CrosstermEvent::Key(key));
                None
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, busy: bool) {
        let block = Block::default()
            .title("Create account")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

        render_field(frame, rows[0], "Name    ", self.user_name.value(), self.focus == 0);
        render_field(frame, rows[1], "Email   ", self.email.value(), self.focus == 1);
        let masked = "*".repeat(self.password.value().chars().count());
        render_field(frame, rows[2], "Password", &masked, self.focus == 2);

        let hint = if busy {
            "creating account…"
        } else {
            "Enter submit · Tab switch field · Esc back to shop"
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                hint,
                Style::default().add_modifier(Modifier::DIM),
            ))),
            rows[4],
        );
    }
}

// ── Shared field rendering ──────────────────────────────────────────

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let marker = if focused { "▸" } else { " " };
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let cursor = if focused { "▏" } else { "" };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(format!("{marker} {label} ")),
            Span::styled(format!("{value}{cursor}"), style),
        ])),
        area,
    );
}
