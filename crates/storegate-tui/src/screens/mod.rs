//! Screen mapping and placeholder view rendering.
//!
//! The real product's views (catalogs, carts, dashboards) are out of scope
//! here -- each screen is a placeholder panel. What matters is WHICH screen
//! is on display: that is the route guard's decision.

pub mod forms;

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use storegate_core::SessionSnapshot;

/// What the body of the terminal is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Neutral loading view while an identity check is pending.
    Loading,
    Login,
    Register,
    Home,
    Listing,
    Search,
    Checkout,
    Account,
    AdminDashboard,
    AdminOrders,
    Unauthorized,
    NotFound,
}

impl Screen {
    /// Map a path (query ignored) to its view. Unknown paths get the
    /// not-found page -- reaching it is itself a `Render` decision.
    pub fn for_path(path: &str) -> Self {
        let path = path.split('?').next().unwrap_or(path);
        match path {
            "/shop/home" => Self::Home,
            "/shop/listing" => Self::Listing,
            "/shop/search" => Self::Search,
            "/shop/checkout" => Self::Checkout,
            "/shop/account" => Self::Account,
            "/admin/dashboard" => Self::AdminDashboard,
            "/admin/orders" => Self::AdminOrders,
            "/auth/login" => Self::Login,
            "/auth/register" => Self::Register,
            "/unauth-page" => Self::Unauthorized,
            _ => Self::NotFound,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Login => "Sign in",
            Self::Register => "Create account",
            Self::Home => "Storefront",
            Self::Listing => "Products",
            Self::Search => "Search",
            Self::Checkout => "Checkout",
            Self::Account => "My account",
            Self::AdminDashboard => "Admin · Dashboard",
            Self::AdminOrders => "Admin · Orders",
            Self::Unauthorized => "Not authorized",
            Self::NotFound => "Not found",
        }
    }
}

/// Read-only data the placeholder views render from.
pub struct ViewContext<'a> {
    pub snapshot: &'a SessionSnapshot,
    pub cart: &'a [String],
}

/// Render a screen's body into `area`.
pub fn render_body(frame: &mut Frame, area: Rect, screen: Screen, ctx: &ViewContext<'_>) {
    match screen {
        Screen::Loading => render_loading(frame, area),
        Screen::Checkout => render_checkout(frame, area, ctx),
        Screen::Account => render_account(frame, area, ctx),
        Screen::Unauthorized => render_message(
            frame,
            area,
            screen,
            "You don't have access to this page.",
            Color::Red,
        ),
        Screen::NotFound => render_message(
            frame,
            area,
            screen,
            "There is nothing at this address.",
            Color::Yellow,
        ),
        // Login/Register bodies are drawn by the form components; the
        // remaining screens are plain placeholders.
        other => render_placeholder(frame, area, other),
    }
}

/// The neutral pending view: never the protected content, never a flash
/// of the redirect target.
fn render_loading(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let text = Paragraph::new(Line::from(Span::styled(
        "… checking your session …",
        Style::default().add_modifier(Modifier::DIM),
    )))
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(text, area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, screen: Screen) {
    let block = Block::default()
        .title(screen.title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let text = Paragraph::new(vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("[ {} ]", screen.title()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw("placeholder view"),
    ])
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(text, area);
}

fn render_message(frame: &mut Frame, area: Rect, screen: Screen, message: &str, color: Color) {
    let block = Block::default()
        .title(screen.title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let text = Paragraph::new(vec![
        Line::raw(""),
        Line::from(Span::styled(message, Style::default().fg(color))),
    ])
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(text, area);
}

fn render_checkout(frame: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
    let mut lines = vec![Line::raw("Cart (press 'a' to add a sample item):")];
    if ctx.cart.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (empty)",
            Style::default().add_modifier(Modifier::DIM),
        )));
    } else {
        for item in ctx.cart {
            lines.push(Line::raw(format!("  - {item}")));
        }
    }

    let block = Block::default()
        .title(Screen::Checkout.title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_account(frame: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
    let mut lines = Vec::new();
    if let Some(user) = ctx.snapshot.user() {
        lines.push(Line::raw(format!("Signed in as: {}", user.user_name)));
        lines.push(Line::raw(format!("Email:        {}", user.email)));
        if let Some(id) = &user.id {
            lines.push(Line::raw(format!("Customer id:  {id}")));
        }
    }

    let block = Block::default()
        .title(Screen::Account.title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
