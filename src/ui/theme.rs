use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

pub struct Theme;

impl Theme {
    pub const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
    pub const TEXT_SECONDARY: Color = Color::Rgb(175, 175, 175);
    pub const TEXT_MUTED: Color = Color::Rgb(110, 110, 110);
    pub const ACCENT_TEAL: Color = Color::Rgb(80, 200, 210);
    pub const ACCENT_AMBER: Color = Color::Rgb(230, 180, 80);
    pub const ACCENT_ROSE: Color = Color::Rgb(220, 90, 110);
    pub const ACCENT_LAVENDER: Color = Color::Rgb(175, 140, 220);
    pub const BG_SURFACE: Color = Color::Rgb(24, 24, 30);
    pub const BG_ELEVATED: Color = Color::Rgb(40, 40, 50);
    pub const BORDER_DIM: Color = Color::Rgb(70, 70, 80);

    pub fn border() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn border_type() -> BorderType {
        BorderType::Plain
    }

    pub fn border_type_focused() -> BorderType {
        BorderType::Thick
    }

    pub fn panel_bg() -> Style {
        Style::default()
    }

    pub fn panel_bg_focused() -> Style {
        Style::default()
    }

    pub fn title() -> Style {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    }

    pub fn timestamp() -> Style {
        Style::default().fg(Color::Indexed(242))
    }

    pub fn nick_self() -> Style {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    }

    pub fn nick_other() -> Style {
        Style::default().fg(Color::Indexed(255))
    }

    pub fn message_text() -> Style {
        Style::default().fg(Color::Indexed(250))
    }

    pub fn notice_text() -> Style {
        Style::default().fg(Color::Indexed(250))
    }

    pub fn admin_badge() -> Style {
        Style::default().fg(Color::White).bg(Color::Red)
    }

    pub fn admin_text() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn error_message() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn channel_normal() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn channel_active() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
            .bg(Self::BG_ELEVATED)
    }

    pub fn channel_unread() -> Style {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    }

    pub fn input_text() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn counter() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    pub fn counter_full() -> Style {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    }

    pub fn label() -> Style {
        Style::default().fg(Color::Indexed(252))
    }

    pub fn value() -> Style {
        Style::default().fg(Color::Indexed(248))
    }

    pub fn button() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY).bg(Self::BG_ELEVATED)
    }

    pub fn button_focused() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn button_danger_focused() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    }

    pub fn scrollbar_thumb() -> Style {
        Style::default().fg(Self::ACCENT_TEAL)
    }

    pub fn scrollbar_track() -> Style {
        Style::default().fg(Self::BORDER_DIM)
    }

    /// Block styling shared by every panel, depending on focus.
    pub fn panel(focused: bool) -> (Style, BorderType, Style) {
        if focused {
            (
                Self::border_focused(),
                Self::border_type_focused(),
                Self::panel_bg_focused(),
            )
        } else {
            (Self::border(), Self::border_type(), Self::panel_bg())
        }
    }
}
