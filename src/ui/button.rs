//! Round transport button used on the Now Playing screen.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Paragraph, Widget},
};

pub const ICON_PLAY: &str = "▶";
pub const ICON_PAUSE: &str = "⏸";
pub const ICON_NEXT: &str = "⏭";
pub const ICON_PREV: &str = "⏮";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ButtonSize {
    Small,
    Large,
}

impl ButtonSize {
    /// Width and height in cells, borders included.
    pub fn dimensions(self) -> (u16, u16) {
        match self {
            ButtonSize::Small => (7, 3),
            ButtonSize::Large => (11, 5),
        }
    }
}

/// A rounded box with an icon in the middle.
#[derive(Clone, Debug)]
pub struct TransportButton<'a> {
    icon: &'a str,
    size: ButtonSize,
    accent: Color,
    highlighted: bool,
}

impl<'a> TransportButton<'a> {
    pub fn new(icon: &'a str) -> Self {
        Self {
            icon,
            size: ButtonSize::Small,
            accent: Color::Gray,
            highlighted: false,
        }
    }

    pub fn size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    pub fn accent(mut self, accent: Color) -> Self {
        self.accent = accent;
        self
    }

    /// Filled style, used for the primary play/pause button.
    pub fn highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = highlighted;
        self
    }

    pub fn width(&self) -> u16 {
        self.size.dimensions().0
    }

    pub fn height(&self) -> u16 {
        self.size.dimensions().1
    }
}

impl Widget for TransportButton<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (w, h) = self.size.dimensions();
        let area = Rect {
            x: area.x + area.width.saturating_sub(w) / 2,
            y: area.y + area.height.saturating_sub(h) / 2,
            width: w.min(area.width),
            height: h.min(area.height),
        };

        let style = if self.highlighted {
            Style::default()
                .fg(Color::Black)
                .bg(self.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.accent)
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.accent));
        let inner = block.inner(area);
        block.render(area, buf);

        // Vertically centre the icon inside the border.
        let icon_area = Rect {
            y: inner.y + inner.height.saturating_sub(1) / 2,
            height: inner.height.min(1),
            ..inner
        };
        if self.highlighted {
            buf.set_style(inner, style);
        }
        Paragraph::new(self.icon)
            .style(style)
            .alignment(Alignment::Center)
            .render(icon_area, buf);
    }
}
