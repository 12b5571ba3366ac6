use crate::state::notifications::{Level, Notification};
use tui::buffer::Buffer;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap};

/// Yes/no confirmation for a destructive action.
pub struct ConfirmPopup<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub count: usize,
}

impl<'a> Widget for ConfirmPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Red))
            .title(format!(" {} ", self.title));
        let inner = block.inner(area);
        block.render(area, buf);

        let [message, hint] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
        Paragraph::new(vec![
            Line::from(self.message),
            Line::from(""),
            Line::from(Span::styled(
                format!("{} elemento(s) seleccionado(s)", self.count),
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(message, buf);
        Paragraph::new(Line::from(vec![
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" eliminar   "),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancelar"),
        ]))
        .alignment(Alignment::Center)
        .render(hint, buf);
    }
}

/// One-line flash message pinned to the bottom of the screen.
pub struct Toast<'a> {
    pub note: &'a Notification,
}

impl<'a> Widget for Toast<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = match self.note.level {
            Level::Info => Color::Blue,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        };
        Clear.render(area, buf);
        Paragraph::new(format!(" {} ", self.note.message))
            .style(Style::default().fg(Color::Black).bg(color))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
