use crate::state::selector::EntitySelector;
use liga_api::{Entity, Record};
use tui::buffer::Buffer;
use tui::layout::{Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};

/// Checklist of candidates with the pending selection ticked.
pub struct SelectorView<'a> {
    pub selector: &'a EntitySelector<Record>,
}

impl<'a> Widget for SelectorView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", self.selector.header));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 3 {
            return;
        }

        let [subtitle, list, hint] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(self.selector.subtitle.as_str())
            .style(Style::default().fg(Color::Gray))
            .render(subtitle, buf);

        let dim = Style::default().fg(Color::DarkGray);
        if self.selector.is_loading() {
            Paragraph::new("Cargando...").style(dim).render(list, buf);
        } else if self.selector.items().is_empty() {
            Paragraph::new("No hay elementos disponibles").style(dim).render(list, buf);
        } else {
            // Keep the cursor row on screen.
            let rows = list.height as usize;
            let skip = (self.selector.cursor() + 1).saturating_sub(rows);
            let lines: Vec<Line> = self
                .selector
                .items()
                .iter()
                .enumerate()
                .skip(skip)
                .take(rows)
                .map(|(idx, item)| {
                    let check = if self.selector.is_selected(item) { "[x]" } else { "[ ]" };
                    let style = if idx == self.selector.cursor() {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    Line::from(Span::styled(format!("{check} {}", item.label()), style))
                })
                .collect();
            Paragraph::new(lines).render(list, buf);
        }

        let accept = if self.selector.can_accept() { Style::default() } else { dim };
        Paragraph::new(Line::from(vec![
            Span::styled("Enter aceptar", accept),
            Span::styled("  Espacio marcar  Esc cancelar", dim),
        ]))
        .render(hint, buf);
    }
}
