use crate::state::form::{Form, Input};
use tui::buffer::Buffer;
use tui::layout::{Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};

pub struct FormView<'a> {
    pub form: &'a Form,
}

impl<'a> Widget for FormView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let form = self.form;
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", form.title()));
        let inner = block.inner(area);
        block.render(area, buf);

        let [fields, status, hint] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();
        for (idx, spec) in form.schema.fields.iter().enumerate() {
            let focused = idx == form.focus;
            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let value = match spec.input {
                Input::Relation(_) => {
                    let field = form.relation_field(spec.id);
                    let text = field
                        .map(|f| f.trigger_text(spec.placeholder))
                        .unwrap_or_default();
                    if form.is_locked(spec.id) {
                        Span::styled(format!("{text} (bloqueado)"), dim)
                    } else if form.is_set(spec.id) {
                        Span::raw(text)
                    } else {
                        Span::styled(text, dim)
                    }
                }
                _ => {
                    let text = form.text(spec.id);
                    if text.is_empty() {
                        Span::styled(spec.placeholder.to_owned(), dim)
                    } else {
                        Span::raw(text.to_owned())
                    }
                }
            };
            let cursor = if focused && !spec.is_relation() { "_" } else { "" };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{}: ", spec.label), label_style),
                value,
                Span::raw(cursor),
            ]));

            if let Some(error) = form.error(spec.id) {
                lines.push(Line::from(Span::styled(
                    format!("    {error}"),
                    Style::default().fg(Color::Red),
                )));
            } else if focused
                && spec.is_relation()
                && let Some(reason) = form.blocked_reason(spec.id)
            {
                lines.push(Line::from(Span::styled(
                    format!("    {reason}"),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        if let Some(derived) = form.schema.derived {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", derived.label), Style::default().fg(Color::Cyan)),
                Span::raw(form.derived.to_string()),
            ]));
        }
        Paragraph::new(lines).render(fields, buf);

        let state = if form.resolving {
            "Cargando datos relacionados..."
        } else if form.submitting {
            "Guardando..."
        } else {
            ""
        };
        Paragraph::new(state).style(dim).render(status, buf);
        Paragraph::new("Tab campo  Enter seleccionar  Supr limpiar  Ctrl+S guardar  Esc cerrar")
            .style(dim)
            .render(hint, buf);
    }
}
