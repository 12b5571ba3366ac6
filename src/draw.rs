use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::form::FormView;
use crate::components::popup::{ConfirmPopup, Toast};
use crate::components::selector::SelectorView;
use crate::state::app_state::Overlay;
use crate::state::dashboard::Dashboard;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::{LayoutAreas, centered};
use liga_api::{Entity, EntityKind};

const HELP_TEXT: &str = "\
Dashboards
  1-6        cambiar de entidad
  j/k        mover el cursor
  espacio    marcar para eliminar
  d          eliminar los marcados
  n          crear
  Enter / e  editar la fila
  /          buscar (Tab cambia el modo, Esc limpia)
  r          recargar

Formularios
  Tab / flechas  cambiar de campo
  Enter          abrir el selector del campo
  Supr           limpiar el campo relacionado
  Ctrl+S         guardar
  Esc            cerrar

General
  \"  registro    f  pantalla completa    ?  ayuda    q  salir";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Dashboard(kind) => draw_dashboard(f, layout.main, app.dashboard(kind)),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }

        match &app.state.overlay {
            Some(Overlay::Form(screen)) => {
                f.render_widget(FormView { form: &screen.form }, centered(layout.main, 70, 80));
                if let Some(open) = &screen.selector {
                    f.render_widget(
                        SelectorView { selector: &open.selector },
                        centered(layout.main, 55, 70),
                    );
                }
            }
            Some(Overlay::ConfirmDelete { kind, codes }) => f.render_widget(
                ConfirmPopup {
                    title: "Eliminar",
                    message: app.dashboard(*kind).schema.delete_prompt,
                    count: codes.len(),
                },
                centered(layout.main, 50, 30),
            ),
            None => {}
        }

        if let Some(note) = &app.state.toast.current {
            let area = f.area();
            let toast_area = Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1);
            f.render_widget(Toast { note }, toast_area);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Dashboard(kind) => EntityKind::ALL.iter().position(|k| *k == kind).unwrap_or(0),
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = EntityKind::ALL
        .iter()
        .enumerate()
        .map(|(i, k)| Line::from(format!("{} {}", i + 1, k.plural())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Ayuda: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_dashboard(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let kind = dashboard.kind();
    let title = if dashboard.has_marks() {
        format!(" Dashboard de {} ({}, {} marcados) ", kind.plural(), dashboard.len(), dashboard.marked_count())
    } else {
        format!(" Dashboard de {} ({}) ", kind.plural(), dashboard.len())
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [search, list, detail] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(4),
    ])
    .areas(inner);

    let dim = Style::default().fg(Color::DarkGray);
    let search_line = if dashboard.query.is_empty() && !dashboard.searching {
        Line::from(Span::styled(format!("/ {}", dashboard.search_mode().placeholder()), dim))
    } else {
        let cursor = if dashboard.searching { "_" } else { "" };
        Line::from(format!("/ {}{cursor}", dashboard.query))
    };
    f.render_widget(Paragraph::new(search_line), search);

    let visible = dashboard.visible();
    if visible.is_empty() {
        let msg = match (&dashboard.last_error, dashboard.loaded) {
            (Some(err), _) => format!("No se pudo cargar la lista:\n{err}"),
            (None, false) => "Cargando...".to_string(),
            (None, true) => "No hay elementos".to_string(),
        };
        f.render_widget(Paragraph::new(msg).style(dim).alignment(Alignment::Center), list);
        return;
    }

    let rows = list.height as usize;
    let skip = (dashboard.cursor + 1).saturating_sub(rows);
    let lines: Vec<Line> = visible
        .iter()
        .enumerate()
        .skip(skip)
        .take(rows)
        .map(|(idx, record)| {
            let mark = if dashboard.is_marked(record) { "[x]" } else { "[ ]" };
            let style = if idx == dashboard.cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!("{mark} {}", record.label()), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list);

    let detail_lines: Vec<Line> = dashboard
        .detail()
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::Gray))))
        .collect();
    f.render_widget(
        Paragraph::new(detail_lines).block(Block::default().borders(Borders::TOP)),
        detail,
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Ayuda ");
    f.render_widget(Paragraph::new(HELP_TEXT).block(block), area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Registro "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Gray));
    f.render_widget(logs, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
