use crate::app::{App, MenuItem};
use crate::state::app_state::Overlay;
use crate::state::dashboard::Dashboard;
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use liga_api::EntityKind;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
        crate::cleanup_terminal();
        std::process::exit(0);
    }

    let request = match input_target(&guard) {
        Target::Selector => {
            handle_selector_keys(key_event, &mut guard);
            None
        }
        Target::Form => handle_form_keys(key_event, &mut guard),
        Target::Confirm => handle_confirm_keys(key_event, &mut guard),
        Target::Dashboard => handle_dashboard_keys(key_event, &mut guard),
    };

    drop(guard);
    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
}

/// The topmost thing on screen receives the key.
enum Target {
    Selector,
    Form,
    Confirm,
    Dashboard,
}

fn input_target(app: &App) -> Target {
    match &app.state.overlay {
        Some(Overlay::Form(_)) if app.has_open_selector() => Target::Selector,
        Some(Overlay::Form(_)) => Target::Form,
        Some(Overlay::ConfirmDelete { .. }) => Target::Confirm,
        None => Target::Dashboard,
    }
}

fn on_dashboard(app: &mut App, action: impl FnOnce(&mut Dashboard)) -> Option<NetworkRequest> {
    if let Some(dashboard) = app.active_dashboard_mut() {
        action(dashboard);
    }
    None
}

fn handle_selector_keys(key_event: KeyEvent, app: &mut App) {
    match key_event.code {
        Char('j') | KeyCode::Down => app.selector_down(),
        Char('k') | KeyCode::Up => app.selector_up(),
        Char(' ') => app.selector_toggle(),
        KeyCode::Enter => app.selector_accept(),
        KeyCode::Esc => app.cancel_overlay(),
        _ => {}
    }
}

fn handle_form_keys(key_event: KeyEvent, app: &mut App) -> Option<NetworkRequest> {
    match (key_event.code, key_event.modifiers) {
        (Char('s'), KeyModifiers::CONTROL) => return app.form_submit(),
        (KeyCode::Esc, _) => app.cancel_overlay(),
        (KeyCode::Tab | KeyCode::Down, _) => app.form_focus_next(),
        (KeyCode::BackTab | KeyCode::Up, _) => app.form_focus_prev(),
        (KeyCode::Enter, _) => return app.form_activate(),
        (KeyCode::Delete, _) => app.form_clear_relation(),
        (KeyCode::Backspace, _) => app.form_backspace(),
        (Char(c), _) => app.form_type_char(c),
        _ => {}
    }
    None
}

fn handle_confirm_keys(key_event: KeyEvent, app: &mut App) -> Option<NetworkRequest> {
    match key_event.code {
        Char('y') | KeyCode::Enter => app.confirm_delete(),
        Char('n') | KeyCode::Esc => {
            app.cancel_overlay();
            None
        }
        _ => None,
    }
}

fn handle_dashboard_keys(key_event: KeyEvent, app: &mut App) -> Option<NetworkRequest> {
    if let Some(dashboard) = app.active_dashboard_mut()
        && dashboard.searching
    {
        match key_event.code {
            KeyCode::Esc => dashboard.clear_query(),
            KeyCode::Enter => dashboard.searching = false,
            KeyCode::Tab => dashboard.cycle_search_mode(),
            KeyCode::Backspace => dashboard.pop_query(),
            Char(c) => dashboard.push_query(c),
            _ => {}
        }
        return None;
    }

    match (app.state.active_tab, key_event.code) {
        (_, Char('q')) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char(c @ '1'..='6')) => {
            let index = c as usize - '1' as usize;
            EntityKind::ALL.get(index).and_then(|kind| app.update_tab(MenuItem::Dashboard(*kind)))
        }
        (_, Char('?')) => app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc) => {
            app.exit_help();
            None
        }

        // Dashboard
        (MenuItem::Dashboard(_), Char('j') | KeyCode::Down) => on_dashboard(app, Dashboard::cursor_down),
        (MenuItem::Dashboard(_), Char('k') | KeyCode::Up) => on_dashboard(app, Dashboard::cursor_up),
        (MenuItem::Dashboard(_), Char(' ')) => on_dashboard(app, Dashboard::toggle_mark),
        (MenuItem::Dashboard(_), Char('/')) => on_dashboard(app, |d| d.searching = true),
        (MenuItem::Dashboard(_), KeyCode::Tab) => on_dashboard(app, Dashboard::cycle_search_mode),
        (MenuItem::Dashboard(_), KeyCode::Esc) => on_dashboard(app, Dashboard::clear_query),
        (MenuItem::Dashboard(_), Char('n')) => {
            app.open_create_form();
            None
        }
        (MenuItem::Dashboard(_), KeyCode::Enter | Char('e')) => app.open_edit_form(),
        (MenuItem::Dashboard(_), Char('d') | KeyCode::Delete) => {
            app.request_delete();
            None
        }
        (MenuItem::Dashboard(_), Char('r')) => app.reload(),

        // Global
        (_, Char('f')) => {
            app.toggle_full_screen();
            None
        }
        (_, Char('"')) => {
            app.toggle_show_logs();
            None
        }

        _ => None,
    }
}
