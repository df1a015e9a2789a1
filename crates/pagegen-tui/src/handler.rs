use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, Focus};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(w, h) => log::debug!("terminal resized to {}x{}", w, h),
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Generation(outcome) => app.on_generation(outcome),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // A notice blocks until acknowledged
    if app.notice.is_some() {
        app.dismiss_notice();
        return;
    }

    if ctrl {
        match key.code {
            KeyCode::Char('g') => app.generate(),
            KeyCode::Char('y') => app.copy_result(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Tab => {
            app.focus_next();
            return;
        }
        KeyCode::BackTab => {
            app.focus_prev();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Idea => handle_idea(app, key),
        Focus::Category => handle_category(app, key),
        Focus::Generate => handle_generate_button(app, key),
        Focus::Preview | Focus::Source => handle_result_pane(app, key),
    }
}

fn handle_idea(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.generate(),
        KeyCode::Esc => app.focus = Focus::Category,
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Keys shared by every field except the idea input, where they are text.
fn handle_command_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') => app.copy_result(),
        KeyCode::Char('e') => app.export_preview(),
        KeyCode::Char('i') | KeyCode::Char('/') => app.focus = Focus::Idea,
        _ => return false,
    }
    true
}

fn handle_category(app: &mut App, key: KeyEvent) {
    if handle_command_key(app, key) {
        return;
    }
    match key.code {
        KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => app.prev_category(),
        KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') | KeyCode::Char(' ') => {
            app.next_category()
        }
        _ => {}
    }
}

fn handle_generate_button(app: &mut App, key: KeyEvent) {
    if handle_command_key(app, key) {
        return;
    }
    if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
        app.generate();
    }
}

fn handle_result_pane(app: &mut App, key: KeyEvent) {
    if handle_command_key(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_top(),
        _ => {}
    }
}
