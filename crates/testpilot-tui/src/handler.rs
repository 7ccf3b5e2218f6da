use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::warn;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;
use testpilot_core::{list_models, FeatureKey, Provider};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Ok(());
    }

    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return Ok(());
    }
    if app.show_provider_picker {
        handle_provider_picker(app, key).await;
        return Ok(());
    }
    if app.show_model_picker {
        handle_model_picker(app, key);
        return Ok(());
    }

    if ctrl && key.code == KeyCode::Char('s') {
        app.submit();
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await?,
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Jump straight to a feature
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            if let Some(&feature) = FeatureKey::all().get(idx) {
                app.switch_feature(feature);
                app.focus = FocusPane::Form;
            }
        }

        // Half-page scroll of the result area
        KeyCode::Char('d') if ctrl => {
            let half = (app.result_height / 2).max(1);
            app.scroll_result_down(half);
        }
        KeyCode::Char('u') if ctrl => {
            let half = (app.result_height / 2).max(1);
            app.scroll_result_up(half);
        }

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Sidebar => app.sidebar_down(),
            FocusPane::Form => app.field_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Sidebar => app.sidebar_up(),
            FocusPane::Form => app.field_up(),
        },

        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right if app.focus == FocusPane::Sidebar => {
            app.open_selected();
        }
        KeyCode::Enter | KeyCode::Char('i') => {
            app.start_editing();
        }
        KeyCode::Char('h') | KeyCode::Left => {
            app.focus = FocusPane::Sidebar;
        }

        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Sidebar => FocusPane::Form,
                FocusPane::Form => FocusPane::Sidebar,
            };
        }

        KeyCode::Char('s') => {
            app.submit();
        }

        KeyCode::Esc => {
            app.panel_mut().dismiss_notice();
        }

        // Provider picker
        KeyCode::Char('P') => {
            let current = Provider::all()
                .iter()
                .position(|p| *p == app.current_provider)
                .unwrap_or(0);
            app.provider_picker_state.select(Some(current));
            app.show_provider_picker = true;
        }

        // Model picker
        KeyCode::Char('m') => {
            open_model_picker(app).await;
        }

        _ => {}
    }
    Ok(())
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let multiline = app.editing_multiline();
    let mut cursor = app.cursor;
    let Some(value) = app.editing_field() else {
        app.input_mode = InputMode::Normal;
        return;
    };

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            return;
        }
        KeyCode::Enter if !multiline => {
            app.input_mode = InputMode::Normal;
            return;
        }
        KeyCode::Enter => {
            let byte_pos = char_to_byte_index(value, cursor);
            value.insert(byte_pos, '\n');
            cursor += 1;
        }
        KeyCode::Tab => {
            let byte_pos = char_to_byte_index(value, cursor);
            value.insert_str(byte_pos, "  ");
            cursor += 2;
        }
        KeyCode::Backspace => {
            if cursor > 0 {
                cursor -= 1;
                let byte_pos = char_to_byte_index(value, cursor);
                value.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if cursor < value.chars().count() {
                let byte_pos = char_to_byte_index(value, cursor);
                value.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            cursor = (cursor + 1).min(value.chars().count());
        }
        KeyCode::Home => {
            cursor = 0;
        }
        KeyCode::End => {
            cursor = value.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(value, cursor);
            value.insert(byte_pos, c);
            cursor += 1;
        }
        _ => {}
    }

    app.cursor = cursor;
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_api_key_input = false;
            app.api_key_input.clear();
            app.api_key_target_provider = None;
        }
        KeyCode::Enter => {
            if !app.api_key_input.trim().is_empty() {
                if let Some(provider) = app.api_key_target_provider {
                    let key = app.api_key_input.trim().to_string();
                    app.store_api_key(provider, key);
                    app.use_provider(provider, provider.default_model().to_string());
                }
            }
            app.show_api_key_input = false;
            app.api_key_input.clear();
            app.api_key_target_provider = None;
        }
        KeyCode::Backspace => {
            if app.api_key_input_cursor > 0 {
                app.api_key_input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
                app.api_key_input.remove(byte_pos);
            }
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
            app.api_key_input.insert(byte_pos, c);
            app.api_key_input_cursor += 1;
        }
        KeyCode::Left => {
            app.api_key_input_cursor = app.api_key_input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.api_key_input.chars().count();
            app.api_key_input_cursor = (app.api_key_input_cursor + 1).min(char_count);
        }
        _ => {}
    }
}

async fn handle_provider_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_provider_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.provider_picker_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.provider_picker_nav_up();
        }
        KeyCode::Enter => {
            let providers = Provider::all();
            let selected = app
                .provider_picker_state
                .selected()
                .and_then(|i| providers.get(i).copied());

            if let Some(provider) = selected {
                if app.get_key_source(provider).is_none() {
                    app.api_key_target_provider = Some(provider);
                    app.show_api_key_input = true;
                    app.api_key_input.clear();
                    app.api_key_input_cursor = 0;
                } else {
                    let model = first_model(app, provider).await;
                    app.use_provider(provider, model);
                }
                app.show_provider_picker = false;
            }
        }
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_model_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.model_picker_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.model_picker_nav_up();
        }
        KeyCode::Enter => {
            app.select_model();
        }
        _ => {}
    }
}

/// First installed or offered model for `provider`, else its default
async fn first_model(app: &App, provider: Provider) -> String {
    let listed = match list_models(&app.config, provider).await {
        Ok(models) => models.into_iter().next(),
        Err(e) => {
            warn!(provider = %provider, error = %e, "could not list models");
            None
        }
    };
    listed.unwrap_or_else(|| provider.default_model().to_string())
}

async fn open_model_picker(app: &mut App) {
    let models = match list_models(&app.config, app.current_provider).await {
        Ok(models) => models,
        Err(e) => {
            warn!(provider = %app.current_provider, error = %e, "could not list models");
            Vec::new()
        }
    };
    if models.is_empty() {
        return;
    }

    let current = models.iter().position(|m| *m == app.selected_model).unwrap_or(0);
    app.available_models = models;
    app.model_picker_state.select(Some(current));
    app.show_model_picker = true;
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_sidebar = app.sidebar_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_result = app.result_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_result {
                app.scroll_result_down(3);
            } else if in_sidebar {
                app.sidebar_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_result {
                app.scroll_result_up(3);
            } else if in_sidebar {
                app.sidebar_up();
            }
        }
        _ => {}
    }
}
