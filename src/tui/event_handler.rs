use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Handle a key press in the generator form
pub fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Form-wide shortcuts
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('s') if ctrl => {
            app.download();
            return;
        }
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.previous();
            return;
        }
        KeyCode::Enter => {
            app.submit();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Prompt => handle_prompt_input(app, key),
        Focus::Model => handle_model_input(app, key),
        Focus::Quality => handle_quality_input(app, key),
    }
}

fn handle_prompt_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => {
            app.insert_char(c);
            app.clear_messages();
        }

        KeyCode::Backspace => app.delete_before_cursor(),

        KeyCode::Delete => app.delete_at_cursor(),

        KeyCode::Left => {
            if app.cursor_pos > 0 {
                app.cursor_pos -= 1;
            }
        }

        KeyCode::Right => {
            if app.cursor_pos < app.input_len() {
                app.cursor_pos += 1;
            }
        }

        KeyCode::Home => {
            app.cursor_pos = 0;
        }

        KeyCode::End => {
            app.cursor_pos = app.input_len();
        }

        _ => {}
    }
}

fn handle_model_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Char(' ') => {
            app.cycle_model();
        }
        _ => {}
    }
}

fn handle_quality_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Down | KeyCode::Char('-') => app.adjust_quality(-1),
        KeyCode::Right | KeyCode::Up | KeyCode::Char('+') => app.adjust_quality(1),
        KeyCode::PageDown => app.adjust_quality(-10),
        KeyCode::PageUp => app.adjust_quality(10),
        KeyCode::Home => app.adjust_quality(-100),
        KeyCode::End => app.adjust_quality(100),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::ModelChoice;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn app() -> App {
        App::with_controller(Config::default(), None, None)
    }

    #[test]
    fn typing_fills_the_prompt() {
        let mut app = app();
        for c in "fox".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "fx");
    }

    #[test]
    fn tab_moves_focus_to_sliders() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Model);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.model, ModelChoice::Hd);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Quality);
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.quality.value(), 60);

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Model);
    }

    #[test]
    fn ctrl_c_quits() {
        let mut app = app();
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.input.is_empty());
    }
}
