use image::{imageops::FilterType, RgbImage};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use super::app::{App, Focus};
use crate::core::{ModelChoice, RequestOutcome};

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Prompt
            Constraint::Length(3), // Model + quality
            Constraint::Min(8),    // Preview
            Constraint::Length(3), // Status bar
            Constraint::Length(1), // Help line
        ])
        .split(frame.area());

    draw_title(frame, app, chunks[0]);
    draw_input(frame, app, chunks[1]);
    draw_settings_row(frame, app, chunks[2]);
    draw_preview(frame, app, chunks[3]);
    draw_status(frame, app, chunks[4]);
    draw_help(frame, chunks[5]);
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_title(frame: &mut Frame, app: &App, area: Rect) {
    let provider = app
        .controller
        .as_ref()
        .map(|c| c.provider_name().to_string())
        .unwrap_or_else(|| "not configured".to_string());

    let title = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            "AI Image Generator",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " - Create amazing images from text descriptions",
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!("  [{}]", provider), Style::default().fg(Color::DarkGray)),
    ])])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    frame.render_widget(title, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let (visible, cursor_col) = input_window(&app.input, app.cursor_pos, area.width.saturating_sub(2));
    let (text, style) = if app.input.is_empty() && app.focus != Focus::Prompt {
        ("Enter your prompt...".to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (visible, Style::default().fg(Color::White))
    };

    let input = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app, Focus::Prompt))
            .title("Prompt (Enter to generate)"),
    );
    frame.render_widget(input, area);

    if app.focus == Focus::Prompt {
        frame.set_cursor_position((area.x + 1 + cursor_col, area.y + 1));
    }
}

/// Slice of `input` that fits in `width` columns with the cursor kept in view.
///
/// Returns the visible text and the cursor column inside it.
fn input_window(input: &str, cursor: usize, width: u16) -> (String, u16) {
    let width = usize::from(width);
    if width == 0 {
        return (String::new(), 0);
    }
    // One column is reserved for the cursor past the last char
    let offset = (cursor + 1).saturating_sub(width);
    let visible = input.chars().skip(offset).take(width).collect();
    (visible, (cursor - offset) as u16)
}

fn draw_settings_row(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let spans: Vec<Span> = ModelChoice::all()
        .iter()
        .flat_map(|model| {
            let style = if !model.is_available() {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else if *model == app.model {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            [Span::styled(format!(" {} ", model.label()), style), Span::raw(" ")]
        })
        .collect();

    let models = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app, Focus::Model))
            .title("Model"),
    );
    frame.render_widget(models, chunks[0]);

    let quality = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app, Focus::Quality))
                .title(format!("Quality vs Speed: {}", app.quality)),
        )
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(u16::from(app.quality.value()));
    frame.render_widget(quality, chunks[1]);
}

fn draw_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Preview");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let placeholder = |text: String, color: Color| {
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(ratatui::layout::Alignment::Center)
            .wrap(Wrap { trim: true })
    };

    match (&app.outcome, &app.preview) {
        (RequestOutcome::Pending, _) => {
            let spinner = SPINNER[app.tick % SPINNER.len()];
            frame.render_widget(placeholder(format!("{} Generating...", spinner), Color::Yellow), inner);
        }
        (RequestOutcome::Success(_), Some(preview)) => {
            let lines = half_block_lines(preview, inner.width, inner.height);
            frame.render_widget(Paragraph::new(lines), inner);
        }
        (RequestOutcome::Success(image), None) => {
            let text = format!("{}\n\nLoading preview...", image.reference);
            frame.render_widget(placeholder(text, Color::Gray), inner);
        }
        _ => {
            frame.render_widget(
                placeholder("Generated image will appear here".to_string(), Color::DarkGray),
                inner,
            );
        }
    }
}

/// Render `img` into `width` x `height` cells, two pixel rows per cell.
pub fn half_block_lines(img: &RgbImage, width: u16, height: u16) -> Vec<Line<'static>> {
    if width == 0 || height == 0 || img.width() == 0 || img.height() == 0 {
        return Vec::new();
    }

    // Terminal cells are about twice as tall as wide, the half block evens that out
    let max_w = u32::from(width);
    let max_h = u32::from(height) * 2;
    let scale = f64::min(
        max_w as f64 / img.width() as f64,
        max_h as f64 / img.height() as f64,
    );
    let w = ((img.width() as f64 * scale).floor() as u32).clamp(1, max_w);
    let h = ((img.height() as f64 * scale).floor() as u32).clamp(1, max_h);
    let scaled = image::imageops::resize(img, w, h, FilterType::Nearest);

    let pad = " ".repeat(((max_w - w) / 2) as usize);
    (0..h)
        .step_by(2)
        .map(|y| {
            let mut spans = vec![Span::raw(pad.clone())];
            spans.extend((0..w).map(|x| {
                let top = scaled.get_pixel(x, y);
                let style = Style::default().fg(Color::Rgb(top[0], top[1], top[2]));
                let style = if y + 1 < h {
                    let bottom = scaled.get_pixel(x, y + 1);
                    style.bg(Color::Rgb(bottom[0], bottom[1], bottom[2]))
                } else {
                    style
                };
                Span::styled("▀", style)
            }));
            Line::from(spans)
        })
        .collect()
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let (message, style) = if let Some(err) = &app.error_message {
        (err.clone(), Style::default().fg(Color::Red))
    } else if let Some(status) = &app.status_message {
        (status.clone(), Style::default().fg(Color::Green))
    } else if let Some(setup) = &app.setup_error {
        (setup.clone(), Style::default().fg(Color::Red))
    } else if app.is_generating() {
        ("Generating...".to_string(), Style::default().fg(Color::Yellow))
    } else {
        ("Ready".to_string(), Style::default().fg(Color::Gray))
    };

    let status = Paragraph::new(message)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "Enter: Generate | Tab: Next field | ←→: Adjust | Ctrl+S: Download | Esc: Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn half_blocks_fit_the_area() {
        let img = RgbImage::from_pixel(64, 64, Rgb([255, 0, 0]));
        let lines = half_block_lines(&img, 40, 10);

        // 64x64 scaled into 40x20 pixels keeps the square: 20x20 pixels, 10 rows
        assert_eq!(lines.len(), 10);
        let cells: usize = lines[0].spans.iter().filter(|s| s.content == "▀").count();
        assert_eq!(cells, 20);
        let top = lines[0].spans.last().unwrap().style;
        assert_eq!(top.fg, Some(Color::Rgb(255, 0, 0)));
        assert_eq!(top.bg, Some(Color::Rgb(255, 0, 0)));
    }

    #[test]
    fn short_input_is_shown_whole() {
        let (text, col) = input_window("a fox", 5, 20);
        assert_eq!(text, "a fox");
        assert_eq!(col, 5);
    }

    #[test]
    fn long_input_scrolls_with_cursor() {
        let input = "a red fox in snow under the northern lights";
        let (text, col) = input_window(input, input.chars().count(), 10);
        assert_eq!(text, "rn lights");
        assert_eq!(col, 9);

        let (text, col) = input_window(input, 2, 10);
        assert_eq!(text, "a red fox ");
        assert_eq!(col, 2);
    }

    #[test]
    fn zero_width_input_is_empty() {
        assert_eq!(input_window("abc", 3, 0), (String::new(), 0));
    }

    #[test]
    fn empty_area_renders_nothing() {
        let img = RgbImage::new(4, 4);
        assert!(half_block_lines(&img, 0, 10).is_empty());
    }
}
