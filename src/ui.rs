pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::app::{App, AppState, SaveStatus};
use crate::engine::CharDisplayState;
use crate::time_series::chart_coords;
use crate::ui::charting::{compute_chart_params, format_label};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Render-time snapshot of the app at a given instant
pub struct AppView<'a> {
    pub app: &'a App,
    pub now_ms: f64,
}

impl Widget for AppView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.app.state {
            AppState::Typing => render_typing(self.app, self.now_ms, area, buf),
            AppState::Results => render_results(self.app, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

/// Styled spans for every character of the reference text
pub fn prompt_spans(app: &App) -> Vec<Span<'static>> {
    let engine = &app.engine;
    let text = engine.text();

    engine
        .display_states(0..text.len())
        .into_iter()
        .enumerate()
        .map(|(idx, state)| {
            let expected = text.char_at(idx).unwrap_or(' ');
            match state {
                CharDisplayState::Correct => {
                    Span::styled(expected.to_string(), bold().fg(Color::Green))
                }
                CharDisplayState::Incorrect => {
                    let shown = match engine.typed_char(idx) {
                        Some(' ') | None => '·',
                        Some(c) => c,
                    };
                    Span::styled(shown.to_string(), bold().fg(Color::Red))
                }
                CharDisplayState::Current => Span::styled(
                    expected.to_string(),
                    dim_bold().add_modifier(Modifier::UNDERLINED),
                ),
                CharDisplayState::Pending => Span::styled(expected.to_string(), dim_bold()),
            }
        })
        .collect()
}

/// One-line live readout shown above the prompt
pub fn live_metrics_line(app: &App, now_ms: f64) -> String {
    let engine = &app.engine;
    let speed = engine.speed(now_ms);
    let mut line = format!(
        "{} wpm  {} burst  {}% acc  {}% consistency  {}/{} words",
        speed.wpm,
        engine.burst_wpm(),
        engine.accuracy(None),
        engine.consistency(),
        engine.words_completed(),
        engine.text().words().len(),
    );
    if engine.is_paused() {
        line.push_str("  [paused]");
    }
    line
}

fn render_typing(app: &App, now_ms: f64, area: Rect, buf: &mut Buffer) {
    let text_len = u16::try_from(app.engine.text().len()).unwrap_or(u16::MAX);
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_lines = text_len.div_ceil(max_chars_per_line).max(1);
    let padding = area.height.saturating_sub(prompt_lines.saturating_add(4)) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(1), // live metrics
            Constraint::Length(1),
            Constraint::Length(prompt_lines),
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(live_metrics_line(app, now_ms), dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Line::from(prompt_spans(app)))
        .alignment(if prompt_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(tab) pause / (←) restart / (→) new text / (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = &app.engine;
    let Some(summary) = engine.finalize() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // weak characters
            Constraint::Length(1), // save status
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (overall_duration, highest_wpm) = compute_chart_params(engine.wpm_history());
    let (wpm_coords, burst_coords) = chart_coords(engine.wpm_history());
    let datasets = vec![
        Dataset::default()
            .name("wpm")
            .marker(Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&wpm_coords),
        Dataset::default()
            .name("burst")
            .marker(Marker::Dot)
            .style(Style::default().fg(Color::DarkGray))
            .graph_type(GraphType::Scatter)
            .data(&burst_coords),
    ];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(format_label(overall_duration), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm.max(1.0)])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(format_label(highest_wpm), bold()),
                ]),
        )
        .render(chunks[0], buf);

    let stats = format!(
        "{} wpm   {}% acc   {}% consistency   {}s   {} errors   {} corrected   {}",
        summary.wpm,
        summary.accuracy,
        summary.consistency,
        summary.duration_seconds,
        summary.error_count,
        summary.corrections,
        summary.difficulty,
    );
    Paragraph::new(Span::styled(stats, bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(weak_chars_line(app), dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let (status, color) = match &app.save_status {
        SaveStatus::Saved(_) => ("stats saved".to_string(), Color::Green),
        SaveStatus::Failed(_) => ("stats may not be recorded".to_string(), Color::Yellow),
        SaveStatus::Pending => ("saving stats...".to_string(), Color::DarkGray),
        SaveStatus::Disabled => (String::new(), Color::DarkGray),
    };
    Paragraph::new(Span::styled(status, Style::default().fg(color)))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

/// "slowest / most missed" hint line for the results screen
pub fn weak_chars_line(app: &App) -> String {
    let display = |c: char| {
        if c == ' ' {
            "space".to_string()
        } else {
            c.to_string()
        }
    };

    let weakest: Vec<String> = app
        .engine
        .char_stats()
        .weakest(5)
        .into_iter()
        .map(|(c, s)| format!("{} {:.0}%", display(c), s.miss_rate()))
        .collect();
    let corrected: Vec<String> = app
        .engine
        .most_corrected(3)
        .into_iter()
        .map(|(c, n)| format!("{} ×{}", display(c), n))
        .collect();

    match (weakest.is_empty(), corrected.is_empty()) {
        (true, true) => "no missed characters".to_string(),
        (false, true) => format!("missed: {}", weakest.join(", ")),
        (true, false) => format!("corrected: {}", corrected.join(", ")),
        (false, false) => format!(
            "missed: {}   corrected: {}",
            weakest.join(", "),
            corrected.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::TextSource;
    use crate::engine::EngineConfig;

    fn app(text: &str) -> App {
        App::new(
            TextSource::Fixed(text.to_string()),
            EngineConfig::default(),
            None,
        )
        .unwrap()
    }

    fn render(app: &App, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        AppView { app, now_ms: 1_000.0 }.render(area, &mut buf);
        buf
    }

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_prompt_spans_styles() {
        let mut app = app("abc");
        app.type_char('x', 0.0);

        let spans = prompt_spans(&app);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].content, "x");
        assert_eq!(spans[0].style.fg, Some(Color::Red));
        assert!(spans[1].style.add_modifier.contains(Modifier::UNDERLINED));
        assert!(spans[2].style.add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn test_wrong_space_shown_as_dot() {
        let mut app = app("abc");
        app.type_char('a', 0.0);
        app.type_char(' ', 10.0);
        assert_eq!(prompt_spans(&app)[1].content, "·");
    }

    #[test]
    fn test_live_metrics_line() {
        let mut app = app("abcde");
        app.type_char('a', 0.0);
        app.toggle_pause(10.0);
        let line = live_metrics_line(&app, 100.0);
        assert!(line.contains("100% acc"));
        assert!(line.ends_with("[paused]"));
    }

    #[test]
    fn test_weak_chars_line() {
        let mut app = app("ab");
        assert_eq!(weak_chars_line(&app), "no missed characters");
        app.type_char('x', 0.0);
        app.backspace(10.0);
        assert_eq!(weak_chars_line(&app), "missed: a 100%   corrected: a ×1");
    }

    #[test]
    fn test_render_typing_and_results() {
        let mut app = app("hello");
        let buf = render(&app, 80, 20);
        assert!(buffer_text(&buf).contains("hello"));

        for (i, c) in "hello".chars().enumerate() {
            app.type_char(c, i as f64 * 200.0);
        }
        let buf = render(&app, 80, 20);
        let text = buffer_text(&buf);
        assert!(text.contains("% acc"));
        assert!(text.contains("(r)etry"));
    }

    #[test]
    fn test_render_text_longer_than_u16_chars() {
        let app = app(&"ab ".repeat(25_000));
        assert!(app.engine.text().len() > usize::from(u16::MAX));
        render(&app, 80, 20);
        render(&app, 1, 5);
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let app = app("a long enough prompt to wrap on a tiny screen");
        render(&app, 4, 3);
    }
}
