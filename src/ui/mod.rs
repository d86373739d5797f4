//! Terminal presenter: applies each [`FrameState`] to a ratatui chart.
//!
//! All computation happens in the animator; this module only translates the
//! frame description into widgets and drives the tick loop. Keys: `q`/`Esc`
//! quit, space pauses.

use crate::animator::{Animator, FrameState};
use crate::config::AppConfig;
use crate::models::Dataset;
use crate::utils::fmt_usd;
use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Rect},
    style::{Color, Style},
    symbols,
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset as ChartDataset, GraphType, LegendPosition,
        Paragraph,
    },
};
use std::time::{Duration, Instant};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Run the animation until the user quits. Raw mode and the alternate screen
/// are restored even when the loop errors.
pub fn run(dataset: &Dataset, cfg: &AppConfig) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, dataset, cfg);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    dataset: &Dataset,
    cfg: &AppConfig,
) -> Result<()> {
    let animator = Animator::new(dataset, cfg.animation.frame_count);
    let tick = Duration::from_millis(cfg.animation.tick_interval_ms);

    let mut frame = 0usize;
    let mut paused = false;
    let mut last_tick = Instant::now();

    loop {
        let state = animator.frame_state(frame);
        terminal.draw(|f| draw(f, dataset, &state))?;

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char(' ') => paused = !paused,
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            if !paused {
                if frame + 1 == animator.frame_count() {
                    // Hold the final frame when repeat is off.
                    if cfg.animation.repeat {
                        frame = 0;
                    }
                } else {
                    frame += 1;
                }
            }
        }
    }
}

// ── Drawing ───────────────────────────────────────────────────────────────────

/// Day offset of `date` from the dataset's global min date — the chart's
/// x coordinate.
fn x_of(dataset: &Dataset, date: NaiveDate) -> f64 {
    (date - dataset.min_date).num_days() as f64
}

/// "#RRGGBB" → Color. Anything unparseable falls back to white.
fn parse_hex_color(s: &str) -> Color {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Color::White;
    }
    match (
        u8::from_str_radix(&hex[0..2], 16),
        u8::from_str_radix(&hex[2..4], 16),
        u8::from_str_radix(&hex[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}

fn draw(f: &mut Frame, dataset: &Dataset, state: &FrameState) {
    let area = f.area();

    // Point buffers must outlive the borrowing chart datasets.
    let mut line_data: Vec<Vec<(f64, f64)>> = Vec::with_capacity(state.companies.len());
    let mut marker_data: Vec<[(f64, f64); 1]> = Vec::new();
    let mut marker_colors: Vec<Color> = Vec::new();

    for company in &state.companies {
        line_data.push(
            company
                .path
                .iter()
                .map(|p| (x_of(dataset, p.date), p.close))
                .collect(),
        );
        if let Some(m) = company.marker {
            marker_data.push([(x_of(dataset, m.date), m.close)]);
            marker_colors.push(parse_hex_color(&company.color));
        }
    }

    let mut datasets: Vec<ChartDataset> = Vec::new();
    for (i, company) in state.companies.iter().enumerate() {
        // Legend carries the live price tag once the series has data.
        let name = match &company.label {
            Some(label) => format!("{} {}", company.name, label.text),
            None => company.name.clone(),
        };
        datasets.push(
            ChartDataset::default()
                .name(name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(parse_hex_color(&company.color)))
                .data(&line_data[i]),
        );
    }
    for (points, color) in marker_data.iter().zip(&marker_colors) {
        datasets.push(
            ChartDataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(*color))
                .data(points),
        );
    }

    let span = dataset.span_days().max(1) as f64;
    let mid_date = dataset.min_date + ChronoDuration::days(dataset.span_days() / 2);
    let (y_lo, y_hi) = dataset.price_axis_bounds();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Stock Price Replay  (q quit, space pause) "),
        )
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, span])
                .labels([
                    dataset.min_date.format("%Y-%m-%d").to_string(),
                    mid_date.format("%Y-%m-%d").to_string(),
                    dataset.max_date.format("%Y-%m-%d").to_string(),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Price")
                .style(Style::default().fg(Color::Gray))
                .bounds([y_lo, y_hi])
                .labels([fmt_usd(y_lo), fmt_usd((y_lo + y_hi) / 2.0), fmt_usd(y_hi)]),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));

    f.render_widget(chart, area);

    let panel_area = panel_rect(area, &state.panel.lines());
    if panel_area.width > 0 && panel_area.height > 0 {
        let panel = Paragraph::new(state.panel.lines().join("\n"))
            .block(Block::default().borders(Borders::ALL).title(" Prices "));
        f.render_widget(Clear, panel_area);
        f.render_widget(panel, panel_area);
    }
}

/// Top-right corner rect sized to the panel text, kept inside `area`.
fn panel_rect(area: Rect, lines: &[String]) -> Rect {
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let width = (widest + 4).min(area.width.saturating_sub(2));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    if width < 4 || height < 3 {
        return Rect::new(0, 0, 0, 0);
    }
    Rect::new(area.right().saturating_sub(width + 1), area.y + 1, width, height)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanySeries, SeriesPoint};

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF6B6B"), Color::Rgb(0xFF, 0x6B, 0x6B));
        assert_eq!(parse_hex_color("4ECDC4"), Color::Rgb(0x4E, 0xCD, 0xC4));
        assert_eq!(parse_hex_color("#nope"), Color::White);
        assert_eq!(parse_hex_color(""), Color::White);
    }

    #[test]
    fn x_coordinate_counts_days_from_min() {
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let jan9 = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let ds = Dataset::from_companies(vec![CompanySeries {
            name: "A".into(),
            color: "#FF6B6B".into(),
            points: vec![
                SeriesPoint { date: jan1, close: 1.0 },
                SeriesPoint { date: jan9, close: 2.0 },
            ],
        }])
        .unwrap();

        assert_eq!(x_of(&ds, jan1), 0.0);
        assert_eq!(x_of(&ds, jan9), 8.0);
    }

    #[test]
    fn panel_rect_hugs_the_top_right() {
        let area = Rect::new(0, 0, 80, 24);
        let lines = vec!["Date: 2024-01-01".to_string(), "AMD: $10.00".to_string()];
        let rect = panel_rect(area, &lines);

        assert_eq!(rect.width, 20); // widest line (16) + 4
        assert_eq!(rect.height, 4);
        assert_eq!(rect.right(), 79);
        assert_eq!(rect.y, 1);
    }

    #[test]
    fn panel_rect_degrades_on_tiny_terminals() {
        let area = Rect::new(0, 0, 5, 3);
        let lines = vec!["Date: 2024-01-01".to_string()];
        let rect = panel_rect(area, &lines);
        assert_eq!(rect.width, 0);
    }
}
