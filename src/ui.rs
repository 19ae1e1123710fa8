//! Terminal User Interface for netmon-rs.
//!
//! This module provides a real-time dashboard using `ratatui` that displays:
//!
//! - Status bar with source, sampling rate and tick count
//! - One table row per interface with throughput and error rates
//!
//! # Controls
//!
//! - `q` or `Esc`: Quit
//! - `Ctrl+C`: Quit

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use tracing::info;

use crate::app::App;
use crate::error::Result;
use crate::metrics::MetricsRecord;
use crate::source::CounterSource;
use crate::thresholds::{Severity, Thresholds};
use crate::trigger::PeriodicTrigger;

/// Longest wait for keyboard input between redraws.
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Run the TUI event loop.
///
/// Runs until the user presses `q` or `Esc`, the `running` flag is cleared,
/// or a tick fails to read the counter table.
///
/// # Arguments
///
/// * `app` - Application instance
/// * `running` - Atomic flag to signal shutdown
/// * `trigger` - Sampling schedule
pub fn run<R: CounterSource>(
    mut app: App<R>,
    running: Arc<AtomicBool>,
    mut trigger: PeriodicTrigger,
) -> Result<()> {
    enable_raw_mode()?;
    if let Err(e) = std::io::stdout().execute(EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }

    let result = run_tui_loop(&mut app, &running, &mut trigger);

    // Always clean up terminal state
    let _ = disable_raw_mode();
    let _ = std::io::stdout().execute(LeaveAlternateScreen);

    result
}

/// Inner TUI loop - separated to ensure cleanup happens on any exit path.
fn run_tui_loop<R: CounterSource>(
    app: &mut App<R>,
    running: &Arc<AtomicBool>,
    trigger: &mut PeriodicTrigger,
) -> Result<()> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    while running.load(Ordering::Relaxed) {
        let timeout = trigger.time_until_next(Instant::now()).min(INPUT_POLL);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::Relaxed);
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            running.store(false, Ordering::Relaxed);
                        }
                        _ => {}
                    }
                }
            }
        }

        if trigger.poll(Instant::now()) {
            app.collect()?;
        }

        terminal.draw(|f| draw_ui(f, app, trigger.period()))?;
    }

    Ok(())
}

/// Main UI drawing function.
fn draw_ui<R: CounterSource>(f: &mut Frame, app: &App<R>, period: Duration) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(5),    // Interface table
        ])
        .split(f.area());

    draw_status_bar(f, app, period, chunks[0]);
    draw_interfaces(f, app, chunks[1]);
}

/// Draw the top status bar.
fn draw_status_bar<R: CounterSource>(f: &mut Frame, app: &App<R>, period: Duration, area: Rect) {
    let updated = match app.latest.last_update() {
        Some(t) if !app.latest.is_empty() => t.format("%H:%M:%S").to_string(),
        _ => "waiting".to_string(),
    };

    let status_text = format!(
        " 📡 netmon-rs | {} | {}/{} interfaces reporting | {:.2} Hz | Ticks: {} | Updated: {} | [q]uit",
        app.sampler().location().display(),
        app.latest.len(),
        app.sampler().entity_count(),
        1.0 / period.as_secs_f64(),
        app.ticks,
        updated,
    );

    let status = Paragraph::new(status_text)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("Status"),
        );

    f.render_widget(status, area);
}

/// Draw one row per known interface.
fn draw_interfaces<R: CounterSource>(f: &mut Frame, app: &App<R>, area: Rect) {
    let header = Row::new(["Interface", "RX", "TX", "RX err", "TX err"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .sampler()
        .entities()
        .into_iter()
        .map(|entity| match app.latest.get(entity.as_str()) {
            Some(record) => record_row(record, &app.thresholds),
            None => Row::new([
                Cell::from(entity.to_string()),
                Cell::from("waiting"),
                Cell::from("waiting"),
                Cell::from("-"),
                Cell::from("-"),
            ])
            .style(Style::default().fg(Color::DarkGray)),
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Interfaces"),
    );

    f.render_widget(table, area);
}

/// Build a table row for a record, coloured by its worst severity.
fn record_row(record: &MetricsRecord, thresholds: &Thresholds) -> Row<'static> {
    let color = severity_color(thresholds.record_severity(record));

    Row::new([
        Cell::from(record.entity.to_string()),
        Cell::from(format_bitrate(record.rx_bits_per_sec)),
        Cell::from(format_bitrate(record.tx_bits_per_sec)),
        Cell::from(format!("{:.2}%", record.rx_error_rate_pct)),
        Cell::from(format!("{:.2}%", record.tx_error_rate_pct)),
    ])
    .style(Style::default().fg(color))
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Normal => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Critical => Color::Red,
    }
}

/// Format a bit rate with a decimal SI prefix (negative rates keep their sign).
pub fn format_bitrate(bits_per_sec: i64) -> String {
    const K: f64 = 1e3;
    const M: f64 = 1e6;
    const G: f64 = 1e9;

    let value = bits_per_sec as f64;
    let magnitude = value.abs();

    if magnitude >= G {
        format!("{:.2} Gbit/s", value / G)
    } else if magnitude >= M {
        format!("{:.2} Mbit/s", value / M)
    } else if magnitude >= K {
        format!("{:.2} kbit/s", value / K)
    } else {
        format!("{} bit/s", bits_per_sec)
    }
}

/// Run in headless mode (no TUI, records printed by the console sink).
pub fn run_headless<R: CounterSource>(
    mut app: App<R>,
    running: Arc<AtomicBool>,
    mut trigger: PeriodicTrigger,
) -> Result<()> {
    println!("netmon-rs - Network Interface Monitor");
    println!("=====================================");
    println!("Source: {}", app.sampler().location().display());
    println!("Interfaces: {}", app.sampler().entity_count());
    println!("Rate: {:.2} Hz", 1.0 / trigger.period().as_secs_f64());
    if let Some(csv_file) = &app.config.csv_file {
        println!("Logging to: {}", csv_file.display());
    }
    println!("Press Ctrl+C to stop.\n");

    while trigger.wait(&running) {
        app.collect()?;
    }

    info!(ticks = app.ticks, "stopped");
    println!("\nStopped after {} ticks.", app.ticks);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(0), "0 bit/s");
        assert_eq!(format_bitrate(999), "999 bit/s");
        assert_eq!(format_bitrate(8000), "8.00 kbit/s");
        assert_eq!(format_bitrate(12_500_000), "12.50 Mbit/s");
        assert_eq!(format_bitrate(2_000_000_000), "2.00 Gbit/s");
        assert_eq!(format_bitrate(-16000), "-16.00 kbit/s");
    }

    #[test]
    fn test_severity_color() {
        assert_eq!(severity_color(Severity::Normal), Color::Green);
        assert_eq!(severity_color(Severity::Warning), Color::Yellow);
        assert_eq!(severity_color(Severity::Critical), Color::Red);
    }
}
