use std::io::stdout;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};
use viewport_protocol::Breakpoint;

use crate::app::{App, View};

fn breakpoint_color(breakpoint: Breakpoint) -> Color {
    match breakpoint {
        Breakpoint::Xs => Color::Red,
        Breakpoint::Sm => Color::LightRed,
        Breakpoint::Md => Color::Yellow,
        Breakpoint::Lg => Color::Green,
        Breakpoint::Xl => Color::Cyan,
        Breakpoint::Xxl => Color::Blue,
        _ => Color::Gray,
    }
}

fn draw(frame: &mut Frame<'_>, view: &View<'_>) {
    let [header_area, stats_area, log_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Min(0),
    ])
    .areas(frame.area());

    let header = Block::default()
        .title(" viewport-watch | resize the terminal | u toggle every-resize | q quit ")
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, header_area);

    let stats = Paragraph::new(vec![
        Line::styled(
            format!(
                "window {}x{} px   breakpoint {}",
                view.window_size.width, view.window_size.height, view.breakpoint
            ),
            Style::default().fg(breakpoint_color(view.breakpoint)),
        ),
        Line::raw(format!(
            "{} observers on {} platform listeners   every-resize: {}",
            view.observers,
            view.listeners,
            if view.every_resize_subscribed { "on" } else { "off" },
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title(" service "));
    frame.render_widget(stats, stats_area);

    let visible = usize::from(log_area.height.saturating_sub(2));
    let mut lines: Vec<Line<'_>> = view
        .log
        .lines()
        .rev()
        .take(visible)
        .map(Line::raw)
        .collect();
    lines.reverse();
    let log = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" notifications "));
    frame.render_widget(log, log_area);
}

pub fn run_tui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| -> Result<()> {
        loop {
            app.with_view(|view| terminal.draw(|frame| draw(frame, view)).map(|_| ()))??;
            if !app.step()? {
                return Ok(());
            }
        }
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

pub fn terminal_size() -> Result<(u16, u16)> {
    Ok(terminal::size()?)
}
