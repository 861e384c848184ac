use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use ton_city::{
    plot_price, price_intensity, revenue_report, BusinessType, EconomyConfig, IncomeModel,
    PlotIndex, PlotStatus, RevenueReport, TreasuryHealth, TreasuryStats, HealthLevel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Map,
    IncomeTable,
    Treasury,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Map => Page::IncomeTable,
            Page::IncomeTable => Page::Treasury,
            Page::Treasury => Page::Map,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Map => Page::Treasury,
            Page::IncomeTable => Page::Map,
            Page::Treasury => Page::IncomeTable,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Map => "City Map",
            Page::IncomeTable => "Income Table",
            Page::Treasury => "Treasury",
        }
    }
}

pub struct App {
    pub plots: PlotIndex,
    pub config: EconomyConfig,
    pub model: IncomeModel,
    pub viewer: Option<String>,
    pub cursor: (i32, i32),
    pub current_page: Page,
    pub show_detail: bool,
    pub business_idx: usize,
    pub income_state: TableState,
    pub treasury: Option<(TreasuryHealth, RevenueReport)>,
}

impl App {
    pub fn new(
        plots: PlotIndex,
        config: EconomyConfig,
        treasury: Option<(TreasuryStats, Option<f64>)>,
        viewer: Option<String>,
    ) -> Self {
        let center = (config.grid.size / 2) as i32;
        let model = config.income_model();

        let treasury = treasury.map(|(stats, avg)| {
            let health = config.treasury_engine().assess(&stats, avg);
            (health, revenue_report(&stats))
        });

        let mut income_state = TableState::default();
        income_state.select(Some(0));

        App {
            plots,
            config,
            model,
            viewer,
            cursor: (center, center),
            current_page: Page::Map,
            show_detail: true,
            business_idx: 0,
            income_state,
            treasury,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Move the map cursor, staying inside the grid
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let max = self.config.grid.size as i32 - 1;
        self.cursor.0 = (self.cursor.0 + dx).clamp(0, max);
        self.cursor.1 = (self.cursor.1 + dy).clamp(0, max);
    }

    pub fn business_type(&self) -> BusinessType {
        BusinessType::ALL[self.business_idx % BusinessType::ALL.len()]
    }

    pub fn next_business(&mut self) {
        self.business_idx = (self.business_idx + 1) % BusinessType::ALL.len();
    }

    pub fn previous_business(&mut self) {
        let n = BusinessType::ALL.len();
        self.business_idx = (self.business_idx + n - 1) % n;
    }

    pub fn next_row(&mut self) {
        let rows = self.model.levels.max_level() as usize;
        let i = match self.income_state.selected() {
            Some(i) if i + 1 < rows => i + 1,
            _ => 0,
        };
        self.income_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let rows = self.model.levels.max_level() as usize;
        let i = match self.income_state.selected() {
            Some(0) | None => rows.saturating_sub(1),
            Some(i) => i - 1,
        };
        self.income_state.select(Some(i));
    }

    pub fn cursor_status(&self) -> PlotStatus {
        self.plots
            .status_at(self.cursor.0, self.cursor.1, self.viewer.as_deref())
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "dashboard exited with an error");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Up => match app.current_page {
                    Page::Map => app.move_cursor(0, -1),
                    Page::IncomeTable => app.previous_row(),
                    Page::Treasury => {}
                },
                KeyCode::Down => match app.current_page {
                    Page::Map => app.move_cursor(0, 1),
                    Page::IncomeTable => app.next_row(),
                    Page::Treasury => {}
                },
                KeyCode::Left => match app.current_page {
                    Page::Map => app.move_cursor(-1, 0),
                    Page::IncomeTable => app.previous_business(),
                    Page::Treasury => {}
                },
                KeyCode::Right => match app.current_page {
                    Page::Map => app.move_cursor(1, 0),
                    Page::IncomeTable => app.next_business(),
                    Page::Treasury => {}
                },
                KeyCode::PageUp if app.current_page == Page::Map => app.move_cursor(0, -10),
                KeyCode::PageDown if app.current_page == Page::Map => app.move_cursor(0, 10),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Map if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(65), // Map viewport
                    Constraint::Percentage(35), // Detail panel
                ])
                .split(chunks[1]);

            render_map(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Map => render_map(f, chunks[1], app),
        Page::IncomeTable => render_income_table(f, chunks[1], app),
        Page::Treasury => render_treasury(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Map, Page::IncomeTable, Page::Treasury];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Plots: {}", app.config.grid.plot_count()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Owned: {}", app.plots.owned_count()),
        Style::default().fg(Color::Cyan),
    ));

    if let Some((health, _)) = &app.treasury {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("Treasury: {}", health.level),
            Style::default().fg(health_color(health.level)),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

/// Tint for an available plot: purple, brighter toward the center
fn price_color(intensity: f64) -> Color {
    let alpha = 0.1 + intensity * 0.2;
    let scale = |c: f64| (c * alpha / 0.3) as u8;
    Color::Rgb(scale(112.0), 0, scale(255.0))
}

fn status_color(status: PlotStatus) -> Color {
    match status {
        PlotStatus::Available => Color::DarkGray,
        PlotStatus::OwnedByViewer { has_business: true } => Color::Yellow,
        PlotStatus::OwnedByViewer { has_business: false } => Color::Cyan,
        PlotStatus::OwnedByOther { has_business: true } => Color::Rgb(128, 107, 0),
        PlotStatus::OwnedByOther { has_business: false } => Color::Rgb(0, 120, 128),
    }
}

fn health_color(level: HealthLevel) -> Color {
    match level {
        HealthLevel::Critical => Color::Red,
        HealthLevel::Warning => Color::LightRed,
        HealthLevel::Caution => Color::Yellow,
        HealthLevel::Healthy => Color::Green,
    }
}

fn render_map(f: &mut Frame, area: Rect, app: &App) {
    let grid = &app.config.grid;
    let size = grid.size as i32;

    // Two columns per plot so cells read roughly square
    let cols = (area.width.saturating_sub(2) / 2).max(1) as i32;
    let rows = area.height.saturating_sub(2).max(1) as i32;

    let origin_x = (app.cursor.0 - cols / 2).clamp(0, (size - cols).max(0));
    let origin_y = (app.cursor.1 - rows / 2).clamp(0, (size - rows).max(0));

    let mut lines = Vec::with_capacity(rows as usize);
    for y in origin_y..(origin_y + rows).min(size) {
        let mut spans = Vec::with_capacity(cols as usize);
        for x in origin_x..(origin_x + cols).min(size) {
            let status = app.plots.status_at(x, y, app.viewer.as_deref());

            let mut style = match status {
                PlotStatus::Available => {
                    let price = plot_price(x, y, grid);
                    Style::default().bg(price_color(price_intensity(price, grid)))
                }
                owned => Style::default().bg(status_color(owned)),
            };

            if (x, y) == app.cursor {
                style = style.fg(Color::White).add_modifier(Modifier::BOLD);
                spans.push(Span::styled("[]", style));
            } else {
                spans.push(Span::styled("  ", style));
            }
        }
        lines.push(Line::from(spans));
    }

    let map = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Map ({}, {}) ", origin_x, origin_y)),
    );

    f.render_widget(map, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let (x, y) = app.cursor;
    let grid = &app.config.grid;
    let plot = app.plots.get(x, y);
    let quote = match plot {
        Some(p) => p.quote(grid),
        None => ton_city::quote_plot(x, y, grid),
    };
    let status = app.cursor_status();

    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let mut content = vec![
        Line::from(""),
        Line::from(vec![label("  Plot: "), Span::raw(format!("({}, {})", x, y))]),
        Line::from(""),
        Line::from(vec![label("  Zone: "), Span::raw(quote.zone.to_string())]),
        Line::from(""),
        Line::from(vec![
            label("  Price: "),
            Span::styled(format!("{:.2} TON", quote.price), Style::default().fg(Color::Green)),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Zone list price: "),
            Span::raw(format!("{:.0} TON", quote.zone.list_price())),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Status: "),
            Span::styled(status.label(), Style::default().fg(status_color(status))),
        ]),
    ];

    if let Some(owner) = plot.and_then(|p| p.owner.as_deref()) {
        content.push(Line::from(""));
        content.push(Line::from(vec![label("  Owner: "), Span::raw(owner.to_string())]));
    }

    if let Some(business) = plot.and_then(|p| p.business_id.as_deref()) {
        content.push(Line::from(""));
        content.push(Line::from(vec![label("  Business: "), Span::raw(business.to_string())]));
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Plot Details "),
    );

    f.render_widget(panel, area);
}

fn render_income_table(f: &mut Frame, area: Rect, app: &mut App) {
    let business_type = app.business_type();

    let header_cells = ["Level", "Multiplier", "Gross", "Operating", "Net"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .model
        .income_table(business_type)
        .into_iter()
        .map(|row| {
            let net_color = if row.net < 0.0 { Color::Red } else { Color::Green };
            Row::new(vec![
                Cell::from(row.level.to_string()),
                Cell::from(format!("x{:.1}", row.multiplier)),
                Cell::from(format!("{:.2}", row.gross)),
                Cell::from(format!("{:.2}", row.operating_cost)),
                Cell::from(format!("{:.2}", row.net)).style(Style::default().fg(net_color)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " {} · daily TON at 0 connections, tax {:.0}% ",
                business_type,
                app.model.tax_rate * 100.0
            )),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.income_state);
}

fn render_treasury(f: &mut Frame, area: Rect, app: &App) {
    let (health, report) = match &app.treasury {
        Some(t) => t,
        None => {
            let empty = Paragraph::new("  No treasury snapshot. Run: ton-city treasury <stats.json>")
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Yellow))
                        .title(" Treasury "),
                );
            f.render_widget(empty, area);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let level_style = Style::default()
        .fg(health_color(health.level))
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![Span::raw("  Health: "), Span::styled(health.level.as_str().to_uppercase(), level_style)]),
        Line::from(""),
        Line::from(format!("  Total income:   {:>12.2} TON", health.total_income)),
        Line::from(format!("  Net treasury:   {:>12.2} TON", health.net_treasury)),
        Line::from(format!("  Available:      {:>12.2} TON", health.available)),
    ];

    if let (true, Some(days)) = (health.show_runway, health.runway_days) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  Runway: {} days at the current withdrawal rate", days),
            Style::default().fg(Color::Red),
        )));
    }

    let health_panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(health_color(health.level)))
            .title(" Health "),
    );
    f.render_widget(health_panel, chunks[0]);

    let rows: Vec<Row> = report
        .lines
        .iter()
        .map(|line| {
            Row::new(vec![
                Cell::from(line.source.label()),
                Cell::from(format!("{:.2}", line.amount)),
                Cell::from(line.count.map(|c| c.to_string()).unwrap_or_default()),
            ])
        })
        .chain(std::iter::once(
            Row::new(vec![
                Cell::from("Total revenue"),
                Cell::from(format!("{:.2}", report.total_revenue)),
                Cell::from(""),
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        ))
        .chain(std::iter::once(Row::new(vec![
            Cell::from("Deposits"),
            Cell::from(format!("{:.2}", report.total_deposits)),
            Cell::from(report.deposits_count.to_string()),
        ])))
        .collect();

    let revenue = Table::new(
        rows,
        [Constraint::Length(22), Constraint::Length(14), Constraint::Length(8)],
    )
    .header(
        Row::new(vec!["Source", "TON", "Count"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Revenue "),
    );
    f.render_widget(revenue, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = match app.current_page {
        Page::Map => vec![
            Span::styled(
                format!(" Cursor: ({}, {}) ", app.cursor.0, app.cursor.1),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" | "),
            Span::styled("←↑↓→", Style::default().fg(Color::Yellow)),
            Span::raw(" Move | "),
            Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
            Span::raw(" Fast | "),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" Details | "),
        ],
        Page::IncomeTable => vec![
            Span::styled(
                format!(" {}/{} ", app.business_idx + 1, BusinessType::ALL.len()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" | "),
            Span::styled("←/→", Style::default().fg(Color::Yellow)),
            Span::raw(" Business | "),
            Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
            Span::raw(" Level | "),
        ],
        Page::Treasury => vec![Span::raw(" ")],
    };

    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ton_city::{GridConfig, Plot};

    fn app() -> App {
        let grid = GridConfig::default();
        let mut owned = Plot::new(50, 50, &grid);
        owned.owner = Some("EQme".to_string());
        App::new(PlotIndex::new(vec![owned]), EconomyConfig::default(), None, Some("EQme".to_string()))
    }

    #[test]
    fn test_cursor_starts_at_center_and_stays_in_grid() {
        let mut app = app();
        assert_eq!(app.cursor, (50, 50));
        assert!(app.cursor_status().is_owned());

        app.move_cursor(-500, 500);
        assert_eq!(app.cursor, (0, 99));
        assert_eq!(app.cursor_status(), PlotStatus::Available);
    }

    #[test]
    fn test_page_cycle() {
        let mut app = app();
        app.next_page();
        app.next_page();
        app.next_page();
        assert_eq!(app.current_page, Page::Map);
        app.previous_page();
        assert_eq!(app.current_page, Page::Treasury);
    }

    #[test]
    fn test_business_cycle_wraps() {
        let mut app = app();
        app.previous_business();
        assert_eq!(app.business_idx, BusinessType::ALL.len() - 1);
        app.next_business();
        assert_eq!(app.business_type(), BusinessType::ALL[0]);
    }

    #[test]
    fn test_income_rows_wrap() {
        let mut app = app();
        app.previous_row();
        assert_eq!(app.income_state.selected(), Some(9));
        app.next_row();
        assert_eq!(app.income_state.selected(), Some(0));
    }
}
