use crate::entities::{Patron, PatronRegistry};
use crate::importer::{Diagnostic, ImportReport};
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Patrons,
    ImportLog,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Patrons => Page::ImportLog,
            Page::ImportLog => Page::Patrons,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Patrons => "Patrons",
            Page::ImportLog => "Import Log",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FineFilter {
    All,
    Owing,
    Clear,
}

impl FineFilter {
    pub fn next(&self) -> Self {
        match self {
            FineFilter::All => FineFilter::Owing,
            FineFilter::Owing => FineFilter::Clear,
            FineFilter::Clear => FineFilter::All,
        }
    }

    fn keeps(&self, patron: &Patron) -> bool {
        match self {
            FineFilter::All => true,
            FineFilter::Owing => patron.fine() > 0.0,
            FineFilter::Clear => patron.fine() == 0.0,
        }
    }

    fn label(&self) -> &str {
        match self {
            FineFilter::All => "All",
            FineFilter::Owing => "Owing",
            FineFilter::Clear => "No fine",
        }
    }
}

pub struct App {
    pub patrons: Vec<Patron>,
    pub filtered_patrons: Vec<Patron>,
    pub reports: Vec<ImportReport>,
    pub state: TableState,
    pub log_scroll: u16,
    pub current_page: Page,
    pub show_detail: bool,
    pub filter: FineFilter,
    pub total_fines: f64,
}

impl App {
    /// Snapshot the registry, sorted by id for a stable view.
    pub fn new(registry: &PatronRegistry, reports: Vec<ImportReport>) -> Self {
        let mut patrons: Vec<Patron> = registry.all().cloned().collect();
        patrons.sort_by(|a, b| a.id().cmp(b.id()));

        let mut state = TableState::default();
        if !patrons.is_empty() {
            state.select(Some(0));
        }

        Self {
            filtered_patrons: patrons.clone(),
            patrons,
            reports,
            state,
            log_scroll: 0,
            current_page: Page::Patrons,
            show_detail: false,
            filter: FineFilter::All,
            total_fines: registry.total_fines(),
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_patron(&self) -> Option<&Patron> {
        self.state.selected().and_then(|i| self.filtered_patrons.get(i))
    }

    pub fn apply_filter(&mut self, filter: FineFilter) {
        self.filter = filter;
        self.filtered_patrons = self
            .patrons
            .iter()
            .filter(|p| filter.keeps(p))
            .cloned()
            .collect();

        if !self.filtered_patrons.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn next(&mut self) {
        let len = self.filtered_patrons.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_patrons.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn log_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for report in &self.reports {
            lines.push(Line::from(Span::styled(
                report.summary(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            for diagnostic in &report.diagnostics {
                let color = match diagnostic {
                    Diagnostic::Added { .. } => Color::Green,
                    Diagnostic::Rejected { .. } => Color::Yellow,
                    _ => Color::Red,
                };
                lines.push(Line::from(Span::styled(
                    format!("  {}", diagnostic),
                    Style::default().fg(color),
                )));
            }
            lines.push(Line::from(""));
        }
        lines
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
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
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Char('f') => app.apply_filter(app.filter.next()),
                KeyCode::Char('c') => app.apply_filter(FineFilter::All),
                KeyCode::Down | KeyCode::Char('j') => match app.current_page {
                    Page::Patrons => app.next(),
                    Page::ImportLog => app.log_scroll = app.log_scroll.saturating_add(1),
                },
                KeyCode::Up | KeyCode::Char('k') => match app.current_page {
                    Page::Patrons => app.previous(),
                    Page::ImportLog => app.log_scroll = app.log_scroll.saturating_sub(1),
                },
                KeyCode::Home => {
                    if !app.filtered_patrons.is_empty() {
                        app.state.select(Some(0));
                    }
                    app.log_scroll = 0;
                }
                KeyCode::End => {
                    if !app.filtered_patrons.is_empty() {
                        app.state.select(Some(app.filtered_patrons.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Patrons if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Patrons => render_table(f, chunks[1], app),
        Page::ImportLog => render_import_log(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Patrons, Page::ImportLog].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    let owing = app.patrons.iter().filter(|p| p.fine() > 0.0).count();
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Patrons: {}", app.patrons.len()),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Owing: {}", owing),
        Style::default().fg(Color::Red),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Fines: ${:.2}", app.total_fines),
        Style::default().fg(Color::Yellow),
    ));

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Name", "Address", "Fine"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_patrons.iter().map(|p| {
        let color = if p.fine() > 0.0 { Color::Red } else { Color::Green };
        Row::new(vec![
            Cell::from(p.id().to_string()),
            Cell::from(truncate(p.name(), 28)),
            Cell::from(truncate(p.address(), 38)),
            Cell::from(format!("${:.2}", p.fine())).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(30),
            Constraint::Length(40),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Patrons ({}) ", app.filter.label())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_import_log(f: &mut Frame, area: Rect, app: &App) {
    let log = Paragraph::new(app.log_lines())
        .scroll((app.log_scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Import Diagnostics "),
        );
    f.render_widget(log, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let status = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.filtered_patrons.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        key("Enter"),
        Span::raw(" Details | "),
        key("Tab"),
        Span::raw(" Page | "),
        key("f"),
        Span::raw(" Filter | "),
        key("↑/↓"),
        Span::raw(" Nav | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Patron Details ");

    let Some(p) = app.selected_patron() else {
        f.render_widget(Paragraph::new("No patron selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  ID: ", label), Span::raw(p.id().to_string())]),
        Line::from(""),
        Line::from(vec![Span::styled("  Name: ", label), Span::raw(p.name().to_string())]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Address: ", label),
            Span::raw(p.address().to_string()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Fine: ", label),
            Span::styled(
                format!("${:.2}", p.fine()),
                Style::default().fg(if p.fine() > 0.0 { Color::Red } else { Color::Green }),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::PatronImporter;
    use std::io::Cursor;

    fn app() -> App {
        let mut registry = PatronRegistry::new();
        let report = PatronImporter::default().import_reader(
            Cursor::new("7654321-Bob-B St-0\n1234567-Alice-A St-12\nbad\n"),
            "test",
            &mut registry,
        );
        App::new(&registry, vec![report])
    }

    #[test]
    fn test_app_sorted_by_id() {
        let app = app();
        let ids: Vec<&str> = app.patrons.iter().map(Patron::id).collect();
        assert_eq!(ids, vec!["1234567", "7654321"]);
        assert_eq!(app.selected_patron().map(Patron::id), Some("1234567"));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        app.next();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
    }

    #[test]
    fn test_fine_filter() {
        let mut app = app();
        app.apply_filter(FineFilter::Owing);
        assert_eq!(app.filtered_patrons.len(), 1);
        assert_eq!(app.filtered_patrons[0].id(), "1234567");

        app.apply_filter(app.filter.next());
        assert_eq!(app.filter, FineFilter::Clear);
        assert_eq!(app.filtered_patrons[0].id(), "7654321");
    }

    #[test]
    fn test_log_lines() {
        let app = app();
        // summary + 3 diagnostics + spacer
        assert_eq!(app.log_lines().len(), 5);
        assert_eq!(app.total_fines, 12.0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long street name", 10), "a very ...");
    }
}
