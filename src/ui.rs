use anyhow::{Context, Result};
use correlatives::{
    missing_prerequisites, summarize, unlocked_by, Catalog, Course, CourseStatus, Selection,
    ToggleOutcome,
};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
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
use correlatives::logging::quiet_stderr;
use std::io::{self, Write};

pub struct App {
    pub catalog: Catalog,
    pub selection: Selection,
    pub state: TableState,
    pub show_detail: bool,
    pub message: Option<String>,
    /// Where the course table was drawn last frame (for mouse hits)
    pub table_area: Rect,
}

impl App {
    pub fn new(catalog: Catalog, selection: Selection) -> Self {
        let mut state = TableState::default();
        if !catalog.is_empty() {
            state.select(Some(0));
        }

        Self {
            catalog,
            selection,
            state,
            show_detail: false,
            message: None,
            table_area: Rect::default(),
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_course(&self) -> Option<&Course> {
        self.state.selected().and_then(|i| self.catalog.courses().get(i))
    }

    pub fn status(&self, course: &Course) -> CourseStatus {
        self.selection.status(course)
    }

    /// Toggle the course at table row `index` and select it
    pub fn toggle_at(&mut self, index: usize) {
        let id = match self.catalog.courses().get(index) {
            Some(course) => course.id.clone(),
            None => return,
        };
        self.state.select(Some(index));

        let outcome = self.selection.toggle(&id, &self.catalog);
        self.message = Some(match outcome {
            ToggleOutcome::Completed => format!("✓ {} marked as completed", id),
            ToggleOutcome::Uncompleted => format!("↺ {} unmarked", id),
            ToggleOutcome::Ignored { missing } => {
                format!("✗ {} is locked, missing: {}", id, missing.join(", "))
            }
            ToggleOutcome::Unknown => format!("? {} is not in the catalog", id),
        });
    }

    pub fn toggle_selected(&mut self) {
        if let Some(index) = self.state.selected() {
            self.toggle_at(index);
        }
    }

    pub fn clear(&mut self) {
        let count = self.selection.completed().len();
        self.selection.clear();
        self.message = Some(format!("Cleared {} completed courses", count));
    }

    /// Table row index under a terminal cell, if any.
    ///
    /// Skips the border and header rows and accounts for table scrolling.
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.table_area;
        let first_row = area.y.saturating_add(2);
        let last_row = area.y.saturating_add(area.height).saturating_sub(1);

        if column <= area.x || column >= area.x.saturating_add(area.width).saturating_sub(1) {
            return None;
        }
        if row < first_row || row >= last_row {
            return None;
        }

        let index = (row - first_row) as usize + self.state.offset();
        (index < self.catalog.len()).then_some(index)
    }

    pub fn handle_click(&mut self, column: u16, row: u16) {
        if let Some(index) = self.row_at(column, row) {
            self.toggle_at(index);
        }
    }

    /// Returns `true` when the app should quit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('c') => self.clear(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => {
                if !self.catalog.is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.catalog.is_empty() {
                    self.state.select(Some(self.catalog.len() - 1));
                }
            }
            _ => {}
        }
        false
    }

    pub fn next(&mut self) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    enter_screen(&mut stdout, disable_raw_mode)?;
    let _quiet = quiet_stderr();
    let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => terminal,
        Err(err) => {
            restore_screen(&mut io::stdout(), disable_raw_mode)?;
            return Err(err).context("Failed to set up terminal");
        }
    };

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    restore_screen(terminal.backend_mut(), disable_raw_mode)?;
    terminal.show_cursor()?;

    res.context("Terminal UI failed")
}

/// Switch to the alternate screen with mouse capture. Raw mode is already on;
/// if switching fails it is turned back off before the error is returned.
fn enter_screen<W: Write>(
    out: &mut W,
    restore_raw: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    if let Err(err) = execute!(out, EnterAlternateScreen, EnableMouseCapture) {
        let _ = restore_screen(out, restore_raw);
        return Err(err);
    }
    Ok(())
}

fn restore_screen<W: Write>(
    out: &mut W,
    restore_raw: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    let raw = restore_raw();
    execute!(out, LeaveAlternateScreen, DisableMouseCapture)?;
    raw
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key.code) {
                    return Ok(());
                }
            }
            Event::Mouse(MouseEvent {
                kind, column, row, ..
            }) => match kind {
                MouseEventKind::Down(MouseButton::Left) => app.handle_click(column, row),
                MouseEventKind::ScrollDown => app.next(),
                MouseEventKind::ScrollUp => app.previous(),
                _ => {}
            },
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Course table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

/// Row colors: completed / available / locked
fn row_style(status: CourseStatus) -> Style {
    match status {
        CourseStatus::Completed => Style::default().bg(Color::Green).fg(Color::Black),
        CourseStatus::Available => Style::default().bg(Color::Gray).fg(Color::Black),
        CourseStatus::Locked => Style::default().bg(Color::DarkGray).fg(Color::White),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let summary = summarize(app.selection.completed(), &app.catalog);
    let fingerprint = app.catalog.fingerprint();

    let spans = vec![
        Span::styled(
            "Correlatives",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("catalog {}", &fingerprint[..8]),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("✓ {} completed", summary.completed),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("○ {} available", summary.available),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(
            format!("✗ {} locked", summary.locked),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  /  "),
        Span::styled(
            format!("{} total", summary.total),
            Style::default().fg(Color::White),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    app.table_area = area;

    let header_cells = ["Code", "Name", "Prerequisites"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells).height(1);

    let rows = app.catalog.iter().map(|course| {
        let cells = vec![
            Cell::from(course.id.clone()),
            Cell::from(truncate(&course.name, 46)),
            Cell::from(course.prerequisites.join(", ")),
        ];

        Row::new(cells)
            .height(1)
            .style(row_style(app.selection.status(course)))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(48),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Courses "),
    )
    .highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.catalog.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Green),
        ));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Space/Click", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Toggle | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Clear | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Course Details ");

    let course = match app.selected_course() {
        Some(c) => c,
        None => {
            f.render_widget(Paragraph::new("No course selected").block(block), area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let completed = app.selection.completed();
    let status = app.status(course);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Code: ", label), Span::raw(&course.id)]),
        Line::from(""),
        Line::from(vec![Span::styled("  Name: ", label), Span::raw(&course.name)]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Status: ", label),
            Span::styled(
                status.as_str(),
                Style::default().fg(match status {
                    CourseStatus::Completed => Color::Green,
                    CourseStatus::Available => Color::White,
                    CourseStatus::Locked => Color::Red,
                }),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("  PREREQUISITES", label.add_modifier(Modifier::UNDERLINED))]),
    ];

    if course.prerequisites.is_empty() {
        content.push(Line::from("  none"));
    }
    for prereq in &course.prerequisites {
        let done = completed.contains(prereq);
        let name = app
            .catalog
            .get(prereq)
            .map(|c| c.name.as_str())
            .unwrap_or("(not in catalog)");
        content.push(Line::from(vec![
            Span::styled(
                if done { "  ✓ " } else { "  ✗ " },
                Style::default().fg(if done { Color::Green } else { Color::Red }),
            ),
            Span::raw(format!("{} {}", prereq, name)),
        ]));
    }

    let missing = missing_prerequisites(course, completed);
    if !missing.is_empty() {
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled("  Missing: ", label),
            Span::styled(missing.join(", "), Style::default().fg(Color::Red)),
        ]));
    }

    let unlocks = unlocked_by(&course.id, completed, &app.catalog);
    if !unlocks.is_empty() {
        content.push(Line::from(""));
        content.push(Line::from(vec![Span::styled(
            "  COMPLETING THIS UNLOCKS",
            label.add_modifier(Modifier::UNDERLINED),
        )]));
        for unlocked in unlocks {
            content.push(Line::from(format!("  → {} {}", unlocked.id, unlocked.name)));
        }
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use correlatives::builtin_catalog;
    use ratatui::backend::TestBackend;

    struct BrokenTerminal;

    impl Write for BrokenTerminal {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn app_with(completed: &[&str]) -> App {
        let catalog = builtin_catalog().clone();
        let mut selection = Selection::new();
        selection.seed(completed.iter().copied(), &catalog);
        App::new(catalog, selection)
    }

    fn draw(app: &mut App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_render_lists_every_course() {
        let mut app = app_with(&[]);
        let terminal = draw(&mut app);
        let text = buffer_text(&terminal);

        assert!(text.contains("Code"));
        assert!(text.contains("Prerequisites"));
        for course in builtin_catalog() {
            assert!(text.contains(&course.id), "missing row {}", course.id);
        }
        assert!(text.contains("INGM101, INGM105, ING6102"));
    }

    #[test]
    fn test_row_colors_follow_status() {
        let mut app = app_with(&["INGM101"]);
        let terminal = draw(&mut app);
        let buffer = terminal.backend().buffer();

        // Table starts at y=3; border + header → first course row at y=5
        let x = 5;
        assert_eq!(buffer.get(x, 5).bg, Color::Green); // INGM101 completed
        assert_eq!(buffer.get(x, 6).bg, Color::Gray); // INGM105 available
        assert_eq!(buffer.get(x, 11).bg, Color::DarkGray); // ING6201 locked
    }

    #[test]
    fn test_row_at_maps_clicks_to_courses() {
        let mut app = app_with(&[]);
        draw(&mut app);

        assert_eq!(app.row_at(5, 3), None); // border
        assert_eq!(app.row_at(5, 4), None); // header
        assert_eq!(app.row_at(5, 5), Some(0));
        assert_eq!(app.row_at(5, 11), Some(6));
        assert_eq!(app.row_at(0, 5), None); // left border
        assert_eq!(app.row_at(5, 28), None); // below the table
    }

    #[test]
    fn test_click_toggles_available_course() {
        let mut app = app_with(&[]);
        draw(&mut app);

        app.handle_click(5, 5);

        assert!(app.selection.is_completed("INGM101"));
        assert_eq!(app.state.selected(), Some(0));

        app.handle_click(5, 5);
        assert!(!app.selection.is_completed("INGM101"));
    }

    #[test]
    fn test_click_on_locked_course_is_noop() {
        let mut app = app_with(&["INGM101", "INGM105"]);
        draw(&mut app);
        let before = app.selection.completed().clone();

        app.handle_click(5, 11); // ING6201

        assert_eq!(app.selection.completed(), &before);
        assert_eq!(
            app.message.as_deref(),
            Some("✗ ING6201 is locked, missing: ING6102")
        );
    }

    #[test]
    fn test_keyboard_navigation_and_toggle() {
        let mut app = app_with(&[]);

        app.handle_key(KeyCode::Down);
        assert_eq!(app.state.selected(), Some(1));
        app.handle_key(KeyCode::Char(' '));
        assert!(app.selection.is_completed("INGM105"));

        app.handle_key(KeyCode::Up);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.state.selected(), Some(15)); // wraps

        app.handle_key(KeyCode::Char('c'));
        assert!(app.selection.completed().is_empty());

        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_detail_panel_shows_missing_and_unlocks() {
        let mut app = app_with(&["INGM101", "INGM105"]);
        app.state.select(Some(2)); // ING6102
        app.toggle_detail();

        let text = buffer_text(&draw(&mut app));

        assert!(text.contains("Course Details"));
        assert!(text.contains("COMPLETING THIS UNLOCKS"));
        assert!(text.contains("→ ING6201"));
    }

    #[test]
    fn test_truncate_is_char_aware() {
        assert_eq!(truncate("Álgebra I", 20), "Álgebra I");
        assert_eq!(truncate("Análisis Matemático II", 10), "Análisi...");
    }

    #[test]
    fn test_enter_screen_failure_turns_raw_mode_back_off() {
        let mut restored = false;
        let result = enter_screen(&mut BrokenTerminal, || {
            restored = true;
            Ok(())
        });

        assert!(result.is_err());
        assert!(restored);
    }

    #[test]
    fn test_enter_screen_keeps_raw_mode_on_success() {
        let mut out = Vec::new();
        let mut restored = false;
        enter_screen(&mut out, || {
            restored = true;
            Ok(())
        })
        .unwrap();

        assert!(!restored);
        assert!(!out.is_empty());
    }
}
