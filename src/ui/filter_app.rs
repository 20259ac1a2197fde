use crate::config::config::DisplayConfig;
use crate::data::data_provider::{DataProvider, FilterableView};
use crate::data::data_view::DataView;
use crate::filter::controller::{ColumnFilterController, SelectionOutcome};
use crate::utils::logging::LogRingBuffer;
use crate::widgets::filter_dropdown_widget::{DropdownAction, FilterDropdownWidget};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Terminal browser with a filter dropdown on every column header
pub struct FilterApp {
    views: Vec<DataView>,
    controllers: Vec<ColumnFilterController>,
    current_table: usize,
    current_column: usize,
    selected_row: usize,
    row_offset: usize,
    column_offset: usize,
    dropdown: Option<FilterDropdownWidget>,
    show_logs: bool,
    log_buffer: Option<LogRingBuffer>,
    status_message: String,
    display: DisplayConfig,
}

impl FilterApp {
    /// `controllers[i]` must already be initialized against `views[i]`
    pub fn new(
        views: Vec<DataView>,
        controllers: Vec<ColumnFilterController>,
        display: DisplayConfig,
        log_buffer: Option<LogRingBuffer>,
    ) -> Self {
        let status_message = match views.len() {
            0 => "No tables loaded".to_string(),
            1 => "Enter/f to filter the current column".to_string(),
            n => format!("{} tables loaded - Tab switches table", n),
        };
        Self {
            views,
            controllers,
            current_table: 0,
            current_column: 0,
            selected_row: 0,
            row_offset: 0,
            column_offset: 0,
            dropdown: None,
            show_logs: false,
            log_buffer,
            status_message,
            display,
        }
    }

    pub fn current_view(&self) -> Option<&DataView> {
        self.views.get(self.current_table)
    }

    pub fn current_column(&self) -> usize {
        self.current_column
    }

    pub fn is_dropdown_open(&self) -> bool {
        self.dropdown.is_some()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.ui(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if self.handle_key(key) == AppAction::Quit {
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if let Some(dropdown) = self.dropdown.as_mut() {
            return match dropdown.handle_key(key) {
                DropdownAction::None => AppAction::Continue,
                DropdownAction::Close => {
                    self.dropdown = None;
                    AppAction::Continue
                }
                DropdownAction::Quit => AppAction::Quit,
                DropdownAction::Select(value) => {
                    let column = dropdown.column();
                    self.dropdown = None;
                    self.apply_selection(column, &value);
                    AppAction::Continue
                }
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return AppAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return AppAction::Quit
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.current_column = self.current_column.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let columns = self.current_view().map(|v| v.get_column_count()).unwrap_or(0);
                if self.current_column + 1 < columns {
                    self.current_column += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_row = self.selected_row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let rows = self.visible_row_count();
                if self.selected_row + 1 < rows {
                    self.selected_row += 1;
                }
            }
            KeyCode::PageUp => {
                self.selected_row = self.selected_row.saturating_sub(20);
            }
            KeyCode::PageDown => {
                let last = self.visible_row_count().saturating_sub(1);
                self.selected_row = (self.selected_row + 20).min(last);
            }
            KeyCode::Enter | KeyCode::Char('f') => self.open_dropdown(),
            KeyCode::Char('c') => {
                let column = self.current_column;
                self.apply_selection(column, "");
            }
            KeyCode::Char('C') => self.clear_all_filters(),
            KeyCode::Tab => self.switch_table(1),
            KeyCode::BackTab => self.switch_table(self.views.len().saturating_sub(1)),
            KeyCode::F(5) => self.show_logs = !self.show_logs,
            _ => {}
        }
        AppAction::Continue
    }

    fn visible_row_count(&self) -> usize {
        self.current_view().map(|v| v.get_row_count()).unwrap_or(0)
    }

    fn open_dropdown(&mut self) {
        let Some(controller) = self.controllers.get(self.current_table) else {
            return;
        };
        match controller.control(self.current_column) {
            Some(control) => {
                debug!("Opening filter dropdown for column {}", control.column);
                self.dropdown = Some(FilterDropdownWidget::new(
                    control,
                    &self.display.blank_option_label,
                ));
            }
            None => self.status_message = "No column to filter".to_string(),
        }
    }

    fn apply_selection(&mut self, column: usize, value: &str) {
        let (Some(view), Some(controller)) = (
            self.views.get_mut(self.current_table),
            self.controllers.get_mut(self.current_table),
        ) else {
            return;
        };

        self.status_message = match controller.on_selection_changed(view, column, value) {
            Ok(SelectionOutcome::Unchanged) => "Filter unchanged".to_string(),
            Ok(SelectionOutcome::Applied { visible_rows }) => {
                format!("Filtered to {} rows", visible_rows)
            }
            Ok(SelectionOutcome::Cleared { visible_rows }) => {
                format!("Filter cleared - {} rows", visible_rows)
            }
            Err(e) => {
                warn!("Selection on column {} failed: {}", column, e);
                format!("Error: {}", e)
            }
        };
        self.clamp_selection();
    }

    fn clear_all_filters(&mut self) {
        if let (Some(view), Some(controller)) = (
            self.views.get_mut(self.current_table),
            self.controllers.get_mut(self.current_table),
        ) {
            controller.clear_all(view);
            self.status_message = format!("All filters cleared - {} rows", view.get_row_count());
        }
        self.clamp_selection();
    }

    fn switch_table(&mut self, step: usize) {
        if self.views.len() < 2 {
            return;
        }
        self.current_table = (self.current_table + step) % self.views.len();
        self.current_column = 0;
        self.column_offset = 0;
        self.selected_row = 0;
        self.row_offset = 0;
        if let Some(view) = self.current_view() {
            self.status_message = format!("Table '{}'", view.name());
        }
    }

    fn clamp_selection(&mut self) {
        let rows = self.visible_row_count();
        if self.selected_row >= rows {
            self.selected_row = rows.saturating_sub(1);
        }
    }

    /// Keep the selected row inside a window of `height` rows
    fn scroll_rows(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected_row < self.row_offset {
            self.row_offset = self.selected_row;
        } else if self.selected_row >= self.row_offset + height {
            self.row_offset = self.selected_row + 1 - height;
        }
    }

    /// Keep the current column inside the horizontal window
    fn scroll_columns(&mut self, widths: &[u16], available: u16) {
        if self.current_column < self.column_offset {
            self.column_offset = self.current_column;
        }
        loop {
            let used: u32 = widths
                .iter()
                .skip(self.column_offset)
                .take(self.current_column + 1 - self.column_offset)
                .map(|w| u32::from(*w) + 1)
                .sum();
            if used <= u32::from(available) || self.column_offset >= self.current_column {
                break;
            }
            self.column_offset += 1;
        }
    }

    pub fn ui(&mut self, f: &mut Frame) {
        let mut constraints = vec![Constraint::Min(5)];
        if self.show_logs {
            constraints.push(Constraint::Length(8));
        }
        constraints.push(Constraint::Length(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(f.area());

        self.render_table(f, chunks[0]);
        if self.show_logs {
            self.render_logs(f, chunks[1]);
        }
        self.render_status(f, chunks[chunks.len() - 1]);

        if let Some(dropdown) = &self.dropdown {
            dropdown.render(f, centered_rect(50, 70, f.area()));
        }
    }

    fn render_table(&mut self, f: &mut Frame, area: Rect) {
        let max_width = self.display.max_column_width.max(4);
        let Some(widths) = self.current_view().map(|view| {
            view.get_column_widths()
                .iter()
                .map(|w| u16::try_from(*w).unwrap_or(u16::MAX).saturating_add(2).clamp(4, max_width))
                .collect::<Vec<u16>>()
        }) else {
            let empty = Paragraph::new("No data loaded")
                .block(Block::default().borders(Borders::ALL).title("Results"));
            f.render_widget(empty, area);
            return;
        };
        let row_number_width: u16 = if self.display.show_row_numbers { 7 } else { 0 };
        let available = area.width.saturating_sub(2 + row_number_width);

        // Header row plus its margin and the two borders
        let body_height = area.height.saturating_sub(4) as usize;
        self.scroll_rows(body_height);
        self.scroll_columns(&widths, available);

        let Some(view) = self.views.get(self.current_table) else {
            return;
        };
        let filters = view.filters();
        let columns: Vec<usize> = (self.column_offset..widths.len()).collect();

        let mut header_cells = Vec::new();
        if self.display.show_row_numbers {
            header_cells.push(Cell::from("#").style(Style::default().fg(Color::DarkGray)));
        }
        for &col in &columns {
            let name = view.column_header(col).unwrap_or_default();
            let label = if filters.is_active(col) {
                format!("{} ▼=", name)
            } else {
                format!("{} ▾", name)
            };
            let mut style = Style::default().fg(Color::Yellow);
            if filters.is_active(col) {
                style = style.fg(Color::Green);
            }
            if col == self.current_column {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            header_cells.push(Cell::from(label).style(style));
        }
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let rows: Vec<Row> = view
            .visible_row_indices()
            .iter()
            .enumerate()
            .skip(self.row_offset)
            .take(body_height)
            .filter_map(|(pos, &row_idx)| view.source().rows.get(row_idx).map(|r| (pos, r)))
            .map(|(pos, row)| {
                let mut cells = Vec::new();
                if self.display.show_row_numbers {
                    cells.push(
                        Cell::from((pos + 1).to_string()).style(Style::default().fg(Color::DarkGray)),
                    );
                }
                for &col in &columns {
                    let cell = match row.get(col) {
                        Some(value) if !value.is_null() => Cell::from(value.to_string()),
                        _ => Cell::from(self.display.null_display.clone())
                            .style(Style::default().fg(Color::DarkGray)),
                    };
                    cells.push(cell);
                }
                Row::new(cells).height(1)
            })
            .collect();

        let mut constraints = Vec::new();
        if self.display.show_row_numbers {
            constraints.push(Constraint::Length(row_number_width));
        }
        constraints.extend(columns.iter().map(|&c| Constraint::Length(widths[c])));

        let title = format!(
            "{} - {}/{} rows, {} filters",
            view.name(),
            view.get_row_count(),
            view.total_row_count(),
            filters.active_count()
        );
        let table = Table::new(rows, constraints)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default();
        if view.get_row_count() > 0 {
            state.select(Some(self.selected_row.saturating_sub(self.row_offset)));
        }
        f.render_stateful_widget(table, area, &mut state);
    }

    fn render_logs(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .log_buffer
            .as_ref()
            .map(|buffer| {
                buffer
                    .recent(area.height.saturating_sub(2) as usize)
                    .iter()
                    .map(|entry| Line::from(entry.format_for_display()))
                    .collect()
            })
            .unwrap_or_default();
        let logs = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Log (F5)"))
            .style(Style::default().fg(Color::Gray));
        f.render_widget(logs, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let column_name = self
            .current_view()
            .and_then(|v| v.column_header(self.current_column))
            .unwrap_or_default();
        let status_line = Line::from(vec![
            Span::styled(&self.status_message, Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled(
                column_name,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | Enter=Filter c=Clear C=Clear all F5=Log q=Quit"),
        ]);
        let status = Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray));
        f.render_widget(status, area);
    }
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn run_filter_app(
    views: Vec<DataView>,
    controllers: Vec<ColumnFilterController>,
    display: DisplayConfig,
    log_buffer: Option<LogRingBuffer>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = FilterApp::new(views, controllers, display, log_buffer);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{DataColumn, DataRow, DataTable, DataValue};
    use crate::filter::controller::initialize_tables;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn create_app(tables: usize) -> FilterApp {
        let mut views: Vec<DataView> = (0..tables)
            .map(|t| {
                let mut table = DataTable::new(format!("table{}", t));
                table.add_column(DataColumn::new("otu"));
                table.add_column(DataColumn::new("phylum"));
                for (otu, phylum) in [
                    ("Otu1", "Firmicutes"),
                    ("Otu2", "Bacteroidetes"),
                    ("Otu3", "Firmicutes"),
                ] {
                    table
                        .add_row(DataRow::new(vec![
                            DataValue::String(otu.to_string()),
                            DataValue::String(phylum.to_string()),
                        ]))
                        .unwrap();
                }
                DataView::new(Arc::new(table))
            })
            .collect();
        let controllers = initialize_tables(&mut views, "");
        FilterApp::new(views, controllers, DisplayConfig::default(), None)
    }

    fn press(app: &mut FilterApp, code: KeyCode) -> AppAction {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn screen_text(app: &mut FilterApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| app.ui(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_filter_through_dropdown() {
        let mut app = create_app(1);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_column(), 1);

        press(&mut app, KeyCode::Enter);
        assert!(app.is_dropdown_open());

        // blank, Bacteroidetes, Firmicutes
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        assert!(!app.is_dropdown_open());
        assert_eq!(app.current_view().unwrap().get_row_count(), 2);
        assert_eq!(app.status_message(), "Filtered to 2 rows");
    }

    #[test]
    fn test_clear_column_and_all() {
        let mut app = create_app(1);
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Enter);
        // First column has no "bac" value; the query matched nothing
        assert!(app.is_dropdown_open());
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        assert!(!app.is_dropdown_open());

        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.current_view().unwrap().get_row_count(), 1);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.current_view().unwrap().get_row_count(), 3);

        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('C'));
        assert_eq!(app.current_view().unwrap().get_row_count(), 3);
        assert!(app.status_message().starts_with("All filters cleared"));
    }

    #[test]
    fn test_tab_switches_tables() {
        let mut app = create_app(2);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view().unwrap().name(), "table1");
        assert_eq!(app.current_column(), 0);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_view().unwrap().name(), "table0");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = create_app(1);
        assert_eq!(press(&mut app, KeyCode::Char('q')), AppAction::Quit);
        assert_eq!(press(&mut app, KeyCode::Esc), AppAction::Quit);
    }

    #[test]
    fn test_render_marks_filtered_column() {
        let mut app = create_app(1);
        let text = screen_text(&mut app);
        assert!(text.contains("otu ▾"));
        assert!(text.contains("3/3 rows"));

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        let text = screen_text(&mut app);
        assert!(text.contains("phylum ▼="));
        assert!(text.contains("1/3 rows"));
        assert!(text.contains("Otu2"));
        assert!(!text.contains("Otu1"));
    }

    #[test]
    fn test_render_with_dropdown_open() {
        let mut app = create_app(1);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        let text = screen_text(&mut app);
        assert!(text.contains("Filter 'phylum'"));
        assert!(text.contains("(no filter)"));
    }
}
