use crate::filter::controller::ColumnFilterControl;
use crate::filter::options::FilterOption;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

/// An option that survived the type-to-narrow query
#[derive(Debug, Clone)]
pub struct OptionMatch {
    pub option_index: usize,
    pub indices: Vec<usize>,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct DropdownState {
    pub query: String,
    pub matches: Vec<OptionMatch>,
    pub selected_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropdownAction {
    None,
    /// Raw option value chosen by the user
    Select(String),
    Close,
    Quit,
}

/// Popup listing one column's filter options
pub struct FilterDropdownWidget {
    column: usize,
    header: String,
    blank_label: String,
    options: Vec<FilterOption>,
    state: DropdownState,
    fuzzy_matcher: SkimMatcherV2,
}

impl FilterDropdownWidget {
    /// Open on a control with its current option highlighted
    pub fn new(control: &ColumnFilterControl, blank_label: &str) -> Self {
        let mut widget = Self {
            column: control.column,
            header: control.header.clone(),
            blank_label: blank_label.to_string(),
            options: control.options.clone(),
            state: DropdownState {
                query: String::new(),
                matches: Vec::new(),
                selected_index: 0,
            },
            fuzzy_matcher: SkimMatcherV2::default(),
        };
        widget.update_search(String::new());
        widget.state.selected_index = control.selected_index();
        widget
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn state(&self) -> &DropdownState {
        &self.state
    }

    /// Narrow the options to fuzzy matches of `query`, best first.
    /// The blank option is only listed while the query is empty.
    pub fn update_search(&mut self, query: String) {
        self.state.query = query;

        if self.state.query.is_empty() {
            self.state.matches = (0..self.options.len())
                .map(|option_index| OptionMatch {
                    option_index,
                    indices: Vec::new(),
                    score: 0,
                })
                .collect();
        } else {
            let mut matches: Vec<OptionMatch> = self
                .options
                .iter()
                .enumerate()
                .filter(|(_, option)| !option.is_blank())
                .filter_map(|(option_index, option)| {
                    self.fuzzy_matcher
                        .fuzzy_indices(&option.label, &self.state.query)
                        .map(|(score, indices)| OptionMatch {
                            option_index,
                            indices,
                            score,
                        })
                })
                .collect();
            // Stable sort keeps option order among equal scores
            matches.sort_by(|a, b| b.score.cmp(&a.score));
            self.state.matches = matches;
        }

        self.state.selected_index = 0;
    }

    fn selected_option(&self) -> Option<&FilterOption> {
        self.state
            .matches
            .get(self.state.selected_index)
            .and_then(|m| self.options.get(m.option_index))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DropdownAction {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                DropdownAction::Quit
            }
            KeyCode::Esc => {
                if self.state.query.is_empty() {
                    DropdownAction::Close
                } else {
                    self.update_search(String::new());
                    DropdownAction::None
                }
            }
            KeyCode::Up => {
                self.state.selected_index = self.state.selected_index.saturating_sub(1);
                DropdownAction::None
            }
            KeyCode::Down => {
                if self.state.selected_index < self.state.matches.len().saturating_sub(1) {
                    self.state.selected_index += 1;
                }
                DropdownAction::None
            }
            KeyCode::PageUp => {
                self.state.selected_index = self.state.selected_index.saturating_sub(10);
                DropdownAction::None
            }
            KeyCode::PageDown => {
                let max_index = self.state.matches.len().saturating_sub(1);
                self.state.selected_index = (self.state.selected_index + 10).min(max_index);
                DropdownAction::None
            }
            KeyCode::Home => {
                self.state.selected_index = 0;
                DropdownAction::None
            }
            KeyCode::End => {
                self.state.selected_index = self.state.matches.len().saturating_sub(1);
                DropdownAction::None
            }
            KeyCode::Enter => match self.selected_option() {
                Some(option) => DropdownAction::Select(option.value.clone()),
                None => DropdownAction::None,
            },
            KeyCode::Backspace => {
                let mut query = self.state.query.clone();
                query.pop();
                self.update_search(query);
                DropdownAction::None
            }
            KeyCode::Char(c) => {
                let mut query = self.state.query.clone();
                query.push(c);
                self.update_search(query);
                DropdownAction::None
            }
            _ => DropdownAction::None,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        f.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let query = Paragraph::new(Line::from(vec![
            Span::styled("/ ", Style::default().fg(Color::DarkGray)),
            Span::raw(self.state.query.as_str()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Filter '{}' (type to narrow)", self.header)),
        );
        f.render_widget(query, chunks[0]);

        let items: Vec<ListItem> = self
            .state
            .matches
            .iter()
            .filter_map(|m| self.options.get(m.option_index).map(|o| (m, o)))
            .map(|(m, option)| {
                let marker = if option.selected { "● " } else { "  " };
                let mut spans = vec![Span::styled(marker, Style::default().fg(Color::Green))];
                if option.is_blank() {
                    let label = if self.blank_label.is_empty() {
                        "(no filter)"
                    } else {
                        self.blank_label.as_str()
                    };
                    spans.push(Span::styled(
                        label.to_string(),
                        Style::default().fg(Color::DarkGray),
                    ));
                } else {
                    for (idx, ch) in option.label.chars().enumerate() {
                        let style = if m.indices.contains(&idx) {
                            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        };
                        spans.push(Span::styled(ch.to_string(), style));
                    }
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = format!(
            "{} of {} values (↑/↓ move, Enter select, Esc close)",
            self.state.matches.len(),
            self.options.len().saturating_sub(1)
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("► ");

        let mut list_state = ListState::default();
        if !self.state.matches.is_empty() {
            list_state.select(Some(self.state.selected_index));
        }
        f.render_stateful_widget(list, chunks[1], &mut list_state);
    }
}
