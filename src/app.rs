use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};

use crate::display::{
    CurrentPanel, DailyCard, DaySelector, DetailsPanel, HourlyRow, UnitsPanel,
};
use crate::fetch::{Completion, Fetcher};
use crate::presenter::{Presenter, View};
use crate::units::UnitOption;

const MISSING: &str = "--";
const TICK: Duration = Duration::from_millis(50);

/// Everything currently on screen. Filled in by the presenter through `View`.
#[derive(Debug, Default)]
pub struct TuiView {
    pub initial: bool,
    pub no_results: bool,
    pub error: bool,
    pub search_loader: bool,
    pub sections_loading: bool,
    pub current: Option<CurrentPanel>,
    pub details: Option<DetailsPanel>,
    pub daily: Vec<DailyCard>,
    pub days: DaySelector,
    pub hourly: Vec<HourlyRow>,
    pub units: UnitsPanel,
}

impl View for TuiView {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn show_initial(&mut self) {
        self.initial = true;
    }

    fn hide_messages(&mut self) {
        self.initial = false;
        self.no_results = false;
    }

    fn set_search_loader(&mut self, visible: bool) {
        self.search_loader = visible;
    }

    fn set_sections_loading(&mut self, loading: bool) {
        self.sections_loading = loading;
    }

    fn show_no_results(&mut self) {
        self.no_results = true;
    }

    fn show_error(&mut self) {
        self.error = true;
    }

    fn render_current(&mut self, panel: CurrentPanel) {
        self.current = Some(panel);
    }

    fn render_details(&mut self, panel: DetailsPanel) {
        self.details = Some(panel);
    }

    fn render_daily(&mut self, cards: Vec<DailyCard>) {
        self.daily = cards;
    }

    fn render_day_selector(&mut self, selector: DaySelector) {
        self.days = selector;
    }

    fn render_hourly(&mut self, rows: Vec<HourlyRow>) {
        self.hourly = rows;
    }

    fn render_units(&mut self, panel: UnitsPanel) {
        self.units = panel;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Search,
    Units,
    Days,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Search => Self::Units,
            Self::Units => Self::Days,
            Self::Days => Self::Search,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Search => Self::Days,
            Self::Units => Self::Search,
            Self::Days => Self::Units,
        }
    }
}

/// Input line, focus and dropdown state. Purely presentational.
#[derive(Debug, Default)]
pub struct Controls {
    pub input: String,
    pub focus: Focus,
    pub units_open: bool,
    pub days_open: bool,
    pub highlight: usize,
}

impl Controls {
    fn close_dropdowns(&mut self) {
        self.units_open = false;
        self.days_open = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Submit(String),
    ChooseUnit(UnitOption),
    SelectDay(usize),
    Retry,
}

pub fn handle_key(controls: &mut Controls, view: &TuiView, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    // only the retry control is reachable from the error screen
    if view.error {
        return match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter => Some(Action::Retry),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Tab => {
            controls.close_dropdowns();
            controls.focus = controls.focus.next();
            return None;
        }
        KeyCode::BackTab => {
            controls.close_dropdowns();
            controls.focus = controls.focus.prev();
            return None;
        }
        KeyCode::Esc => {
            if controls.units_open || controls.days_open {
                controls.close_dropdowns();
                return None;
            }
            return Some(Action::Quit);
        }
        _ => {}
    }

    match controls.focus {
        Focus::Search => match key.code {
            KeyCode::Char(c) => {
                controls.input.push(c);
                None
            }
            KeyCode::Backspace => {
                controls.input.pop();
                None
            }
            KeyCode::Enter => Some(Action::Submit(std::mem::take(&mut controls.input))),
            _ => None,
        },
        Focus::Units => match key.code {
            KeyCode::Enter if controls.units_open => {
                controls.units_open = false;
                UnitOption::ALL
                    .get(controls.highlight)
                    .map(|option| Action::ChooseUnit(*option))
            }
            KeyCode::Enter => {
                controls.units_open = true;
                controls.highlight = 0;
                None
            }
            KeyCode::Up if controls.units_open => {
                controls.highlight = controls.highlight.saturating_sub(1);
                None
            }
            KeyCode::Down if controls.units_open => {
                controls.highlight = (controls.highlight + 1).min(UnitOption::ALL.len() - 1);
                None
            }
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        Focus::Days => match key.code {
            KeyCode::Enter if controls.days_open => {
                controls.days_open = false;
                Some(Action::SelectDay(controls.highlight))
            }
            KeyCode::Enter if !view.days.options.is_empty() => {
                controls.days_open = true;
                controls.highlight = view.days.selected;
                None
            }
            KeyCode::Up if controls.days_open => {
                controls.highlight = controls.highlight.saturating_sub(1);
                None
            }
            KeyCode::Down if controls.days_open => {
                let last = view.days.options.len().saturating_sub(1);
                controls.highlight = (controls.highlight + 1).min(last);
                None
            }
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
    }
}

pub fn run_app<B: Backend, F: Fetcher>(
    terminal: &mut Terminal<B>,
    presenter: &mut Presenter<TuiView, F>,
    completions: &Receiver<Completion>,
) -> io::Result<()> {
    let mut controls = Controls::default();
    loop {
        terminal.draw(|f| ui(f, presenter.view(), &controls))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match handle_key(&mut controls, presenter.view(), key) {
                        Some(Action::Quit) => return Ok(()),
                        Some(Action::Submit(query)) => {
                            presenter.submit_search(&query, Instant::now());
                        }
                        Some(Action::ChooseUnit(option)) => presenter.choose_unit_option(option),
                        Some(Action::SelectDay(index)) => presenter.select_day(index),
                        Some(Action::Retry) => {
                            controls = Controls::default();
                            presenter.retry();
                        }
                        None => {}
                    }
                }
            }
        }

        while let Ok(completion) = completions.try_recv() {
            presenter.complete(completion);
        }
        presenter.tick(Instant::now());
    }
}

fn panel<'a>(title: impl Into<String>, focused: bool) -> Block<'a> {
    let border = if focused { Color::Yellow } else { Color::Cyan };
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", title.into()),
            Style::default().fg(Color::Yellow),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(border))
        .border_type(BorderType::Rounded)
}

fn value_style() -> Style {
    Style::default().fg(Color::Green)
}

fn display_header<'a>(view: &'a TuiView, controls: &Controls) -> Paragraph<'a> {
    let units_style = if controls.focus == Focus::Units {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    };
    Paragraph::new(Line::from(vec![
        Span::styled(
            " How's the sky looking today?",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(format!("[ Units: {} ▾ ]", view.units.system), units_style),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn display_search<'a>(view: &TuiView, controls: &'a Controls) -> Paragraph<'a> {
    let mut spans = vec![
        Span::raw(" "),
        Span::raw(controls.input.as_str()),
    ];
    if controls.focus == Focus::Search {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    if view.search_loader {
        spans.push(Span::styled(
            "   ⟳ Search in progress",
            Style::default().fg(Color::Magenta),
        ));
    }
    Paragraph::new(Line::from(spans)).block(panel(
        "Search for a place...",
        controls.focus == Focus::Search,
    ))
}

fn display_message<'a>(title: &'a str, lines: &[&'a str], color: Color) -> Paragraph<'a> {
    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    text.extend(lines.iter().map(|line| Line::from(*line)));
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn display_current(view: &TuiView) -> Paragraph<'_> {
    let block = panel("Current Conditions", false);
    let Some(current) = view.current.as_ref().filter(|_| !view.sections_loading) else {
        return Paragraph::new(vec![Line::from(""), Line::from(format!(" {MISSING}"))]).block(block);
    };

    let mut place = vec![
        Span::raw(" "),
        Span::styled(
            current.place.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(region) = &current.region {
        place.push(Span::raw(", "));
        place.push(Span::raw(region.as_str()));
    }
    Paragraph::new(vec![
        Line::from(""),
        Line::from(place),
        Line::from(format!(" {}", current.date)),
        Line::from(vec![
            Span::raw(format!(" {} ", current.icon.glyph())),
            Span::styled(
                current.temperature.as_str(),
                value_style().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {}", current.icon.name())),
        ]),
    ])
    .block(block)
}

fn display_details(view: &TuiView) -> Table<'_> {
    let loading = view.sections_loading;
    let value = |text: Option<&str>| -> Cell<'static> {
        let text = if loading { MISSING } else { text.unwrap_or(MISSING) };
        Cell::from(text.to_string()).style(value_style())
    };
    let details = view.details.as_ref();

    let rows = vec![
        Row::new(vec![Cell::from("")]),
        Row::new(vec![
            Cell::from(" Feels Like"),
            value(details.map(|d| d.feels_like.as_str())),
        ]),
        Row::new(vec![
            Cell::from(" Humidity"),
            value(details.map(|d| d.humidity.as_str())),
        ]),
        Row::new(vec![
            Cell::from(format!(" Wind ({})", view.units.wind_symbol)),
            value(details.map(|d| d.wind.as_str())),
        ]),
        Row::new(vec![
            Cell::from(format!(" Precip ({})", view.units.precipitation_symbol)),
            value(details.map(|d| d.precipitation.as_str())),
        ]),
    ];

    Table::new(rows, [Constraint::Length(16), Constraint::Min(10)])
        .block(panel("Details", false))
}

fn display_daily(view: &TuiView) -> Table<'_> {
    let mut rows = vec![Row::new(vec![Cell::from("")])];
    if view.sections_loading || view.daily.is_empty() {
        rows.push(Row::new(vec![Cell::from(format!(" {MISSING}"))]));
    } else {
        for card in &view.daily {
            rows.push(Row::new(vec![
                Cell::from(format!(" {}", card.day)),
                Cell::from(card.icon.glyph()),
                Cell::from(card.max.as_str()).style(value_style()),
                Cell::from(card.min.as_str()).style(Style::default().fg(Color::Blue)),
            ]));
        }
    }

    Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .block(panel("Daily forecast", false))
}

fn display_hourly<'a>(view: &'a TuiView, controls: &Controls) -> Table<'a> {
    let title = format!(
        "Hourly forecast · {} ▾",
        view.days.label().unwrap_or(MISSING)
    );

    let mut rows = vec![Row::new(vec![Cell::from("")])];
    if view.sections_loading || view.hourly.is_empty() {
        rows.push(Row::new(vec![Cell::from(format!(" {MISSING}"))]));
    } else {
        for hour in &view.hourly {
            rows.push(Row::new(vec![
                Cell::from(format!(" {}", hour.time)),
                Cell::from(hour.icon.glyph()),
                Cell::from(hour.temperature.as_str()).style(value_style()),
            ]));
        }
    }

    Table::new(
        rows,
        [Constraint::Length(7), Constraint::Length(3), Constraint::Length(6)],
    )
    .block(panel(title, controls.focus == Focus::Days))
}

fn dropdown<'a>(labels: Vec<(String, bool)>, highlight: usize) -> List<'a> {
    let items: Vec<ListItem> = labels
        .into_iter()
        .enumerate()
        .map(|(i, (label, selected))| {
            let marker = if selected { "✓ " } else { "  " };
            let mut style = Style::default();
            if i == highlight {
                style = style.fg(Color::Black).bg(Color::Yellow);
            }
            ListItem::new(Line::from(Span::styled(format!("{marker}{label}"), style)))
        })
        .collect();
    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .border_type(BorderType::Rounded),
    )
}

/// Rect of `width` x `height` hanging below the right edge of `anchor`, kept inside `bounds`.
fn dropdown_area(anchor: Rect, width: u16, height: u16, bounds: Rect) -> Rect {
    let width = width.min(bounds.width);
    let x = anchor.right().saturating_sub(width).max(bounds.x);
    let y = anchor.bottom().min(bounds.bottom());
    let height = height.min(bounds.bottom().saturating_sub(y));
    Rect::new(x, y, width, height)
}

pub fn ui(f: &mut Frame, view: &TuiView, controls: &Controls) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " Tab focus · Enter select · Esc close/quit · Ctrl-C quit",
            Style::default().fg(Color::DarkGray),
        ))),
        rows[3],
    );

    if view.error {
        let error = display_message(
            "Something went wrong",
            &[
                "We couldn't connect to the server (API error). Please try again in a few moments.",
                "",
                "[r] Retry",
            ],
            Color::Red,
        )
        .block(panel("Error", true));
        let body = Rect::new(rows[0].x, rows[0].y, rows[0].width, rows[2].bottom() - rows[0].y);
        f.render_widget(error, body);
        return;
    }

    f.render_widget(display_header(view, controls), rows[0]);
    f.render_widget(display_search(view, controls), rows[1]);

    let mut hourly_area = None;
    if view.initial {
        f.render_widget(
            display_message(
                "Welcome",
                &["Type a place name and press Enter to see its weather."],
                Color::Yellow,
            ),
            rows[2],
        );
    } else if view.no_results {
        f.render_widget(
            display_message("No search result found!", &[], Color::Yellow),
            rows[2],
        );
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[2]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Min(0),
            ])
            .split(columns[0]);

        f.render_widget(display_current(view), left[0]);
        f.render_widget(display_details(view), left[1]);
        f.render_widget(display_daily(view), left[2]);
        f.render_widget(display_hourly(view, controls), columns[1]);
        hourly_area = Some(columns[1]);
    }

    if controls.units_open {
        let labels = view
            .units
            .options
            .iter()
            .map(|(option, selected)| (option.label().to_string(), *selected))
            .collect();
        let popup = dropdown_area(rows[0], 26, UnitOption::ALL.len() as u16 + 2, area);
        f.render_widget(Clear, popup);
        f.render_widget(dropdown(labels, controls.highlight), popup);
    }

    if controls.days_open {
        let labels = view
            .days
            .options
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i == view.days.selected))
            .collect();
        let anchor = hourly_area.unwrap_or(rows[1]);
        let anchor = Rect::new(anchor.x, anchor.y, anchor.width, 1);
        let popup = dropdown_area(anchor, 18, view.days.options.len() as u16 + 2, area);
        f.render_widget(Clear, popup);
        f.render_widget(dropdown(labels, controls.highlight), popup);
    }
}
