//! Wires user actions to network requests and drives the view through
//! `Idle -> SearchLoading -> {Displaying, Empty, Error}`.

use std::time::{Duration, Instant};

use chrono::Timelike;

use crate::dates::{Clock, LocalClock};
use crate::display::{
    self, CurrentPanel, DailyCard, DaySelector, DetailsPanel, HourlyRow, UnitsPanel,
};
use crate::error::TransportError;
use crate::fetch::{Completion, Fetcher, RequestId};
use crate::units::{UnitChoice, UnitOption, UnitsState};
use crate::weather::{ForecastData, Location};

/// Delay before the search loader appears, so fast answers never flash it.
pub const SEARCH_LOADER_DELAY: Duration = Duration::from_millis(100);

/// Number of selectable forecast days.
pub const FORECAST_DAYS: usize = 7;

/// Rendering target. The presenter only ever talks to the screen through this.
pub trait View {
    /// Drop everything shown and go back to a blank screen.
    fn reset(&mut self);
    fn show_initial(&mut self);
    /// Hide the welcome and "no results" messages ahead of a new search.
    fn hide_messages(&mut self);
    fn set_search_loader(&mut self, visible: bool);
    fn set_sections_loading(&mut self, loading: bool);
    fn show_no_results(&mut self);
    /// Replaces the main content and title with the error message and retry control.
    fn show_error(&mut self);
    fn render_current(&mut self, panel: CurrentPanel);
    fn render_details(&mut self, panel: DetailsPanel);
    fn render_daily(&mut self, cards: Vec<DailyCard>);
    fn render_day_selector(&mut self, selector: DaySelector);
    fn render_hourly(&mut self, rows: Vec<HourlyRow>);
    fn render_units(&mut self, panel: UnitsPanel);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SearchLoading,
    Displaying,
    Empty,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub selected_day: usize,
    pub last_location: Option<Location>,
    pub last_forecast: Option<ForecastData>,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub units: UnitsState,
    pub view: ViewState,
}

/// An action scheduled for a later instant that can be called off before it runs.
#[derive(Debug, Default)]
pub struct DelayedAction {
    due: Option<Instant>,
}

impl DelayedAction {
    pub fn schedule(&mut self, due: Instant) {
        self.due = Some(due);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    /// True exactly once, on the first call at or after the due instant.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Geocode(RequestId),
    Forecast(RequestId),
}

pub struct Presenter<V, F> {
    view: V,
    fetcher: F,
    clock: Box<dyn Clock>,
    initial_units: UnitsState,
    state: AppState,
    phase: Phase,
    pending: Option<Pending>,
    next_id: u64,
    search_loader: DelayedAction,
}

impl<V: View, F: Fetcher> Presenter<V, F> {
    pub fn new(view: V, fetcher: F) -> Self {
        let mut presenter = Self {
            view,
            fetcher,
            clock: Box::new(LocalClock),
            initial_units: UnitsState::default(),
            state: AppState::default(),
            phase: Phase::Idle,
            pending: None,
            next_id: 0,
            search_loader: DelayedAction::default(),
        };
        presenter.show_initial_state();
        presenter
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Units the app starts with, and returns to on retry.
    pub fn with_units(mut self, units: UnitsState) -> Self {
        self.initial_units = units;
        self.state.units = units;
        self.view.render_units(display::units_panel(&units));
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Starts a search for `input`. Blank input is ignored and returns false.
    pub fn submit_search(&mut self, input: &str, now: Instant) -> bool {
        let query = input.trim();
        if query.is_empty() {
            return false;
        }

        let id = self.next_request_id();
        if self.pending.is_some() {
            tracing::debug!(?id, "new search supersedes the pending one");
        }
        tracing::info!(query, ?id, "search submitted");

        self.view.hide_messages();
        self.phase = Phase::SearchLoading;
        self.pending = Some(Pending::Geocode(id));
        self.search_loader.schedule(now + SEARCH_LOADER_DELAY);
        self.fetcher.geocode(id, query.to_string());
        true
    }

    /// Runs delayed actions that have come due.
    pub fn tick(&mut self, now: Instant) {
        if self.search_loader.fire(now) && self.pending.is_some() {
            self.view.set_search_loader(true);
        }
    }

    pub fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Geocoded { id, result } => {
                if self.pending != Some(Pending::Geocode(id)) {
                    tracing::debug!(?id, "dropping superseded geocoding result");
                    return;
                }
                match result {
                    Ok(Some(location)) => self.location_resolved(id, location),
                    Ok(None) => self.no_results(),
                    Err(err) => self.fail(err),
                }
            }
            Completion::Forecast { id, result } => {
                if self.pending != Some(Pending::Forecast(id)) {
                    tracing::debug!(?id, "dropping superseded forecast");
                    return;
                }
                match result {
                    Ok(data) => self.forecast_loaded(data),
                    Err(err) => self.fail(err),
                }
            }
        }
    }

    /// Shows the hourly forecast for `index` (0 is today). No refetch.
    pub fn select_day(&mut self, index: usize) {
        if index >= FORECAST_DAYS {
            tracing::debug!(index, "ignoring out of range day");
            return;
        }
        self.state.view.selected_day = index;

        let Some(data) = &self.state.view.last_forecast else {
            return;
        };
        let hour = self.clock.now().hour();
        self.view.render_hourly(display::hourly_rows(
            &data.hourly,
            index,
            hour,
            &self.state.units,
        ));
        self.view
            .render_day_selector(display::day_selector(&data.daily, index));
    }

    pub fn change_unit(&mut self, choice: UnitChoice) {
        self.state.units.apply(choice);
        tracing::debug!(?choice, system = ?self.state.units.system(), "unit changed");
        self.units_changed();
    }

    pub fn switch_to_imperial(&mut self) {
        self.state.units.switch_to_imperial();
        tracing::debug!("switched to imperial");
        self.units_changed();
    }

    pub fn choose_unit_option(&mut self, option: UnitOption) {
        match option {
            UnitOption::Imperial => self.switch_to_imperial(),
            UnitOption::Unit(choice) => self.change_unit(choice),
        }
    }

    /// Back to the state the app started in. In-flight answers are ignored.
    pub fn retry(&mut self) {
        tracing::info!("restarting from initial state");
        self.state = AppState {
            units: self.initial_units,
            view: ViewState::default(),
        };
        self.phase = Phase::Idle;
        self.pending = None;
        self.search_loader.cancel();
        self.view.reset();
        self.show_initial_state();
    }

    fn show_initial_state(&mut self) {
        self.view.show_initial();
        self.view.render_units(display::units_panel(&self.state.units));
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_id += 1;
        RequestId(self.next_id)
    }

    fn location_resolved(&mut self, id: RequestId, location: Location) {
        tracing::info!(
            name = %location.name,
            region = ?location.admin_region,
            latitude = location.latitude,
            longitude = location.longitude,
            "location resolved"
        );
        self.state.view.last_location = Some(location.clone());
        self.view.set_sections_loading(true);
        self.pending = Some(Pending::Forecast(id));
        self.fetcher.forecast(id, location);
    }

    fn no_results(&mut self) {
        tracing::warn!("search matched no location");
        self.finish_search();
        self.phase = Phase::Empty;
        self.view.show_no_results();
    }

    fn forecast_loaded(&mut self, data: ForecastData) {
        tracing::info!(
            days = data.daily.days.len(),
            hours = data.hourly.hours.len(),
            "forecast loaded"
        );
        self.finish_search();
        let days = data.daily.days.len();
        if days > 0 && self.state.view.selected_day >= days {
            self.state.view.selected_day = days - 1;
        }
        self.state.view.last_forecast = Some(data);
        self.render_all();
        self.view.set_sections_loading(false);
        self.phase = Phase::Displaying;
    }

    fn fail(&mut self, err: TransportError) {
        tracing::error!(error = %err, "weather lookup failed");
        self.finish_search();
        self.view.set_sections_loading(false);
        self.phase = Phase::Error;
        self.view.show_error();
    }

    fn finish_search(&mut self) {
        self.pending = None;
        self.search_loader.cancel();
        self.view.set_search_loader(false);
    }

    fn units_changed(&mut self) {
        self.render_all();
        self.view.render_units(display::units_panel(&self.state.units));
    }

    /// Rebuilds every section from cached data; does nothing before the first forecast.
    fn render_all(&mut self) {
        let (Some(location), Some(data)) =
            (&self.state.view.last_location, &self.state.view.last_forecast)
        else {
            return;
        };
        let units = &self.state.units;
        let day = self.state.view.selected_day;
        let now = self.clock.now();

        self.view
            .render_current(display::current_panel(location, data, units, now));
        self.view
            .render_details(display::details_panel(&data.current, units));
        self.view.render_daily(display::daily_cards(&data.daily, units));
        self.view
            .render_day_selector(display::day_selector(&data.daily, day));
        self.view
            .render_hourly(display::hourly_rows(&data.hourly, day, now.hour(), units));
    }
}
