use crate::controls::FilterControls;
use crate::data::{self, Dataset, LoadOutcome, Source};
use crate::filter::{category_options, filter, FilterCriteria, FilteredView};
use crate::map::{LatLng, MapSurface, TerminalMap};
use crate::rain::MatrixRain;
use crate::ui;
use crate::view::{self, Card, CardAction, Display, ListContent};
use ratatui::layout::Rect;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// Progress of the place document load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Application state. Everything is mutated on the UI thread only; the
/// loader hands its result over through `pending`.
pub struct App<M: MapSurface = TerminalMap> {
    pub map: M,
    pub dataset: Dataset,
    pub criteria: FilterCriteria,
    pub filtered: FilteredView,
    pub controls: FilterControls,
    pub display: Display,
    pub load_state: LoadState,
    /// Highlighted card
    pub selected: usize,
    /// One-off message for the status bar
    pub status: Option<String>,
    pub rain: Option<MatrixRain>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    pending: Option<Receiver<LoadOutcome>>,
}

impl<M: MapSurface> App<M> {
    pub fn new(mut map: M, center: LatLng, zoom: f64) -> Self {
        map.initialize(center, zoom);
        Self {
            map,
            dataset: Dataset::default(),
            criteria: FilterCriteria::default(),
            filtered: FilteredView::default(),
            controls: FilterControls::new(category_options(&[])),
            display: Display::default(),
            load_state: LoadState::Idle,
            selected: 0,
            status: None,
            rain: None,
            should_quit: false,
            last_mouse: None,
            pending: None,
        }
    }

    pub fn with_rain(mut self, rain: MatrixRain) -> Self {
        self.rain = Some(rain);
        self
    }

    /// Start loading on a worker thread; the result is picked up by
    /// [`App::poll_load`]
    pub fn begin_load(&mut self, source: Source, min_latency: Duration) {
        log::info!("Loading places from {source}");
        self.load_state = LoadState::Loading;
        self.display.list = ListContent::Loading;
        self.pending = Some(data::spawn_load(source, min_latency));
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Install a finished load, if there is one. Returns true when the
    /// load state changed.
    pub fn poll_load(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                Err(anyhow::anyhow!("loader stopped without a result"))
            }
        };
        self.pending = None;
        self.finish_load(outcome);
        true
    }

    /// Success shows every place with fresh controls; failure leaves an
    /// empty map and the error message in the list. Never panics.
    pub fn finish_load(&mut self, outcome: LoadOutcome) {
        match outcome {
            Ok(dataset) => {
                log::info!("Loaded {} places from database", dataset.len());
                self.controls = FilterControls::new(category_options(&dataset.places));
                self.criteria = FilterCriteria::default();
                self.filtered = FilteredView::all(dataset.len());
                self.dataset = dataset;
                self.selected = 0;
                self.load_state = LoadState::Loaded;
                self.update_display();
            }
            Err(e) => {
                log::error!("Error loading data: {e:#}");
                self.dataset = Dataset::default();
                self.filtered = FilteredView::default();
                self.selected = 0;
                self.map.clear_markers();
                self.display = Display {
                    list: ListContent::Failed,
                    count: 0,
                };
                self.load_state = LoadState::Failed(format!("{e:#}"));
            }
        }
    }

    /// Recompute the filtered view from the current criteria and redraw
    pub fn apply_filters(&mut self) {
        self.filtered = filter(&self.dataset.places, &self.criteria);
        self.selected = 0;
        if self.load_state == LoadState::Loaded {
            self.update_display();
        }
    }

    pub fn update_display(&mut self) {
        view::update_display(
            &mut self.map,
            &mut self.display,
            &self.dataset.places,
            &self.filtered,
        );
    }

    pub fn cards(&self) -> &[Card] {
        self.display.list.cards()
    }

    /// Focus the map on card `index` and open its marker's popup
    pub fn select_card(&mut self, index: usize) {
        if view::select_card(&mut self.map, &self.dataset.places, &self.filtered, index) {
            log::debug!("selected card {index}");
            self.selected = index;
        }
    }

    /// A marker was clicked: open its popup and highlight its card
    pub fn show_marker(&mut self, index: usize) {
        if self.map.open_popup(index) {
            self.selected = index;
        }
    }

    pub fn activate(&mut self, action: CardAction) {
        match action {
            CardAction::Select(index) => self.select_card(index),
            CardAction::OpenWebsite(url) => self.open_website(url),
        }
    }

    pub fn open_website(&mut self, url: String) {
        log::info!("website link: {url}");
        self.status = Some(format!("Website: {url}"));
    }

    /// Website of the highlighted card, if it has one
    pub fn open_selected_website(&mut self) {
        match self.cards().get(self.selected).and_then(Card::website) {
            Some(url) => {
                let url = url.to_string();
                self.open_website(url);
            }
            None => self.status = Some("No website for this place".to_string()),
        }
    }

    pub fn select_next(&mut self) {
        let count = self.cards().len();
        if count > 0 {
            self.selected = (self.selected + 1).min(count - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Advance the backdrop animation when its interval has elapsed
    pub fn tick(&mut self, now: Instant) -> bool {
        self.rain.as_mut().is_some_and(|rain| rain.tick_if_due(now))
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

impl App<TerminalMap> {
    /// Update pane sizes when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        let panes = ui::layout(Rect::new(0, 0, width, height));
        let map = ui::inner(panes.map);
        self.map.resize(map.width, map.height);
        if let Some(rain) = &mut self.rain {
            rain.resize(width, height);
        }
    }

    /// Pan by the mouse movement since the last drag event
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - x as i32) * 2;
            let dy = (last_y as i32 - y as i32) * 4;
            self.map.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn reset_view(&mut self) {
        self.map.reset_view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Place;
    use crate::map::{Basemap, DEFAULT_CENTER, DEFAULT_ZOOM};

    fn app() -> App {
        App::new(TerminalMap::new(80, 40, Basemap::default()), DEFAULT_CENTER, DEFAULT_ZOOM)
    }

    fn dataset() -> Dataset {
        let mut cafe = Place::new("Cafe", 40.75, -73.98, 4.5, &["cafe"]);
        cafe.website = Some("https://cafe.example".into());
        Dataset {
            places: vec![
                cafe,
                Place::new("Library", 40.7532, -73.9822, 4.7, &["library"]),
                Place::new("Park", 40.7812, -73.9665, 0.0, &["park"]),
            ],
            ..Dataset::default()
        }
    }

    #[test]
    fn test_successful_load_shows_everything() {
        let mut app = app();
        app.finish_load(Ok(dataset()));

        assert_eq!(app.load_state, LoadState::Loaded);
        assert_eq!(app.display.count, 3);
        assert_eq!(app.cards().len(), 3);
        assert_eq!(app.map.markers().len(), 3);
        assert_eq!(app.controls.category.value(), "all");
    }

    #[test]
    fn test_failed_load_clears_map_and_shows_error() {
        let mut app = app();
        app.finish_load(Ok(dataset()));
        app.finish_load(Err(anyhow::anyhow!("connection refused")));

        assert!(matches!(app.load_state, LoadState::Failed(ref msg) if msg.contains("connection refused")));
        assert_eq!(app.display.list, ListContent::Failed);
        assert!(app.map.markers().is_empty());
        assert!(app.dataset.is_empty());
    }

    #[test]
    fn test_filters_before_load_keep_loading_message() {
        let mut app = app();
        app.display.list = ListContent::Loading;
        app.criteria.min_rating = 4.0;
        app.apply_filters();
        assert_eq!(app.display.list, ListContent::Loading);
    }

    #[test]
    fn test_card_selection_and_website() {
        let mut app = app();
        app.finish_load(Ok(dataset()));

        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.selected, 2);

        app.activate(CardAction::OpenWebsite("https://cafe.example".into()));
        assert_eq!(app.map.open_popup_index(), None);
        assert_eq!(app.status.as_deref(), Some("Website: https://cafe.example"));

        app.activate(CardAction::Select(1));
        assert_eq!(app.selected, 1);
        assert_eq!(app.map.open_popup_index(), Some(1));
        assert_eq!(app.map.viewport.zoom, crate::map::FOCUS_ZOOM);

        app.selected = 0;
        app.status = None;
        app.open_selected_website();
        assert_eq!(app.status.as_deref(), Some("Website: https://cafe.example"));
    }

    #[test]
    fn test_resize_tracks_map_pane() {
        let mut app = app();
        app.resize(100, 30);
        let map = ui::inner(ui::layout(Rect::new(0, 0, 100, 30)).map);
        assert_eq!(app.map.viewport.width, map.width as usize * 2);
        assert_eq!(app.map.viewport.height, map.height as usize * 4);
    }
}
