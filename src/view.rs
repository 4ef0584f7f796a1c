use crate::data::Place;
use crate::filter::FilteredView;
use crate::map::{LatLng, MapSurface, FOCUS_ZOOM};

pub const LOADING_MESSAGE: &str = "LOADING DATA FROM MAINFRAME";
pub const NO_RESULTS_MESSAGE: &str = "No places found with these filters.";
pub const LOAD_ERROR_MESSAGE: &str =
    "[ERROR] Failed to connect to database. Check the log for details.";
/// Shown when a place has no type tags
pub const FALLBACK_TYPE: &str = "place";

/// One line of a card, tagged with what a click on it does
#[derive(Debug, Clone, PartialEq)]
pub enum CardLine {
    Type(String),
    Name(String),
    Address(String),
    Rating(f64),
    Website(String),
    Phone(String),
    Access { wheelchair: Option<bool>, open_now: Option<bool> },
}

/// List entry for the place at `index` of the filtered view
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub index: usize,
    pub lines: Vec<CardLine>,
}

impl Card {
    pub fn from_place(index: usize, place: &Place) -> Self {
        let primary = place.primary_type().unwrap_or(FALLBACK_TYPE);
        let mut lines = vec![
            CardLine::Type(primary.replace('_', " ")),
            CardLine::Name(place.name.clone()),
            CardLine::Address(place.address.clone()),
        ];
        if place.is_rated() {
            lines.push(CardLine::Rating(place.rating));
        }
        if let Some(website) = &place.website {
            lines.push(CardLine::Website(website.clone()));
        }
        if let Some(phone) = &place.phone {
            lines.push(CardLine::Phone(phone.clone()));
        }
        if place.wheelchair_accessible.is_some() || place.open_now.is_some() {
            lines.push(CardLine::Access {
                wheelchair: place.wheelchair_accessible,
                open_now: place.open_now,
            });
        }
        Self { index, lines }
    }

    /// Rows on screen, including the separator below the card
    pub fn height(&self) -> usize {
        self.lines.len() + 1
    }

    pub fn website(&self) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            CardLine::Website(url) => Some(url.as_str()),
            _ => None,
        })
    }
}

/// What the list area currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum ListContent {
    Loading,
    Failed,
    Empty,
    Cards(Vec<Card>),
}

impl ListContent {
    pub fn cards(&self) -> &[Card] {
        match self {
            ListContent::Cards(cards) => cards,
            _ => &[],
        }
    }
}

/// List and counter state, rebuilt by [`update_display`]
#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    pub list: ListContent,
    pub count: usize,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            list: ListContent::Loading,
            count: 0,
        }
    }
}

/// Result of clicking somewhere in the list
#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    Select(usize),
    OpenWebsite(String),
}

pub fn render_map<M: MapSurface + ?Sized>(map: &mut M, dataset: &[Place], view: &FilteredView) {
    let places: Vec<&Place> = view.places(dataset).collect();
    map.render_markers(&places);
}

pub fn render_list(display: &mut Display, dataset: &[Place], view: &FilteredView) {
    display.list = if view.is_empty() {
        ListContent::Empty
    } else {
        ListContent::Cards(
            view.places(dataset)
                .enumerate()
                .map(|(i, place)| Card::from_place(i, place))
                .collect(),
        )
    };
}

pub fn render_count(display: &mut Display, view: &FilteredView) {
    display.count = view.len();
}

/// Rebuild markers, cards and counter from the same filtered view, in one go
pub fn update_display<M: MapSurface + ?Sized>(
    map: &mut M,
    display: &mut Display,
    dataset: &[Place],
    view: &FilteredView,
) {
    render_map(map, dataset, view);
    render_list(display, dataset, view);
    render_count(display, view);
}

/// Center the map on card `index` and open the marker with the same index
pub fn select_card<M: MapSurface + ?Sized>(
    map: &mut M,
    dataset: &[Place],
    view: &FilteredView,
    index: usize,
) -> bool {
    match view.get(dataset, index) {
        Some(place) => {
            map.focus_on(LatLng::new(place.lat, place.lng), FOCUS_ZOOM);
            map.open_popup(index)
        }
        None => false,
    }
}

/// First list row to draw so the selected card is fully visible
pub fn list_scroll(cards: &[Card], selected: usize, visible_rows: usize) -> usize {
    let start: usize = cards.iter().take(selected).map(Card::height).sum();
    let end = start + cards.get(selected).map_or(0, Card::height);
    if end <= visible_rows {
        0
    } else if end - start > visible_rows {
        start
    } else {
        end - visible_rows
    }
}

/// Map a click on list row `row` (after scrolling) to a card action.
/// A click on the website line only opens the website.
pub fn hit_test(cards: &[Card], scroll: usize, row: usize) -> Option<CardAction> {
    let mut target = scroll + row;
    for card in cards {
        if target < card.height() {
            return Some(match card.lines.get(target) {
                Some(CardLine::Website(url)) => CardAction::OpenWebsite(url.clone()),
                _ => CardAction::Select(card.index),
            });
        }
        target -= card.height();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, Category, FilterCriteria};
    use crate::map::Bounds;

    /// Records every call made on it, in order
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        markers: Vec<String>,
    }

    impl MapSurface for Recorder {
        fn initialize(&mut self, _center: LatLng, zoom: f64) {
            self.calls.push(format!("init {zoom}"));
        }
        fn clear_markers(&mut self) {
            self.calls.push("clear".into());
            self.markers.clear();
        }
        fn add_marker(&mut self, place: &Place) -> usize {
            self.calls.push(format!("add {}", place.name));
            self.markers.push(place.name.clone());
            self.markers.len() - 1
        }
        fn fit_bounds(&mut self, _bounds: &Bounds, _padding: u32) {
            self.calls.push("fit".into());
        }
        fn focus_on(&mut self, position: LatLng, zoom: f64) {
            self.calls.push(format!("focus {:.2},{:.2} z{zoom}", position.lat, position.lng));
        }
        fn open_popup(&mut self, index: usize) -> bool {
            self.calls.push(format!("popup {index}"));
            index < self.markers.len()
        }
    }

    fn dataset() -> Vec<Place> {
        let mut cafe = Place::new("Cafe", 40.75, -73.98, 4.5, &["cafe"]);
        cafe.website = Some("https://cafe.example".into());
        cafe.phone = Some("(212) 555-0100".into());
        vec![
            cafe,
            Place::new("Unrated", 40.76, -73.97, 0.0, &[]),
            Place::new("Museum", 40.78, -73.96, 3.0, &["museum"]),
        ]
    }

    #[test]
    fn test_update_display_keeps_markers_and_cards_aligned() {
        let places = dataset();
        let view = filter(&places, &FilterCriteria::new(Category::All, 1.0));
        let mut map = Recorder::default();
        let mut display = Display::default();

        update_display(&mut map, &mut display, &places, &view);

        assert_eq!(map.calls, vec!["clear", "add Cafe", "add Museum", "fit"]);
        assert_eq!(display.count, 2);
        let cards = display.list.cards();
        for (i, card) in cards.iter().enumerate() {
            assert_eq!(card.index, i);
            assert_eq!(card.lines[1], CardLine::Name(map.markers[i].clone()));
        }
    }

    #[test]
    fn test_empty_view_shows_no_results_without_fitting() {
        let places = dataset();
        let view = filter(&places, &FilterCriteria::new(Category::Tag("zoo".into()), 0.0));
        let mut map = Recorder::default();
        let mut display = Display::default();

        update_display(&mut map, &mut display, &places, &view);

        assert_eq!(map.calls, vec!["clear"]);
        assert_eq!(display.list, ListContent::Empty);
        assert_eq!(display.count, 0);
    }

    #[test]
    fn test_card_contents() {
        let places = dataset();
        let card = Card::from_place(0, &places[0]);
        assert_eq!(
            card.lines,
            vec![
                CardLine::Type("cafe".into()),
                CardLine::Name("Cafe".into()),
                CardLine::Address(String::new()),
                CardLine::Rating(4.5),
                CardLine::Website("https://cafe.example".into()),
                CardLine::Phone("(212) 555-0100".into()),
            ]
        );

        let untyped = Card::from_place(1, &places[1]);
        assert_eq!(untyped.lines[0], CardLine::Type(FALLBACK_TYPE.into()));
        assert!(!untyped.lines.iter().any(|l| matches!(l, CardLine::Rating(_))));
    }

    #[test]
    fn test_select_card_uses_same_index() {
        let places = dataset();
        let view = filter(&places, &FilterCriteria::new(Category::All, 1.0));
        let mut map = Recorder::default();
        let mut display = Display::default();
        update_display(&mut map, &mut display, &places, &view);
        map.calls.clear();

        assert!(select_card(&mut map, &places, &view, 1));
        assert_eq!(map.calls, vec!["focus 40.78,-73.96 z16", "popup 1"]);
        assert_eq!(map.markers[1], "Museum");

        map.calls.clear();
        assert!(!select_card(&mut map, &places, &view, 5));
        assert!(map.calls.is_empty());
    }

    #[test]
    fn test_hit_test_website_does_not_select() {
        let places = dataset();
        let cards: Vec<Card> = places.iter().enumerate().map(|(i, p)| Card::from_place(i, p)).collect();

        // Card 0 rows: type, name, address, rating, website, phone, separator
        assert_eq!(hit_test(&cards, 0, 1), Some(CardAction::Select(0)));
        assert_eq!(
            hit_test(&cards, 0, 4),
            Some(CardAction::OpenWebsite("https://cafe.example".into()))
        );
        assert_eq!(hit_test(&cards, 0, 6), Some(CardAction::Select(0)));
        assert_eq!(hit_test(&cards, 0, 7), Some(CardAction::Select(1)));
        assert_eq!(hit_test(&cards, 3, 4), Some(CardAction::Select(1)));
        assert_eq!(hit_test(&cards, 0, 100), None);
    }

    #[test]
    fn test_list_scroll_reveals_selection() {
        let places = dataset();
        let cards: Vec<Card> = places.iter().enumerate().map(|(i, p)| Card::from_place(i, p)).collect();
        // Heights: 7, 4, 5
        assert_eq!(list_scroll(&cards, 0, 20), 0);
        assert_eq!(list_scroll(&cards, 2, 10), 6);
        assert_eq!(list_scroll(&cards, 0, 3), 0);
        assert_eq!(list_scroll(&cards, 2, 3), 11);
    }
}
