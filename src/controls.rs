use crate::app::App;
use crate::filter::{Category, ALL};
use crate::map::MapSurface;

/// Values of the minimum-rating selector, parsed as floats when read
pub const RATING_OPTIONS: [&str; 5] = ["0", "3", "3.5", "4", "4.5"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    Category,
    MinRating,
}

/// A drop-down style selector holding string values
#[derive(Debug, Clone, PartialEq)]
pub struct SelectControl {
    options: Vec<String>,
    selected: usize,
}

impl SelectControl {
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            selected: 0,
        }
    }

    pub fn value(&self) -> &str {
        self.options.get(self.selected).map(String::as_str).unwrap_or_default()
    }

    pub fn select_next(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + 1) % self.options.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + self.options.len() - 1) % self.options.len();
        }
    }

    /// Select `value` if it is one of the options
    pub fn set_value(&mut self, value: &str) -> bool {
        match self.options.iter().position(|o| o == value) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    /// Swap the option list, keeping the current value when it survives
    pub fn replace_options(&mut self, options: Vec<String>) {
        let current = self.value().to_string();
        self.options = options;
        if !self.set_value(&current) {
            self.selected = 0;
        }
    }
}

/// The category and minimum-rating selectors
#[derive(Debug, Clone, PartialEq)]
pub struct FilterControls {
    pub category: SelectControl,
    pub min_rating: SelectControl,
}

impl FilterControls {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            category: SelectControl::new(categories),
            min_rating: SelectControl::new(RATING_OPTIONS.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn get(&self, id: ControlId) -> &SelectControl {
        match id {
            ControlId::Category => &self.category,
            ControlId::MinRating => &self.min_rating,
        }
    }

    pub fn get_mut(&mut self, id: ControlId) -> &mut SelectControl {
        match id {
            ControlId::Category => &mut self.category,
            ControlId::MinRating => &mut self.min_rating,
        }
    }

    /// Human readable form of the current selection
    pub fn label(&self, id: ControlId) -> String {
        let value = self.get(id).value();
        match id {
            ControlId::Category if value == ALL => "All".to_string(),
            ControlId::Category => value.to_string(),
            ControlId::MinRating if parse_rating(value) <= 0.0 => "Any".to_string(),
            ControlId::MinRating => format!("{value}+"),
        }
    }
}

/// Read a rating selector value; anything unparsable means no threshold
pub fn parse_rating(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(rating) if rating.is_finite() => rating,
        _ => {
            log::warn!("ignoring unparsable rating filter {value:?}");
            0.0
        }
    }
}

pub type Handler<M> = fn(&mut App<M>, &str);

pub struct Subscription<M: MapSurface> {
    pub control: ControlId,
    pub handler: Handler<M>,
}

/// Change handlers, built once at setup
pub struct Subscriptions<M: MapSurface> {
    entries: Vec<Subscription<M>>,
}

impl<M: MapSurface> Subscriptions<M> {
    /// The standard wiring: each selector re-filters and redraws
    pub fn setup() -> Self {
        Self {
            entries: vec![
                Subscription {
                    control: ControlId::Category,
                    handler: on_category_change,
                },
                Subscription {
                    control: ControlId::MinRating,
                    handler: on_rating_change,
                },
            ],
        }
    }

    /// Run every handler subscribed to `control` with its current value
    pub fn dispatch(&self, app: &mut App<M>, control: ControlId) {
        let value = app.controls.get(control).value().to_string();
        for sub in self.entries.iter().filter(|s| s.control == control) {
            (sub.handler)(app, &value);
        }
    }

    /// Step a selector forwards or backwards and fire its change event
    pub fn cycle(&self, app: &mut App<M>, control: ControlId, forward: bool) {
        let select = app.controls.get_mut(control);
        if forward {
            select.select_next();
        } else {
            select.select_prev();
        }
        self.dispatch(app, control);
    }
}

fn on_category_change<M: MapSurface>(app: &mut App<M>, value: &str) {
    app.criteria.category = Category::from_value(value);
    log::debug!("category filter -> {value}");
    app.apply_filters();
}

fn on_rating_change<M: MapSurface>(app: &mut App<M>, value: &str) {
    app.criteria.min_rating = parse_rating(value);
    log::debug!("rating filter -> {value}");
    app.apply_filters();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<String> {
        ["all", "cafe", "park"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_cycles_both_ways() {
        let mut select = SelectControl::new(categories());
        assert_eq!(select.value(), "all");
        select.select_prev();
        assert_eq!(select.value(), "park");
        select.select_next();
        select.select_next();
        assert_eq!(select.value(), "cafe");
    }

    #[test]
    fn test_replace_options_keeps_value() {
        let mut select = SelectControl::new(categories());
        select.set_value("park");
        select.replace_options(vec!["all".into(), "museum".into(), "park".into()]);
        assert_eq!(select.value(), "park");
        select.replace_options(vec!["all".into(), "museum".into()]);
        assert_eq!(select.value(), "all");
    }

    #[test]
    fn test_empty_select() {
        let mut select = SelectControl::new(Vec::new());
        select.select_next();
        assert_eq!(select.value(), "");
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("3.5"), 3.5);
        assert_eq!(parse_rating(" 4 "), 4.0);
        assert_eq!(parse_rating("four"), 0.0);
        assert_eq!(parse_rating("NaN"), 0.0);
    }

    #[test]
    fn test_labels() {
        let mut controls = FilterControls::new(categories());
        assert_eq!(controls.label(ControlId::Category), "All");
        assert_eq!(controls.label(ControlId::MinRating), "Any");
        controls.category.set_value("cafe");
        controls.min_rating.set_value("4.5");
        assert_eq!(controls.label(ControlId::Category), "cafe");
        assert_eq!(controls.label(ControlId::MinRating), "4.5+");
    }
}
