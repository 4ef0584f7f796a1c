use crate::data::Place;
use std::collections::BTreeSet;

/// Categories offered before any data is loaded
pub const DEFAULT_CATEGORIES: [&str; 5] = ["restaurant", "cafe", "museum", "park", "library"];

/// Control value meaning "no category restriction"
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    Tag(String),
}

impl Category {
    pub fn from_value(value: &str) -> Self {
        if value == ALL {
            Category::All
        } else {
            Category::Tag(value.to_string())
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Category::All => ALL,
            Category::Tag(tag) => tag,
        }
    }

    /// Membership test against the tag list, not a prefix match
    pub fn matches(&self, types: &[String]) -> bool {
        match self {
            Category::All => true,
            Category::Tag(tag) => types.iter().any(|t| t == tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    pub category: Category,
    pub min_rating: f64,
}

impl FilterCriteria {
    pub fn new(category: Category, min_rating: f64) -> Self {
        Self { category, min_rating }
    }

    pub fn matches(&self, place: &Place) -> bool {
        self.category.matches(&place.types) && place.rating >= self.min_rating
    }
}

/// Positions of the matching places, in dataset order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    indices: Vec<usize>,
}

impl FilteredView {
    /// View over every place of a dataset of `len` places
    pub fn all(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Dataset positions, ascending
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The place at view position `i`
    pub fn get<'a>(&self, dataset: &'a [Place], i: usize) -> Option<&'a Place> {
        self.indices.get(i).and_then(|&idx| dataset.get(idx))
    }

    pub fn places<'a>(&'a self, dataset: &'a [Place]) -> impl Iterator<Item = &'a Place> + 'a {
        self.indices.iter().filter_map(move |&idx| dataset.get(idx))
    }
}

/// Keep every place matching both the category and the rating threshold.
/// Pure and order preserving.
pub fn filter(dataset: &[Place], criteria: &FilterCriteria) -> FilteredView {
    FilteredView {
        indices: dataset
            .iter()
            .enumerate()
            .filter(|(_, place)| criteria.matches(place))
            .map(|(idx, _)| idx)
            .collect(),
    }
}

/// Options for the category selector: "all", the default categories, then
/// every other tag present in the dataset, sorted
pub fn category_options(dataset: &[Place]) -> Vec<String> {
    let extra: BTreeSet<&str> = dataset
        .iter()
        .flat_map(|place| place.types.iter().map(String::as_str))
        .filter(|t| !DEFAULT_CATEGORIES.contains(t))
        .collect();

    std::iter::once(ALL)
        .chain(DEFAULT_CATEGORIES)
        .chain(extra)
        .map(str::to_string)
        .collect()
}
