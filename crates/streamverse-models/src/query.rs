use crate::content::{ContentItem, ContentType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Inclusive release-year window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearRange {
    pub start: u16,
    pub end: u16,
}

impl FromStr for YearRange {
    type Err = FilterError;

    /// Accepts `2000-2010` or a single year.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u16>()
                .map_err(|_| FilterError::InvalidYearRange(s.to_string()))
        };
        match s.split_once('-') {
            Some((start, end)) => Ok(Self { start: parse(start)?, end: parse(end)? }),
            None => {
                let year = parse(s)?;
                Ok(Self { start: year, end: year })
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("minimum rating must be between 0 and 10, got {0}")]
    InvalidMinRating(f32),
    #[error("year range start {start} is after end {end}")]
    InvertedYearRange { start: u16, end: u16 },
    #[error("invalid year range '{0}'")]
    InvalidYearRange(String),
    #[error("genre must not be blank")]
    BlankGenre,
    #[error("invalid sort token '{0}' (expected field-direction, e.g. rating-desc)")]
    InvalidSort(String),
}

/// User-selected browse filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filters {
    /// Genre (or music section) name; "All" disables the filter
    pub genre: String,
    /// Minimum score on a 0-10 scale; 0 disables the filter
    pub min_rating: f32,
    pub release_years: Option<YearRange>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            genre: "All".to_string(),
            min_rating: 0.0,
            release_years: None,
        }
    }
}

impl Filters {
    pub fn genre(&self) -> Option<&str> {
        if self.genre.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(self.genre.as_str())
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if !self.min_rating.is_finite() || !(0.0..=10.0).contains(&self.min_rating) {
            return Err(FilterError::InvalidMinRating(self.min_rating));
        }
        if self.genre.trim().is_empty() {
            return Err(FilterError::BlankGenre);
        }
        if let Some(range) = self.release_years {
            if range.start > range.end {
                return Err(FilterError::InvertedYearRange { start: range.start, end: range.end });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortField {
    Popularity,
    Rating,
    ReleaseYear,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort order, written as a `field-direction` token (e.g. `rating-desc`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            field: SortField::Popularity,
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Popularity => "popularity",
            SortField::Rating => "rating",
            SortField::ReleaseYear => "releaseYear",
        };
        write!(f, "{}-{}", field, self.direction.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .split_once('-')
            .ok_or_else(|| FilterError::InvalidSort(s.to_string()))?;
        let direction = match direction.to_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(FilterError::InvalidSort(s.to_string())),
        };
        // Unknown fields fall back to popularity, matching the upstream default ordering
        let field = match field.to_lowercase().as_str() {
            "rating" => SortField::Rating,
            "releaseyear" | "release_year" | "year" => SortField::ReleaseYear,
            _ => SortField::Popularity,
        };
        Ok(Self { field, direction })
    }
}

impl TryFrom<String> for SortOrder {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortOrder> for String {
    fn from(value: SortOrder) -> Self {
        value.to_string()
    }
}

/// Content language selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    All,
    Hindi,
    Bengali,
    English,
    /// Any other ISO-639-1 code
    Other(String),
}

impl Language {
    /// ISO-639-1 code, or `None` for `All`
    pub fn code(&self) -> Option<&str> {
        match self {
            Language::All => None,
            Language::Hindi => Some("hi"),
            Language::Bengali => Some("bn"),
            Language::English => Some("en"),
            Language::Other(code) => Some(code.as_str()),
        }
    }

    /// Languages whose results are only relevant with the Indian region forced.
    pub fn forces_indian_region(&self) -> bool {
        matches!(self, Language::Hindi | Language::Bengali)
    }
}

impl From<&str> for Language {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "all" => Language::All,
            "hi" | "hindi" => Language::Hindi,
            "bn" | "bengali" | "bangla" => Language::Bengali,
            "en" | "english" => Language::English,
            other => Language::Other(other.to_string()),
        }
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        Language::from(value.as_str())
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().unwrap_or("All"))
    }
}

/// Identity of one pagination session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedKey {
    pub category: ContentType,
    pub filters: Filters,
    pub sort: SortOrder,
    pub language: Language,
}

impl FeedKey {
    pub fn new(category: ContentType) -> Self {
        Self {
            category,
            filters: Filters::default(),
            sort: SortOrder::default(),
            language: Language::All,
        }
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn page(&self, page: u32) -> DiscoverRequest {
        DiscoverRequest {
            key: self.clone(),
            page,
        }
    }
}

/// One page of a discovery session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverRequest {
    pub key: FeedKey,
    /// 1-based
    pub page: u32,
}

impl DiscoverRequest {
    pub fn category(&self) -> ContentType {
        self.key.category
    }

    pub fn filters(&self) -> &Filters {
        &self.key.filters
    }

    pub fn sort(&self) -> SortOrder {
        self.key.sort
    }

    pub fn language(&self) -> &Language {
        &self.key.language
    }
}

/// Provider answer for one discovery page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PageResult {
    pub items: Vec<ContentItem>,
    pub total_count: u64,
    pub total_pages: u32,
}

impl PageResult {
    /// The degraded answer adapters return when the upstream fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
