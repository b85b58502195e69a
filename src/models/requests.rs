//! Request DTOs for the bookshop API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::logs::DATE_FORMAT;

/// Maximum accepted length of author, publisher and book names
pub const MAX_NAME_LENGTH: usize = 256;

fn validate_name(field: &str, name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some(format!("{field} cannot be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Some(format!(
            "{field} exceeds maximum length of {MAX_NAME_LENGTH} characters"
        ));
    }
    None
}

/// Request body for creating or updating an author
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRequest {
    pub name: String,
}

impl AuthorRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_name("Author name", &self.name)
    }
}

/// Request body for creating or updating a publisher
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherRequest {
    pub name: String,
}

impl PublisherRequest {
    pub fn validate(&self) -> Option<String> {
        validate_name("Publisher name", &self.name)
    }
}

/// Request body for creating or updating a book
///
/// On update, a missing `publisher_id` or `author_ids` keeps the current value.
#[derive(Debug, Clone, Deserialize)]
pub struct BookRequest {
    pub name: String,
    #[serde(default)]
    pub genre: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub publisher_id: Option<u64>,
    #[serde(default)]
    pub author_ids: Option<Vec<u64>>,
}

impl BookRequest {
    /// Checks the fields every book write needs.
    pub fn validate(&self) -> Option<String> {
        if let Some(msg) = validate_name("Book name", &self.name) {
            return Some(msg);
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Some(format!("Price must be positive for book: {}", self.name));
        }
        if matches!(&self.author_ids, Some(ids) if ids.is_empty()) {
            return Some(format!(
                "At least one author ID is required for book: {}",
                self.name
            ));
        }
        None
    }

    /// Checks the fields a new book needs on top of [`BookRequest::validate`].
    pub fn validate_for_create(&self) -> Option<String> {
        if let Some(msg) = self.validate() {
            return Some(msg);
        }
        if self.publisher_id.is_none() {
            return Some(format!("Publisher ID cannot be null for book: {}", self.name));
        }
        if self.author_ids.is_none() {
            return Some(format!(
                "At least one author ID is required for book: {}",
                self.name
            ));
        }
        None
    }
}

/// Query string carrying a name to look up or search for
#[derive(Debug, Clone, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// Query string for price-range lookups
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRangeQuery {
    pub min: f64,
    pub max: f64,
}

/// Query string for period log aggregation
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodQuery {
    pub from: String,
    pub to: String,
}

impl PeriodQuery {
    /// Parses both bounds as `yyyy-MM-dd` dates.
    pub fn parse(&self) -> Result<(NaiveDate, NaiveDate), String> {
        Ok((parse_date(&self.from)?, parse_date(&self.to)?))
    }
}

/// Parses a `yyyy-MM-dd` date, describing the expected format on failure.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{raw}', use yyyy-MM-dd"))
}
