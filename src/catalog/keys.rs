//! Cache key scheme for catalog lookups.
//!
//! Per-publisher keys share the `publisher_<id>_` prefix so one prefix
//! invalidation clears every result derived from that publisher.

pub const AUTHOR_SEARCH_PREFIX: &str = "author_search_";
pub const PUBLISHER_SEARCH_PREFIX: &str = "publisher_search_";
pub const PUBLISHER_NAME_PREFIX: &str = "publisher_name_";
pub const BOOKS_PRICE_PREFIX: &str = "books_price_";

/// Lower-cases and trims user-supplied names used inside keys.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn author(id: u64) -> String {
    format!("author_{id}")
}

pub fn author_search(name: &str) -> String {
    format!("{AUTHOR_SEARCH_PREFIX}{}", normalize(name))
}

pub fn publisher(id: u64) -> String {
    format!("publisher_{id}")
}

/// Prefix of every key derived from one publisher, excluding `publisher(id)`.
pub fn publisher_family(id: u64) -> String {
    format!("publisher_{id}_")
}

pub fn publisher_books(id: u64) -> String {
    format!("{}books", publisher_family(id))
}

pub fn publisher_name(name: &str) -> String {
    format!("{PUBLISHER_NAME_PREFIX}{}", normalize(name))
}

pub fn publisher_search(name: &str) -> String {
    format!("{PUBLISHER_SEARCH_PREFIX}{}", normalize(name))
}

pub fn book(id: u64) -> String {
    format!("book_{id}")
}

pub fn books_price(min: f64, max: f64) -> String {
    format!("{BOOKS_PRICE_PREFIX}{min}_{max}")
}
