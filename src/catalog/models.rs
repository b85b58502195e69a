//! Catalog records and the tagged value stored in the lookup cache.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub name: String,
    pub genre: Option<String>,
    pub price: f64,
    pub publisher_id: u64,
    pub author_ids: Vec<u64>,
}

// == Cached Value ==
/// Every kind of lookup result the catalog memoizes.
///
/// Readers convert back with `TryFrom`. Asking for a variant other than the
/// one stored under a key is a bug in the caller, not a cache failure; the
/// conversion hands the value back so the caller can report it.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Author(Author),
    Authors(Vec<Author>),
    Publisher(Publisher),
    Publishers(Vec<Publisher>),
    Book(Book),
    Books(Vec<Book>),
}

impl CachedValue {
    /// Variant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CachedValue::Author(_) => "author",
            CachedValue::Authors(_) => "authors",
            CachedValue::Publisher(_) => "publisher",
            CachedValue::Publishers(_) => "publishers",
            CachedValue::Book(_) => "book",
            CachedValue::Books(_) => "books",
        }
    }
}

macro_rules! cached_variant {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for CachedValue {
            fn from(value: $ty) -> Self {
                CachedValue::$variant(value)
            }
        }

        impl TryFrom<CachedValue> for $ty {
            type Error = CachedValue;

            fn try_from(value: CachedValue) -> Result<Self, Self::Error> {
                match value {
                    CachedValue::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }
    };
}

cached_variant!(Author, Author);
cached_variant!(Authors, Vec<Author>);
cached_variant!(Publisher, Publisher);
cached_variant!(Publishers, Vec<Publisher>);
cached_variant!(Book, Book);
cached_variant!(Books, Vec<Book>);
