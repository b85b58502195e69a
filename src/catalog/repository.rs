//! In-memory catalog store.
//!
//! Stands in for the relational store: keyed lookups, searches and writes,
//! each write validated and applied under one lock.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::catalog::{keys, Author, Book, Publisher};
use crate::error::{AppError, Result};
use crate::models::BookRequest;

// == Catalog ==
#[derive(Debug, Default)]
pub struct Catalog {
    data: RwLock<CatalogData>,
}

#[derive(Debug, Default)]
struct CatalogData {
    authors: BTreeMap<u64, Author>,
    publishers: BTreeMap<u64, Publisher>,
    books: BTreeMap<u64, Book>,
    last_author_id: u64,
    last_publisher_id: u64,
    last_book_id: u64,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

fn author_not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Author with id {id} not found"))
}

fn publisher_not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Publisher with id {id} not found"))
}

fn book_not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Book with id {id} not found"))
}

impl CatalogData {
    fn ensure_publisher(&self, id: u64) -> Result<()> {
        if self.publishers.contains_key(&id) {
            Ok(())
        } else {
            Err(publisher_not_found(id))
        }
    }

    fn ensure_authors(&self, ids: &[u64]) -> Result<()> {
        match ids.iter().find(|id| !self.authors.contains_key(*id)) {
            Some(missing) => Err(author_not_found(*missing)),
            None => Ok(()),
        }
    }

    /// Publisher names compare under [`keys::normalize`], the same folding
    /// the name cache keys use.
    fn same_publisher_name(publisher: &Publisher, normalized: &str) -> bool {
        keys::normalize(&publisher.name) == normalized
    }

    fn ensure_unique_publisher_name(&self, name: &str, except: Option<u64>) -> Result<()> {
        let normalized = keys::normalize(name);
        let taken = self
            .publishers
            .values()
            .any(|p| Some(p.id) != except && Self::same_publisher_name(p, &normalized));
        if taken {
            return Err(AppError::Conflict(format!(
                "Publisher named '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    /// Validates `req` as a new book and returns its normalized author ids.
    fn check_new_book(&self, req: &BookRequest) -> Result<(u64, Vec<u64>)> {
        let publisher_id = req.publisher_id.ok_or_else(|| {
            AppError::InvalidRequest(format!("Publisher ID cannot be null for book: {}", req.name))
        })?;
        let author_ids = normalize_ids(req.author_ids.as_deref().unwrap_or_default());
        if author_ids.is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "At least one author ID is required for book: {}",
                req.name
            )));
        }

        self.ensure_publisher(publisher_id)?;
        self.ensure_authors(&author_ids)?;
        Ok((publisher_id, author_ids))
    }

    fn insert_book(&mut self, req: &BookRequest, publisher_id: u64, author_ids: Vec<u64>) -> Book {
        self.last_book_id += 1;
        let book = Book {
            id: self.last_book_id,
            name: req.name.trim().to_string(),
            genre: req.genre.clone(),
            price: req.price,
            publisher_id,
            author_ids,
        };
        self.books.insert(book.id, book.clone());
        book
    }
}

fn normalize_ids(ids: &[u64]) -> Vec<u64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // == Authors ==

    pub async fn authors(&self) -> Vec<Author> {
        self.data.read().await.authors.values().cloned().collect()
    }

    pub async fn author(&self, id: u64) -> Result<Author> {
        let data = self.data.read().await;
        data.authors.get(&id).cloned().ok_or_else(|| author_not_found(id))
    }

    /// Authors whose name contains `fragment`, ignoring case.
    pub async fn search_authors(&self, fragment: &str) -> Vec<Author> {
        let data = self.data.read().await;
        data.authors
            .values()
            .filter(|a| contains_ignore_case(&a.name, fragment))
            .cloned()
            .collect()
    }

    pub async fn insert_author(&self, name: &str) -> Author {
        let mut data = self.data.write().await;
        data.last_author_id += 1;
        let author = Author {
            id: data.last_author_id,
            name: name.trim().to_string(),
        };
        data.authors.insert(author.id, author.clone());
        author
    }

    pub async fn update_author(&self, id: u64, name: &str) -> Result<Author> {
        let mut data = self.data.write().await;
        let author = data.authors.get_mut(&id).ok_or_else(|| author_not_found(id))?;
        author.name = name.trim().to_string();
        Ok(author.clone())
    }

    /// Removes an author that no book references.
    pub async fn delete_author(&self, id: u64) -> Result<Author> {
        let mut data = self.data.write().await;
        if !data.authors.contains_key(&id) {
            return Err(author_not_found(id));
        }
        if data.books.values().any(|b| b.author_ids.contains(&id)) {
            return Err(AppError::Conflict(format!(
                "Author with id {id} is still referenced by books"
            )));
        }
        data.authors.remove(&id).ok_or_else(|| author_not_found(id))
    }

    // == Publishers ==

    pub async fn publishers(&self) -> Vec<Publisher> {
        self.data.read().await.publishers.values().cloned().collect()
    }

    pub async fn publisher(&self, id: u64) -> Result<Publisher> {
        let data = self.data.read().await;
        data.publishers
            .get(&id)
            .cloned()
            .ok_or_else(|| publisher_not_found(id))
    }

    /// Publisher with exactly `name`, ignoring case.
    pub async fn publisher_by_name(&self, name: &str) -> Result<Publisher> {
        let normalized = keys::normalize(name);
        let data = self.data.read().await;
        data.publishers
            .values()
            .find(|p| CatalogData::same_publisher_name(p, &normalized))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Publisher named '{name}' not found")))
    }

    pub async fn search_publishers(&self, fragment: &str) -> Vec<Publisher> {
        let data = self.data.read().await;
        data.publishers
            .values()
            .filter(|p| contains_ignore_case(&p.name, fragment))
            .cloned()
            .collect()
    }

    pub async fn insert_publisher(&self, name: &str) -> Result<Publisher> {
        let mut data = self.data.write().await;
        data.ensure_unique_publisher_name(name, None)?;
        data.last_publisher_id += 1;
        let publisher = Publisher {
            id: data.last_publisher_id,
            name: name.trim().to_string(),
        };
        data.publishers.insert(publisher.id, publisher.clone());
        Ok(publisher)
    }

    /// Renames a publisher. Returns the previous and the updated record.
    pub async fn update_publisher(&self, id: u64, name: &str) -> Result<(Publisher, Publisher)> {
        let mut data = self.data.write().await;
        data.ensure_unique_publisher_name(name, Some(id))?;
        let publisher = data
            .publishers
            .get_mut(&id)
            .ok_or_else(|| publisher_not_found(id))?;
        let previous = publisher.clone();
        publisher.name = name.trim().to_string();
        Ok((previous, publisher.clone()))
    }

    /// Removes a publisher that has no books.
    pub async fn delete_publisher(&self, id: u64) -> Result<Publisher> {
        let mut data = self.data.write().await;
        data.ensure_publisher(id)?;
        if data.books.values().any(|b| b.publisher_id == id) {
            return Err(AppError::Conflict(format!(
                "Publisher with id {id} still has books"
            )));
        }
        data.publishers
            .remove(&id)
            .ok_or_else(|| publisher_not_found(id))
    }

    // == Books ==

    pub async fn books(&self) -> Vec<Book> {
        self.data.read().await.books.values().cloned().collect()
    }

    pub async fn book(&self, id: u64) -> Result<Book> {
        let data = self.data.read().await;
        data.books.get(&id).cloned().ok_or_else(|| book_not_found(id))
    }

    pub async fn books_by_publisher(&self, publisher_id: u64) -> Result<Vec<Book>> {
        let data = self.data.read().await;
        data.ensure_publisher(publisher_id)?;
        Ok(data
            .books
            .values()
            .filter(|b| b.publisher_id == publisher_id)
            .cloned()
            .collect())
    }

    /// Books priced within `min..=max`.
    pub async fn books_by_price(&self, min: f64, max: f64) -> Vec<Book> {
        let data = self.data.read().await;
        data.books
            .values()
            .filter(|b| b.price >= min && b.price <= max)
            .cloned()
            .collect()
    }

    pub async fn insert_book(&self, req: &BookRequest) -> Result<Book> {
        let mut data = self.data.write().await;
        let (publisher_id, author_ids) = data.check_new_book(req)?;
        Ok(data.insert_book(req, publisher_id, author_ids))
    }

    /// Inserts every book or none of them.
    pub async fn insert_books(&self, reqs: &[BookRequest]) -> Result<Vec<Book>> {
        let mut data = self.data.write().await;
        let checked = reqs
            .iter()
            .map(|req| data.check_new_book(req))
            .collect::<Result<Vec<_>>>()?;

        Ok(reqs
            .iter()
            .zip(checked)
            .map(|(req, (publisher_id, author_ids))| data.insert_book(req, publisher_id, author_ids))
            .collect())
    }

    /// Applies `req` to an existing book. Returns the previous and the
    /// updated record.
    pub async fn update_book(&self, id: u64, req: &BookRequest) -> Result<(Book, Book)> {
        let mut data = self.data.write().await;
        let previous = data.books.get(&id).cloned().ok_or_else(|| book_not_found(id))?;

        let publisher_id = req.publisher_id.unwrap_or(previous.publisher_id);
        data.ensure_publisher(publisher_id)?;

        let author_ids = match &req.author_ids {
            Some(ids) => normalize_ids(ids),
            None => previous.author_ids.clone(),
        };
        data.ensure_authors(&author_ids)?;

        let updated = Book {
            id,
            name: req.name.trim().to_string(),
            genre: req.genre.clone(),
            price: req.price,
            publisher_id,
            author_ids,
        };
        data.books.insert(id, updated.clone());
        Ok((previous, updated))
    }

    pub async fn delete_book(&self, id: u64) -> Result<Book> {
        let mut data = self.data.write().await;
        data.books.remove(&id).ok_or_else(|| book_not_found(id))
    }
}
