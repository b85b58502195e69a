//! Catalog Service
//!
//! Read-through caching over [`Catalog`]: lookups consult the shared cache
//! first and memoize what they load; writes hit the catalog and then drop
//! every cache key the write may have made stale.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::catalog::{keys, Author, Book, CachedValue, Catalog, Publisher};
use crate::error::{AppError, Result};
use crate::models::{AuthorRequest, BookRequest, PublisherRequest};

// == Catalog Service ==
#[derive(Debug, Clone)]
pub struct CatalogService {
    catalog: Arc<Catalog>,
    cache: Arc<TtlCache<CachedValue>>,
    /// Bumped by every write before it invalidates cache keys
    write_generation: Arc<AtomicU64>,
}

fn require_search_term(field: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!(
            "{field} cannot be null or empty"
        )));
    }
    Ok(())
}

fn invalid(msg: Option<String>) -> Result<()> {
    match msg {
        Some(msg) => Err(AppError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

impl CatalogService {
    pub fn new(catalog: Arc<Catalog>, cache: Arc<TtlCache<CachedValue>>) -> Self {
        Self {
            catalog,
            cache,
            write_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<CachedValue>> {
        &self.cache
    }

    /// Returns the value cached under `key` if it has the requested type.
    fn cached<T>(&self, key: &str) -> Option<T>
    where
        T: TryFrom<CachedValue, Error = CachedValue>,
    {
        match T::try_from(self.cache.get(key)?) {
            Ok(value) => Some(value),
            Err(other) => {
                warn!(key, found = other.kind(), "Cached value has unexpected type, reloading");
                None
            }
        }
    }

    /// Returns the cached value for `key`, or loads and caches it.
    ///
    /// A load that overlaps any catalog write may have read the old state, so
    /// its result is returned but not left in the cache. The generation is
    /// checked again after the put because a write can land between the check
    /// and the put; the write's own invalidation only covers puts it follows.
    async fn read_through<T, F, Fut>(&self, key: String, load: F) -> Result<T>
    where
        T: Clone + Into<CachedValue> + TryFrom<CachedValue, Error = CachedValue>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.cached(&key) {
            return Ok(value);
        }

        let generation = self.write_generation.load(Ordering::SeqCst);
        let value = load().await?;
        if self.write_generation.load(Ordering::SeqCst) != generation {
            debug!(key, "Catalog changed during lookup, not caching");
            return Ok(value);
        }

        self.cache.put(key.clone(), value.clone().into());
        if self.write_generation.load(Ordering::SeqCst) != generation {
            self.cache.invalidate(&key);
        }
        Ok(value)
    }

    /// Marks a catalog write. Must run after the write and before its
    /// invalidations.
    fn begin_invalidation(&self) {
        self.write_generation.fetch_add(1, Ordering::SeqCst);
    }

    // == Authors ==

    pub async fn authors(&self) -> Vec<Author> {
        self.catalog.authors().await
    }

    pub async fn author(&self, id: u64) -> Result<Author> {
        self.read_through(keys::author(id), || self.catalog.author(id))
            .await
    }

    pub async fn search_authors(&self, name: &str) -> Result<Vec<Author>> {
        require_search_term("Search name", name)?;
        self.read_through(keys::author_search(name), || async {
            Ok(self.catalog.search_authors(name).await)
        })
        .await
    }

    pub async fn create_author(&self, req: &AuthorRequest) -> Result<Author> {
        invalid(req.validate())?;
        let author = self.catalog.insert_author(&req.name).await;
        self.invalidate_author(author.id);
        info!(author_id = author.id, "Author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: u64, req: &AuthorRequest) -> Result<Author> {
        invalid(req.validate())?;
        let author = self.catalog.update_author(id, &req.name).await?;
        self.invalidate_author(id);
        Ok(author)
    }

    pub async fn delete_author(&self, id: u64) -> Result<()> {
        self.catalog.delete_author(id).await?;
        self.invalidate_author(id);
        info!(author_id = id, "Author deleted");
        Ok(())
    }

    fn invalidate_author(&self, id: u64) {
        self.begin_invalidation();
        self.cache.invalidate(&keys::author(id));
        self.cache.invalidate_by_prefix(keys::AUTHOR_SEARCH_PREFIX);
    }

    // == Publishers ==

    pub async fn publishers(&self) -> Vec<Publisher> {
        self.catalog.publishers().await
    }

    pub async fn publisher(&self, id: u64) -> Result<Publisher> {
        self.read_through(keys::publisher(id), || self.catalog.publisher(id))
            .await
    }

    pub async fn publisher_by_name(&self, name: &str) -> Result<Publisher> {
        require_search_term("Publisher name", name)?;
        self.read_through(keys::publisher_name(name), || {
            self.catalog.publisher_by_name(name)
        })
        .await
    }

    pub async fn search_publishers(&self, name: &str) -> Result<Vec<Publisher>> {
        require_search_term("Search name", name)?;
        self.read_through(keys::publisher_search(name), || async {
            Ok(self.catalog.search_publishers(name).await)
        })
        .await
    }

    pub async fn create_publisher(&self, req: &PublisherRequest) -> Result<Publisher> {
        invalid(req.validate())?;
        let publisher = self.catalog.insert_publisher(&req.name).await?;
        self.invalidate_publisher(publisher.id, &[&publisher.name]);
        info!(publisher_id = publisher.id, "Publisher created");
        Ok(publisher)
    }

    pub async fn update_publisher(&self, id: u64, req: &PublisherRequest) -> Result<Publisher> {
        invalid(req.validate())?;
        let (previous, publisher) = self.catalog.update_publisher(id, &req.name).await?;
        self.invalidate_publisher(id, &[&previous.name, &publisher.name]);
        Ok(publisher)
    }

    pub async fn delete_publisher(&self, id: u64) -> Result<()> {
        let publisher = self.catalog.delete_publisher(id).await?;
        self.invalidate_publisher(id, &[&publisher.name]);
        info!(publisher_id = id, "Publisher deleted");
        Ok(())
    }

    fn invalidate_publisher(&self, id: u64, names: &[&str]) {
        self.begin_invalidation();
        self.cache.invalidate(&keys::publisher(id));
        self.cache.invalidate_by_prefix(&keys::publisher_family(id));
        for name in names {
            self.cache.invalidate(&keys::publisher_name(name));
        }
        self.cache.invalidate_by_prefix(keys::PUBLISHER_SEARCH_PREFIX);
    }

    // == Books ==

    pub async fn books(&self) -> Vec<Book> {
        self.catalog.books().await
    }

    pub async fn book(&self, id: u64) -> Result<Book> {
        self.read_through(keys::book(id), || self.catalog.book(id)).await
    }

    /// Books of one publisher. The publisher must exist.
    pub async fn books_by_publisher(&self, publisher_id: u64) -> Result<Vec<Book>> {
        self.read_through(keys::publisher_books(publisher_id), || {
            self.catalog.books_by_publisher(publisher_id)
        })
        .await
    }

    pub async fn books_by_price_range(&self, min: f64, max: f64) -> Result<Vec<Book>> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(AppError::InvalidRequest(
                "Min and max price must be non-negative".to_string(),
            ));
        }
        if min > max {
            return Err(AppError::InvalidRequest(
                "Min price cannot be greater than max price".to_string(),
            ));
        }

        self.read_through(keys::books_price(min, max), || async {
            Ok(self.catalog.books_by_price(min, max).await)
        })
        .await
    }

    pub async fn create_book(&self, req: &BookRequest) -> Result<Book> {
        invalid(req.validate_for_create())?;
        let book = self.catalog.insert_book(req).await?;
        self.invalidate_book(&book, None);
        info!(book_id = book.id, "Book created");
        Ok(book)
    }

    /// Creates every book in `reqs`, or none if any is invalid.
    pub async fn create_books(&self, reqs: &[BookRequest]) -> Result<Vec<Book>> {
        if reqs.is_empty() {
            return Err(AppError::InvalidRequest(
                "Book list cannot be empty".to_string(),
            ));
        }
        for req in reqs {
            invalid(req.validate_for_create())?;
        }

        let books = self.catalog.insert_books(reqs).await?;
        for book in &books {
            self.invalidate_book(book, None);
        }
        info!(count = books.len(), "Books created in bulk");
        Ok(books)
    }

    pub async fn update_book(&self, id: u64, req: &BookRequest) -> Result<Book> {
        invalid(req.validate())?;
        let (previous, book) = self.catalog.update_book(id, req).await?;
        self.invalidate_book(&book, Some(previous.publisher_id));
        Ok(book)
    }

    pub async fn delete_book(&self, id: u64) -> Result<()> {
        let book = self.catalog.delete_book(id).await?;
        self.invalidate_book(&book, None);
        info!(book_id = id, "Book deleted");
        Ok(())
    }

    fn invalidate_book(&self, book: &Book, previous_publisher: Option<u64>) {
        self.begin_invalidation();
        self.cache.invalidate(&keys::book(book.id));
        self.cache
            .invalidate(&keys::publisher_books(book.publisher_id));
        if let Some(previous) = previous_publisher {
            self.cache.invalidate(&keys::publisher_books(previous));
        }
        self.cache.invalidate_by_prefix(keys::BOOKS_PRICE_PREFIX);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service_with_capacity(capacity: usize) -> CatalogService {
        let cache = Arc::new(TtlCache::new(capacity, Duration::from_secs(10)));
        CatalogService::new(Arc::new(Catalog::new()), cache)
    }

    fn service() -> CatalogService {
        service_with_capacity(64)
    }

    fn author_req(name: &str) -> AuthorRequest {
        AuthorRequest {
            name: name.to_string(),
        }
    }

    fn publisher_req(name: &str) -> PublisherRequest {
        PublisherRequest {
            name: name.to_string(),
        }
    }

    fn book_req(name: &str, price: f64, publisher_id: u64, author_id: u64) -> BookRequest {
        BookRequest {
            name: name.to_string(),
            genre: None,
            price,
            publisher_id: Some(publisher_id),
            author_ids: Some(vec![author_id]),
        }
    }

    #[tokio::test]
    async fn test_lookup_is_memoized() {
        let service = service();
        let author = service.create_author(&author_req("Le Guin")).await.unwrap();

        assert!(!service.cache().contains_key(&keys::author(author.id)));
        service.author(author.id).await.unwrap();
        assert!(service.cache().contains_key(&keys::author(author.id)));

        let again = service.author(author.id).await.unwrap();
        assert_eq!(again, author);
        assert_eq!(service.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let service = service();

        assert!(matches!(service.author(9).await, Err(AppError::NotFound(_))));
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_update_invalidates_cached_author_and_searches() {
        let service = service();
        let author = service.create_author(&author_req("Le Guin")).await.unwrap();
        service.author(author.id).await.unwrap();
        service.search_authors("guin").await.unwrap();

        service
            .update_author(author.id, &author_req("Ursula K. Le Guin"))
            .await
            .unwrap();

        assert!(service.cache().is_empty());
        assert_eq!(
            service.author(author.id).await.unwrap().name,
            "Ursula K. Le Guin"
        );
    }

    #[tokio::test]
    async fn test_search_rejects_blank_name() {
        let service = service();
        assert!(matches!(
            service.search_authors("  ").await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.publisher_by_name("").await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_publisher_rename_clears_both_names_and_family() {
        let service = service();
        let publisher = service.create_publisher(&publisher_req("Tor")).await.unwrap();
        service.publisher(publisher.id).await.unwrap();
        service.publisher_by_name("tor").await.unwrap();
        service.books_by_publisher(publisher.id).await.unwrap();
        let other = service.create_publisher(&publisher_req("Orbit")).await.unwrap();
        service.publisher(other.id).await.unwrap();

        service
            .update_publisher(publisher.id, &publisher_req("Tor Books"))
            .await
            .unwrap();

        let cache = service.cache();
        assert!(!cache.contains_key(&keys::publisher(publisher.id)));
        assert!(!cache.contains_key(&keys::publisher_name("tor")));
        assert!(!cache.contains_key(&keys::publisher_books(publisher.id)));
        assert!(cache.contains_key(&keys::publisher(other.id)));
        assert!(matches!(
            service.publisher_by_name("tor").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_book_write_invalidates_price_ranges_and_publisher_books() {
        let service = service();
        let publisher = service.create_publisher(&publisher_req("Tor")).await.unwrap();
        let author = service.create_author(&author_req("Jordan")).await.unwrap();

        assert!(service.books_by_price_range(0.0, 100.0).await.unwrap().is_empty());
        assert!(service.books_by_publisher(publisher.id).await.unwrap().is_empty());

        service
            .create_book(&book_req("Eye", 20.0, publisher.id, author.id))
            .await
            .unwrap();

        assert_eq!(service.books_by_price_range(0.0, 100.0).await.unwrap().len(), 1);
        assert_eq!(service.books_by_publisher(publisher.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_moving_book_refreshes_both_publishers() {
        let service = service();
        let tor = service.create_publisher(&publisher_req("Tor")).await.unwrap();
        let orbit = service.create_publisher(&publisher_req("Orbit")).await.unwrap();
        let author = service.create_author(&author_req("Jordan")).await.unwrap();
        let book = service
            .create_book(&book_req("Eye", 20.0, tor.id, author.id))
            .await
            .unwrap();
        service.books_by_publisher(tor.id).await.unwrap();
        service.books_by_publisher(orbit.id).await.unwrap();

        service
            .update_book(book.id, &book_req("Eye", 20.0, orbit.id, author.id))
            .await
            .unwrap();

        assert!(service.books_by_publisher(tor.id).await.unwrap().is_empty());
        assert_eq!(service.books_by_publisher(orbit.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_price_range_validation() {
        let service = service();
        assert!(matches!(
            service.books_by_price_range(-1.0, 5.0).await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.books_by_price_range(10.0, 5.0).await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_create_requires_books() {
        let service = service();
        assert!(matches!(
            service.create_books(&[]).await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_mismatched_cached_type_is_reloaded() {
        let service = service();
        let author = service.create_author(&author_req("Jordan")).await.unwrap();
        service
            .cache()
            .put(keys::author(author.id), CachedValue::Books(Vec::new()));

        assert_eq!(service.author(author.id).await.unwrap(), author);
        assert_eq!(
            service.cache().get(&keys::author(author.id)),
            Some(CachedValue::Author(author))
        );
    }

    #[tokio::test]
    async fn test_lookup_overlapping_write_is_not_cached() {
        let service = service();
        let author = service.create_author(&author_req("Old")).await.unwrap();

        let loaded = service
            .read_through(keys::author(author.id), || async {
                let before = service.catalog.author(author.id).await?;
                service.update_author(author.id, &author_req("New")).await?;
                Ok(before)
            })
            .await
            .unwrap();

        assert_eq!(loaded.name, "Old");
        assert!(!service.cache().contains_key(&keys::author(author.id)));
        assert_eq!(service.author(author.id).await.unwrap().name, "New");
    }

    #[tokio::test]
    async fn test_non_ascii_publisher_name_lookup_matches_store() {
        let service = service();
        let publisher = service.create_publisher(&publisher_req("Ärger")).await.unwrap();
        assert!(matches!(
            service.create_publisher(&publisher_req("ärger")).await,
            Err(AppError::Conflict(_))
        ));

        let lower = service.publisher_by_name("ärger").await.unwrap();
        let upper = service.publisher_by_name("Ärger").await.unwrap();

        assert_eq!(lower.id, publisher.id);
        assert_eq!(upper.id, publisher.id);
        assert_eq!(service.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_small_cache_evicts_oldest_lookup() {
        let service = service_with_capacity(2);
        let a = service.create_author(&author_req("A")).await.unwrap();
        let b = service.create_author(&author_req("B")).await.unwrap();
        let c = service.create_author(&author_req("C")).await.unwrap();

        service.author(a.id).await.unwrap();
        service.author(b.id).await.unwrap();
        service.author(c.id).await.unwrap();

        let cache = service.cache();
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains_key(&keys::author(a.id)));
        assert_eq!(cache.stats().evictions, 1);
    }
}
