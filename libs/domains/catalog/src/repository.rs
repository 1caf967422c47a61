use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{CreateProduct, CreateReview, Product, Review, UpdateProduct};

/// Repository trait for catalog persistence.
///
/// Implementations own the atomicity of `add_review`: the review insert and
/// the product aggregate recompute must be a single unit so that concurrent
/// submissions cannot lose an update and no intermediate state is visible.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Create a new product owned by `user_id`
    async fn create(&self, user_id: Uuid, input: CreateProduct) -> CatalogResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<Product>>;

    /// List products whose name contains `query` (case-insensitive),
    /// newest first
    async fn search_by_name(
        &self,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> CatalogResult<Vec<Product>>;

    /// Count products whose name contains `query` (case-insensitive)
    async fn count_by_name(&self, query: &str) -> CatalogResult<u64>;

    /// List products whose category contains `category` AND whose name
    /// contains `query` (both case-insensitive), newest first
    async fn search_by_category(
        &self,
        category: &str,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> CatalogResult<Vec<Product>>;

    /// Count products matching the category browse filters
    async fn count_by_category(&self, category: &str, query: &str) -> CatalogResult<u64>;

    /// Products with rating >= `min_rating`, best first, capped at `limit`
    async fn top_rated(&self, min_rating: f64, limit: u64) -> CatalogResult<Vec<Product>>;

    /// Update an existing product
    async fn update(&self, id: Uuid, input: UpdateProduct) -> CatalogResult<Product>;

    /// Delete a product (and, through the store, its reviews)
    async fn delete(&self, id: Uuid) -> CatalogResult<bool>;

    /// Whether `user_id` has already reviewed `product_id`
    async fn has_review(&self, product_id: Uuid, user_id: Uuid) -> CatalogResult<bool>;

    /// Insert a review and recompute the product's aggregate fields in one
    /// atomic operation
    async fn add_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        author: &str,
        input: CreateReview,
    ) -> CatalogResult<Review>;

    /// All reviews for a product, newest first
    async fn list_reviews(&self, product_id: Uuid) -> CatalogResult<Vec<Review>>;
}

#[derive(Debug, Default)]
struct Store {
    products: HashMap<Uuid, Product>,
    reviews: HashMap<Uuid, Review>,
}

/// In-memory implementation of CatalogRepository (for development/testing).
///
/// A single RwLock guards products and reviews together, so `add_review`
/// is atomic by construction.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn newest_first(products: &mut [Product]) {
    // id is a UUIDv7, so it breaks created_at ties deterministically
    products.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn create(&self, user_id: Uuid, input: CreateProduct) -> CatalogResult<Product> {
        let mut store = self.store.write().await;
        let product = Product::new(user_id, input);
        store.products.insert(product.id, product.clone());

        tracing::info!(product_id = %product.id, name = %product.name, "Created product");
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<Product>> {
        let store = self.store.read().await;
        Ok(store.products.get(&id).cloned())
    }

    async fn search_by_name(
        &self,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> CatalogResult<Vec<Product>> {
        let store = self.store.read().await;

        let mut result: Vec<Product> = store
            .products
            .values()
            .filter(|p| contains_ci(&p.name, query))
            .cloned()
            .collect();
        newest_first(&mut result);

        Ok(result
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_name(&self, query: &str) -> CatalogResult<u64> {
        let store = self.store.read().await;
        let count = store
            .products
            .values()
            .filter(|p| contains_ci(&p.name, query))
            .count();
        Ok(count as u64)
    }

    async fn search_by_category(
        &self,
        category: &str,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> CatalogResult<Vec<Product>> {
        let store = self.store.read().await;

        let mut result: Vec<Product> = store
            .products
            .values()
            .filter(|p| contains_ci(&p.category, category) && contains_ci(&p.name, query))
            .cloned()
            .collect();
        newest_first(&mut result);

        Ok(result
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_category(&self, category: &str, query: &str) -> CatalogResult<u64> {
        let store = self.store.read().await;
        let count = store
            .products
            .values()
            .filter(|p| contains_ci(&p.category, category) && contains_ci(&p.name, query))
            .count();
        Ok(count as u64)
    }

    async fn top_rated(&self, min_rating: f64, limit: u64) -> CatalogResult<Vec<Product>> {
        let store = self.store.read().await;

        let mut result: Vec<Product> = store
            .products
            .values()
            .filter(|p| p.rating >= min_rating)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        result.truncate(limit as usize);

        Ok(result)
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> CatalogResult<Product> {
        let mut store = self.store.write().await;

        let product = store
            .products
            .get_mut(&id)
            .ok_or(CatalogError::NotFound(id))?;
        product.apply_update(input);
        let updated = product.clone();

        tracing::info!(product_id = %id, "Updated product");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> CatalogResult<bool> {
        let mut store = self.store.write().await;

        if store.products.remove(&id).is_some() {
            // Reviews are children of the product
            store.reviews.retain(|_, r| r.product_id != id);
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn has_review(&self, product_id: Uuid, user_id: Uuid) -> CatalogResult<bool> {
        let store = self.store.read().await;
        let exists = store
            .reviews
            .values()
            .any(|r| r.product_id == product_id && r.user_id == user_id);
        Ok(exists)
    }

    async fn add_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        author: &str,
        input: CreateReview,
    ) -> CatalogResult<Review> {
        // One write guard across the duplicate check, the insert, and the
        // aggregate recompute.
        let mut store = self.store.write().await;

        if !store.products.contains_key(&product_id) {
            return Err(CatalogError::NotFound(product_id));
        }

        let duplicate = store
            .reviews
            .values()
            .any(|r| r.product_id == product_id && r.user_id == user_id);
        if duplicate {
            return Err(CatalogError::AlreadyReviewed);
        }

        let review = Review::new(product_id, user_id, author, input.rating, input.comment);
        store.reviews.insert(review.id, review.clone());

        let (count, total) = store
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .fold((0i32, 0i64), |(count, total), r| {
                (count + 1, total + r.rating as i64)
            });

        let product = store
            .products
            .get_mut(&product_id)
            .ok_or(CatalogError::NotFound(product_id))?;
        product.num_reviews = count;
        product.rating = total as f64 / count as f64;
        product.updated_at = chrono::Utc::now();

        tracing::info!(product_id = %product_id, user_id = %user_id, "Added review");
        Ok(review)
    }

    async fn list_reviews(&self, product_id: Uuid) -> CatalogResult<Vec<Review>> {
        let store = self.store.read().await;

        let mut result: Vec<Review> = store
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(result)
    }
}
