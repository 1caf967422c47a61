//! Catalog service - business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    CreateProduct, CreateReview, Product, ProductPage, ProductWithReviews, Review, UpdateProduct,
};
use crate::repository::CatalogRepository;

/// Fixed page size for catalog browsing
pub const PAGE_SIZE: u64 = 4;

/// Minimum aggregate rating for the "top products" shelf
const TOP_RATING_FLOOR: f64 = 4.0;

/// Maximum number of top products returned
const TOP_LIMIT: u64 = 5;

/// Resolve a requested page number against the total item count.
///
/// Absent or non-positive pages resolve to 1; pages past the end resolve to
/// the last page. There is always at least one page, even with no items.
fn resolve_page(total: u64, requested: Option<u64>) -> (u64, u64) {
    let pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = match requested {
        None | Some(0) => 1,
        Some(p) => p.min(pages),
    };
    (page, pages)
}

/// Catalog service providing product and review operations.
///
/// The service layer handles validation and the review-submission rules;
/// storage atomicity lives in the repository.
pub struct CatalogService<R: CatalogRepository> {
    repository: Arc<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product owned by `user_id`
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, user_id: Uuid, input: CreateProduct) -> CatalogResult<Product> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.create(user_id, input).await
    }

    /// Get a product with its reviews
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> CatalogResult<ProductWithReviews> {
        let product = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        let reviews = self.repository.list_reviews(id).await?;

        Ok(ProductWithReviews { product, reviews })
    }

    /// Search products by name substring, newest first, paginated.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        query: &str,
        page: Option<u64>,
    ) -> CatalogResult<ProductPage> {
        let total = self.repository.count_by_name(query).await?;
        let (page, pages) = resolve_page(total, page);

        let products = self
            .repository
            .search_by_name(query, PAGE_SIZE, (page - 1) * PAGE_SIZE)
            .await?;

        Ok(ProductPage {
            products,
            page,
            pages,
        })
    }

    /// Browse a category, optionally narrowed by a name substring.
    ///
    /// Same envelope as [`Self::search_products`].
    #[instrument(skip(self))]
    pub async fn products_by_category(
        &self,
        category: &str,
        query: &str,
        page: Option<u64>,
    ) -> CatalogResult<ProductPage> {
        let total = self.repository.count_by_category(category, query).await?;
        let (page, pages) = resolve_page(total, page);

        let products = self
            .repository
            .search_by_category(category, query, PAGE_SIZE, (page - 1) * PAGE_SIZE)
            .await?;

        Ok(ProductPage {
            products,
            page,
            pages,
        })
    }

    /// Best-rated products: rating >= 4, best first, at most 5
    #[instrument(skip(self))]
    pub async fn top_products(&self) -> CatalogResult<Vec<Product>> {
        self.repository.top_rated(TOP_RATING_FLOOR, TOP_LIMIT).await
    }

    /// Update an existing product
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> CatalogResult<Product> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> CatalogResult<()> {
        if !self.repository.delete(id).await? {
            return Err(CatalogError::NotFound(id));
        }
        Ok(())
    }

    /// Submit a review for a product.
    ///
    /// Check order is load-bearing: a duplicate submission is reported as
    /// already-reviewed even when its rating is also invalid. The repository
    /// re-checks the duplicate inside its transaction; the check here only
    /// produces the friendlier early error.
    #[instrument(skip(self, input), fields(rating = input.rating))]
    pub async fn submit_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        author: &str,
        input: CreateReview,
    ) -> CatalogResult<Review> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository
            .get_by_id(product_id)
            .await?
            .ok_or(CatalogError::NotFound(product_id))?;

        if self.repository.has_review(product_id, user_id).await? {
            return Err(CatalogError::AlreadyReviewed);
        }

        if input.rating == 0 {
            return Err(CatalogError::RatingRequired);
        }

        if !(1..=5).contains(&input.rating) {
            return Err(CatalogError::RatingOutOfRange(input.rating));
        }

        self.repository
            .add_review(product_id, user_id, author, input)
            .await
    }
}

impl<R: CatalogRepository> Clone for CatalogService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCatalogRepository;
    use mockall::predicate::eq;

    fn sample_product(id: Uuid) -> Product {
        Product {
            id,
            user_id: Uuid::now_v7(),
            name: "Kettle".to_string(),
            image: String::new(),
            description: String::new(),
            category: "kitchen".to_string(),
            price: 1999,
            count_in_stock: 3,
            rating: 0.0,
            num_reviews: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn review_input(rating: i32) -> CreateReview {
        CreateReview {
            rating,
            comment: String::new(),
        }
    }

    #[test]
    fn test_resolve_page_defaults_to_first() {
        assert_eq!(resolve_page(9, None), (1, 3));
        assert_eq!(resolve_page(9, Some(0)), (1, 3));
    }

    #[test]
    fn test_resolve_page_clamps_to_last() {
        assert_eq!(resolve_page(9, Some(999)), (3, 3));
        assert_eq!(resolve_page(8, Some(2)), (2, 2));
    }

    #[test]
    fn test_resolve_page_empty_catalog_has_one_page() {
        assert_eq!(resolve_page(0, None), (1, 1));
        assert_eq!(resolve_page(0, Some(5)), (1, 1));
    }

    #[tokio::test]
    async fn test_search_requests_offset_of_resolved_page() {
        let mut mock_repo = MockCatalogRepository::new();

        mock_repo
            .expect_count_by_name()
            .with(eq("kettle"))
            .returning(|_| Ok(9));
        // Page 999 resolves to page 3 of 3 -> offset 8
        mock_repo
            .expect_search_by_name()
            .with(eq("kettle"), eq(PAGE_SIZE), eq(8))
            .returning(|_, _, _| Ok(vec![]));

        let service = CatalogService::new(mock_repo);
        let page = service
            .search_products("kettle", Some(999))
            .await
            .unwrap();

        assert_eq!(page.page, 3);
        assert_eq!(page.pages, 3);
    }

    #[tokio::test]
    async fn test_top_products_uses_floor_and_cap() {
        let mut mock_repo = MockCatalogRepository::new();

        mock_repo
            .expect_top_rated()
            .with(eq(4.0), eq(5))
            .returning(|_, _| Ok(vec![]));

        let service = CatalogService::new(mock_repo);
        assert!(service.top_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_review_missing_product() {
        let mut mock_repo = MockCatalogRepository::new();
        let product_id = Uuid::now_v7();

        mock_repo
            .expect_get_by_id()
            .with(eq(product_id))
            .returning(|_| Ok(None));

        let service = CatalogService::new(mock_repo);
        let result = service
            .submit_review(product_id, Uuid::now_v7(), "a", review_input(4))
            .await;

        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_review_duplicate_beats_rating_check() {
        let mut mock_repo = MockCatalogRepository::new();
        let product_id = Uuid::now_v7();

        mock_repo
            .expect_get_by_id()
            .returning(move |id| Ok(Some(sample_product(id))));
        mock_repo.expect_has_review().returning(|_, _| Ok(true));
        // add_review must not be reached

        let service = CatalogService::new(mock_repo);
        // Rating 0 is also invalid, but the duplicate wins
        let result = service
            .submit_review(product_id, Uuid::now_v7(), "a", review_input(0))
            .await;

        assert!(matches!(result, Err(CatalogError::AlreadyReviewed)));
    }

    #[tokio::test]
    async fn test_submit_review_zero_rating() {
        let mut mock_repo = MockCatalogRepository::new();

        mock_repo
            .expect_get_by_id()
            .returning(move |id| Ok(Some(sample_product(id))));
        mock_repo.expect_has_review().returning(|_, _| Ok(false));

        let service = CatalogService::new(mock_repo);
        let result = service
            .submit_review(Uuid::now_v7(), Uuid::now_v7(), "a", review_input(0))
            .await;

        assert!(matches!(result, Err(CatalogError::RatingRequired)));
    }

    #[tokio::test]
    async fn test_submit_review_out_of_range_rating() {
        let mut mock_repo = MockCatalogRepository::new();

        mock_repo
            .expect_get_by_id()
            .returning(move |id| Ok(Some(sample_product(id))));
        mock_repo.expect_has_review().returning(|_, _| Ok(false));

        let service = CatalogService::new(mock_repo);

        let result = service
            .submit_review(Uuid::now_v7(), Uuid::now_v7(), "a", review_input(6))
            .await;
        assert!(matches!(result, Err(CatalogError::RatingOutOfRange(6))));

        let result = service
            .submit_review(Uuid::now_v7(), Uuid::now_v7(), "a", review_input(-1))
            .await;
        assert!(matches!(result, Err(CatalogError::RatingOutOfRange(-1))));
    }

    #[tokio::test]
    async fn test_submit_review_accepted() {
        let mut mock_repo = MockCatalogRepository::new();
        let product_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();

        mock_repo
            .expect_get_by_id()
            .returning(move |id| Ok(Some(sample_product(id))));
        mock_repo
            .expect_has_review()
            .with(eq(product_id), eq(user_id))
            .returning(|_, _| Ok(false));
        mock_repo
            .expect_add_review()
            .withf(move |p, u, author, input| {
                *p == product_id && *u == user_id && author == "alice" && input.rating == 5
            })
            .returning(|p, u, author, input| {
                Ok(Review::new(p, u, author, input.rating, input.comment))
            });

        let service = CatalogService::new(mock_repo);
        let review = service
            .submit_review(product_id, user_id, "alice", review_input(5))
            .await
            .unwrap();

        assert_eq!(review.rating, 5);
        assert_eq!(review.name, "alice");
    }
}
