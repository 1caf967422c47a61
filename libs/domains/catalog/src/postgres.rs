use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{product, review};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{CreateProduct, CreateReview, Product, Review, UpdateProduct};
use crate::repository::CatalogRepository;

/// PostgreSQL implementation of CatalogRepository using SeaORM
#[derive(Clone)]
pub struct PgCatalogRepository {
    db: DatabaseConnection,
}

impl PgCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

fn name_filter(query: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::col((product::Entity, product::Column::Name)).ilike(like_pattern(query))
}

fn category_filter(category: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::col((product::Entity, product::Column::Category)).ilike(like_pattern(category))
}

/// Recompute a product's aggregate fields from its full review set.
///
/// Must be called with the product row already locked by the surrounding
/// transaction.
async fn recompute_aggregates(
    txn: &DatabaseTransaction,
    locked: product::Model,
) -> CatalogResult<()> {
    let reviews = review::Entity::find()
        .filter(review::Column::ProductId.eq(locked.id))
        .all(txn)
        .await?;

    let count = reviews.len() as i32;
    let total: i64 = reviews.iter().map(|r| r.rating as i64).sum();
    let rating = if count > 0 {
        total as f64 / count as f64
    } else {
        0.0
    };

    let mut active: product::ActiveModel = locked.into();
    active.num_reviews = Set(count);
    active.rating = Set(rating);
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(txn).await?;

    Ok(())
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create(&self, user_id: Uuid, input: CreateProduct) -> CatalogResult<Product> {
        let product = Product::new(user_id, input);
        let active: product::ActiveModel = product.into();

        let model = active.insert(&self.db).await?;

        tracing::info!(product_id = %model.id, name = %model.name, "Created product");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<Product>> {
        let model = product::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|m| m.into()))
    }

    async fn search_by_name(
        &self,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> CatalogResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(name_filter(query))
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count_by_name(&self, query: &str) -> CatalogResult<u64> {
        let count = product::Entity::find()
            .filter(name_filter(query))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    async fn search_by_category(
        &self,
        category: &str,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> CatalogResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(category_filter(category))
            .filter(name_filter(query))
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count_by_category(&self, category: &str, query: &str) -> CatalogResult<u64> {
        let count = product::Entity::find()
            .filter(category_filter(category))
            .filter(name_filter(query))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    async fn top_rated(&self, min_rating: f64, limit: u64) -> CatalogResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(product::Column::Rating.gte(min_rating))
            .order_by_desc(product::Column::Rating)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> CatalogResult<Product> {
        let model = product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        let mut domain: Product = model.into();
        domain.apply_update(input);

        let active: product::ActiveModel = domain.into();
        let updated = active.update(&self.db).await?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(updated.into())
    }

    async fn delete(&self, id: Uuid) -> CatalogResult<bool> {
        // Reviews are removed by the store's ON DELETE CASCADE
        let result = product::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn has_review(&self, product_id: Uuid, user_id: Uuid) -> CatalogResult<bool> {
        let existing = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(existing.is_some())
    }

    async fn add_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        author: &str,
        input: CreateReview,
    ) -> CatalogResult<Review> {
        let txn = self.db.begin().await?;

        // Lock the product row for the whole insert-and-recompute sequence
        let locked = product::Entity::find_by_id(product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(CatalogError::NotFound(product_id))?;

        // Authoritative duplicate check, backed by the unique index on
        // (product_id, user_id)
        let duplicate = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .is_some();
        if duplicate {
            return Err(CatalogError::AlreadyReviewed);
        }

        let review = Review::new(product_id, user_id, author, input.rating, input.comment);
        let active: review::ActiveModel = review.into();
        let inserted = active.insert(&txn).await.map_err(|e| {
            let err_str = e.to_string();
            if str::contains(&err_str, "duplicate key")
                || str::contains(&err_str, "unique constraint")
            {
                CatalogError::AlreadyReviewed
            } else {
                CatalogError::Database(err_str)
            }
        })?;

        recompute_aggregates(&txn, locked).await?;

        txn.commit().await?;

        tracing::info!(product_id = %product_id, user_id = %user_id, "Added review");
        Ok(inserted.into())
    }

    async fn list_reviews(&self, product_id: Uuid) -> CatalogResult<Vec<Review>> {
        let models = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}
