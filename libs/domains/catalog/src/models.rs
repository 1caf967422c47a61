use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier
    pub id: Uuid,
    /// Creator (admin user who added the product)
    pub user_id: Uuid,
    /// Product name
    pub name: String,
    /// Image reference (URL or object-store key)
    pub image: String,
    /// Product description
    pub description: String,
    /// Category (free text, matched by substring when browsing)
    pub category: String,
    /// Price in cents (for precision)
    pub price: i64,
    /// Current stock quantity
    pub count_in_stock: i32,
    /// Mean of all review ratings; 0 when there are no reviews
    pub rating: f64,
    /// Number of reviews
    pub num_reviews: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Review entity - one per (product, user) pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    /// Author display name, denormalized at submit time
    pub name: String,
    /// Rating in 1..=5
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub category: String,
    /// Price in cents
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub count_in_stock: i32,
}

/// DTO for updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[validate(range(min = 0))]
    pub count_in_stock: Option<i32>,
}

/// DTO for submitting a review.
///
/// The rating bounds are enforced in the service so that a missing rating
/// (0) and an out-of-range rating produce distinct errors.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    pub rating: i32,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub comment: String,
}

/// Query parameters for catalog browsing.
///
/// `page` is taken as a raw string: anything that does not parse as a
/// positive integer resolves to page 1 rather than rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct BrowseQuery {
    /// Case-insensitive substring to match against product names
    pub q: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
}

impl BrowseQuery {
    pub fn name_query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }

    pub fn page_number(&self) -> Option<u64> {
        self.page.as_deref().and_then(|p| p.parse().ok())
    }
}

/// One page of catalog results plus pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Resolved 1-based page number
    pub page: u64,
    /// Total number of pages (at least 1)
    pub pages: u64,
}

/// Product detail together with its reviews
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductWithReviews {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
}

impl Product {
    /// Create a new product owned by `user_id` from a CreateProduct DTO
    pub fn new(user_id: Uuid, input: CreateProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            name: input.name,
            image: input.image,
            description: input.description,
            category: input.category,
            price: input.price,
            count_in_stock: input.count_in_stock,
            rating: 0.0,
            num_reviews: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(count_in_stock) = update.count_in_stock {
            self.count_in_stock = count_in_stock;
        }
        self.updated_at = Utc::now();
    }
}

impl Review {
    pub fn new(product_id: Uuid, user_id: Uuid, author: &str, rating: i32, comment: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            product_id,
            user_id,
            name: author.to_string(),
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}
