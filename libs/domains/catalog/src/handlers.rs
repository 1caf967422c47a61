//! HTTP handlers for the Catalog API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    CurrentUser, JwtAuth, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    require_admin, require_auth,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CatalogResult;
use crate::models::{
    BrowseQuery, CreateProduct, CreateReview, Product, ProductPage, ProductWithReviews, Review,
    UpdateProduct,
};
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

/// OpenAPI documentation for the Catalog API
#[derive(OpenApi)]
#[openapi(
    paths(
        search_products,
        top_products,
        products_by_category,
        get_product,
        create_product,
        update_product,
        delete_product,
        submit_review,
    ),
    components(
        schemas(
            Product, Review, ProductPage, ProductWithReviews,
            CreateProduct, UpdateProduct, CreateReview
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Catalog", description = "Product catalog and review endpoints")
    )
)]
pub struct ApiDoc;

/// Create the catalog router.
///
/// Browsing is anonymous; review submission requires a principal; product
/// mutation requires the admin role.
pub fn router<R: CatalogRepository + 'static>(
    service: CatalogService<R>,
    jwt: JwtAuth,
) -> Router {
    let shared_service = Arc::new(service);

    let admin_routes = Router::new()
        .route("/", axum::routing::post(create_product))
        .route(
            "/{id}",
            axum::routing::put(update_product).delete(delete_product),
        )
        .route_layer(middleware::from_fn_with_state(jwt.clone(), require_admin));

    let user_routes = Router::new()
        .route("/{id}/reviews", axum::routing::post(submit_review))
        .route_layer(middleware::from_fn_with_state(jwt, require_auth));

    Router::new()
        .route("/", get(search_products))
        .route("/top", get(top_products))
        .route("/category/{category}", get(products_by_category))
        .route("/{id}", get(get_product))
        .merge(admin_routes)
        .merge(user_routes)
        .with_state(shared_service)
}

/// Search products by name substring, paginated
#[utoipa::path(
    get,
    path = "",
    tag = "Catalog",
    params(BrowseQuery),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Query(query): Query<BrowseQuery>,
) -> CatalogResult<Json<ProductPage>> {
    let page = service
        .search_products(query.name_query(), query.page_number())
        .await?;
    Ok(Json(page))
}

/// Best-rated products (rating >= 4, at most 5)
#[utoipa::path(
    get,
    path = "/top",
    tag = "Catalog",
    responses(
        (status = 200, description = "Top products, best first", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn top_products<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
) -> CatalogResult<Json<Vec<Product>>> {
    let products = service.top_products().await?;
    Ok(Json(products))
}

/// Browse a category, optionally narrowed by a name substring
#[utoipa::path(
    get,
    path = "/category/{category}",
    tag = "Catalog",
    params(
        ("category" = String, Path, description = "Category substring to match"),
        BrowseQuery
    ),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn products_by_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(category): Path<String>,
    Query(query): Query<BrowseQuery>,
) -> CatalogResult<Json<ProductPage>> {
    let page = service
        .products_by_category(&category, query.name_query(), query.page_number())
        .await?;
    Ok(Json(page))
}

/// Get a product with its reviews
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductWithReviews),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
) -> CatalogResult<Json<ProductWithReviews>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Create a new product (admin only)
#[utoipa::path(
    post,
    path = "",
    tag = "Catalog",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn create_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> CatalogResult<impl IntoResponse> {
    let product = service.create_product(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (admin only)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn update_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> CatalogResult<Json<Product>> {
    let product = service.update_product(id, input).await?;
    Ok(Json(product))
}

/// Delete a product (admin only)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn delete_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
) -> CatalogResult<impl IntoResponse> {
    service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a review for a product (one per user per product)
#[utoipa::path(
    post,
    path = "/{id}/reviews",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review added", body = Review),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn submit_review<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateReview>,
) -> CatalogResult<impl IntoResponse> {
    let review = service
        .submit_review(id, user.id, &user.username, input)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
