//! Handler tests for the Catalog domain
//!
//! These tests verify HTTP behavior end to end against the in-memory
//! repository: request deserialization, auth layering, status codes, and
//! response shapes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_catalog::*;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

use axum_helpers::JwtAuth;

fn jwt() -> JwtAuth {
    JwtAuth::new("test-secret")
}

fn setup() -> (CatalogService<InMemoryCatalogRepository>, axum::Router) {
    let repo = InMemoryCatalogRepository::new();
    let service = CatalogService::new(repo);
    let app = handlers::router(service.clone(), jwt());
    (service, app)
}

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn product_json(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "image": "img/kettle.jpg",
        "description": "Steel kettle",
        "category": "kitchen",
        "price": 1999,
        "count_in_stock": 3
    })
}

async fn seed_product(
    service: &CatalogService<InMemoryCatalogRepository>,
    name: &str,
) -> Product {
    service
        .create_product(
            Uuid::now_v7(),
            CreateProduct {
                name: name.to_string(),
                image: String::new(),
                description: String::new(),
                category: "kitchen".to_string(),
                price: 1999,
                count_in_stock: 3,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_search_empty_catalog_returns_single_page() {
    let (_service, app) = setup();

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: ProductPage = json_body(response.into_body()).await;
    assert!(page.products.is_empty());
    assert_eq!(page.page, 1);
    assert_eq!(page.pages, 1);
}

#[tokio::test]
async fn test_search_pagination_resolves_out_of_range_pages() {
    let (service, app) = setup();

    for i in 0..9 {
        seed_product(&service, &format!("Kettle {}", i)).await;
    }

    // page=0 resolves to page 1, full page of 4
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/?page=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let page: ProductPage = json_body(response.into_body()).await;
    assert_eq!(page.page, 1);
    assert_eq!(page.pages, 3);
    assert_eq!(page.products.len(), 4);

    // page=999 resolves to the last page, which holds the remainder
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/?page=999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let page: ProductPage = json_body(response.into_body()).await;
    assert_eq!(page.page, 3);
    assert_eq!(page.products.len(), 1);

    // non-numeric page resolves to page 1 instead of rejecting
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/?page=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let page: ProductPage = json_body(response.into_body()).await;
    assert_eq!(page.page, 1);
}

#[tokio::test]
async fn test_search_filters_by_name_substring() {
    let (service, app) = setup();
    seed_product(&service, "Steel Kettle").await;
    seed_product(&service, "Desk Lamp").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/?q=KETTLE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let page: ProductPage = json_body(response.into_body()).await;
    assert_eq!(page.products.len(), 1);
    assert_eq!(page.products[0].name, "Steel Kettle");
}

#[tokio::test]
async fn test_category_browse_returns_paginated_envelope() {
    let (service, app) = setup();
    seed_product(&service, "Steel Kettle").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/category/KITCHEN")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page: ProductPage = json_body(response.into_body()).await;
    assert_eq!(page.products.len(), 1);
    assert_eq!(page.pages, 1);
}

#[tokio::test]
async fn test_get_product_returns_404_for_missing() {
    let (_service, app) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_requires_admin() {
    let (_service, app) = setup();

    // No token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(product_json("Kettle").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Non-admin token
    let token = jwt().issue(Uuid::now_v7(), "alice", false).unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::from(product_json("Kettle").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin token
    let token = jwt().issue(Uuid::now_v7(), "admin", true).unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::from(product_json("Kettle").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let product: Product = json_body(response.into_body()).await;
    assert_eq!(product.name, "Kettle");
    assert_eq!(product.num_reviews, 0);
}

#[tokio::test]
async fn test_create_product_validates_input() {
    let (_service, app) = setup();
    let token = jwt().issue(Uuid::now_v7(), "admin", true).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::from(
                    json!({"name": "", "price": 100}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_review_updates_product_detail() {
    let (service, app) = setup();
    let product = seed_product(&service, "Kettle").await;

    let token = jwt().issue(Uuid::now_v7(), "alice", false).unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/reviews", product.id))
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::from(json!({"rating": 5, "comment": "great"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let review: Review = json_body(response.into_body()).await;
    assert_eq!(review.name, "alice");
    assert_eq!(review.rating, 5);

    // Product detail now reflects the aggregate and embeds the review
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{}", product.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let detail: ProductWithReviews = json_body(response.into_body()).await;
    assert_eq!(detail.product.num_reviews, 1);
    assert_eq!(detail.product.rating, 5.0);
    assert_eq!(detail.reviews.len(), 1);
}

#[tokio::test]
async fn test_second_review_from_same_user_conflicts() {
    let (service, app) = setup();
    let product = seed_product(&service, "Kettle").await;
    let reviewer = Uuid::now_v7();
    let token = jwt().issue(reviewer, "alice", false).unwrap();

    let submit = |body: serde_json::Value| {
        Request::builder()
            .method("POST")
            .uri(format!("/{}/reviews", product.id))
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(submit(json!({"rating": 4, "comment": "ok"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(submit(json!({"rating": 2, "comment": "changed my mind"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Aggregate unchanged by the rejected submission
    let detail = service.get_product(product.id).await.unwrap();
    assert_eq!(detail.product.num_reviews, 1);
    assert_eq!(detail.product.rating, 4.0);
}

#[tokio::test]
async fn test_review_with_zero_rating_rejected() {
    let (service, app) = setup();
    let product = seed_product(&service, "Kettle").await;
    let token = jwt().issue(Uuid::now_v7(), "alice", false).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/reviews", product.id))
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::from(json!({"rating": 0, "comment": ""}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let detail = service.get_product(product.id).await.unwrap();
    assert_eq!(detail.product.num_reviews, 0);
}

#[tokio::test]
async fn test_top_products_shelf() {
    let (service, app) = setup();

    for (name, rating) in [("Great Kettle", 5), ("Fine Kettle", 4), ("Poor Kettle", 2)] {
        let product = seed_product(&service, name).await;
        service
            .submit_review(
                product.id,
                Uuid::now_v7(),
                "r",
                CreateReview {
                    rating,
                    comment: String::new(),
                },
            )
            .await
            .unwrap();
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/top")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let top: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(top.len(), 2);
    assert!(top.iter().all(|p| p.rating >= 4.0));
    assert!(top[0].rating >= top[1].rating);
}

#[tokio::test]
async fn test_delete_product_as_admin() {
    let (service, app) = setup();
    let product = seed_product(&service, "Kettle").await;
    let token = jwt().issue(Uuid::now_v7(), "admin", true).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/{}", product.id))
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(service.get_product(product.id).await.is_err());
}
