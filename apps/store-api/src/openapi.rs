use utoipa::OpenApi;

/// Combined OpenAPI document for the storefront API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "Product catalog, reviews, and user management",
    ),
    tags(
        (name = "Catalog", description = "Product catalog and review endpoints"),
        (name = "Users", description = "Registration, authentication, and user administration")
    )
)]
pub struct ApiDoc;

/// Merge the domain documents under their mount points.
pub fn build() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(with_prefix(
        domain_catalog::ApiDoc::openapi(),
        "/api/products",
    ));
    doc.merge(with_prefix(domain_users::ApiDoc::openapi(), "/api/users"));
    doc
}

fn with_prefix(doc: utoipa::openapi::OpenApi, prefix: &str) -> utoipa::openapi::OpenApi {
    let mut nested = doc;
    nested.paths.paths = nested
        .paths
        .paths
        .into_iter()
        .map(|(path, item)| (format!("{}{}", prefix, path), item))
        .collect();
    nested
}
