//! Product detail, shown as a modal over the home page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Path,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use dabs_core::catalog::{self, Product};
use tracing::instrument;

use super::{Banner, not_found};
use crate::cookies::VisitorCookies;
use crate::filters;

#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub banner: Banner,
    pub product: &'static Product,
    pub images: Vec<String>,
}

#[instrument(skip(headers))]
pub async fn show(Path(slug): Path<String>, headers: HeaderMap) -> Response {
    let cookies = VisitorCookies::from_headers(&headers);

    let Some(product) = catalog::product(&slug) else {
        return not_found(&cookies);
    };

    ProductTemplate {
        banner: Banner::new(&cookies, format!("/products/{}", product.slug)),
        product,
        images: product.image_paths(),
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::*;

    #[tokio::test]
    async fn test_known_product() {
        let response = send(app(), get("/products/baller-jars", Some(VERIFIED))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("Baller Jars"));
        assert!(body.contains("href=\"/#products\""));
    }

    #[tokio::test]
    async fn test_unknown_product_is_404() {
        let response = send(app(), get("/products/moon-rocks", Some(VERIFIED))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
