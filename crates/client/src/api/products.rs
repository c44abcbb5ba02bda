//! Catalog, reviews, likes and allergy checks.

use dewdrop_core::{CategoryId, ProductId, UserId};
use serde_json::json;
use tracing::{debug, instrument};

use crate::cache::CacheValue;
use crate::client::{ApiClient, ApiRequest, Auth};
use crate::error::{ApiError, Result};
use crate::types::{AllergyReport, Category, Page, Product, Review};

/// Catalog listing parameters. The default lists the first page unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    /// Free-text search over name, brand and ingredients.
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    /// Backend ordering key, e.g. `price` or `-created_at`.
    pub ordering: Option<String>,
    pub page: Option<u32>,
}

impl ProductFilter {
    fn to_request(&self) -> ApiRequest {
        ApiRequest::get("products/")
            .auth(Auth::Optional)
            .query_opt("search", self.search.as_deref().map(str::trim))
            .query_opt("category", self.category)
            .query_opt("ordering", self.ordering.as_deref())
            .query_opt("page", self.page)
    }

    const fn is_cacheable(&self) -> bool {
        self.search.is_none()
    }
}

/// Product endpoints.
///
/// Product reads are cached for 5 minutes per viewing user, since the
/// `is_liked` flag depends on who is asking.
pub struct ProductsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProductsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn viewer(&self) -> Option<UserId> {
        self.client
            .store()
            .load()
            .ok()
            .flatten()
            .map(|session| session.user.id)
    }

    /// One page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Page<Product>> {
        let cache_key = format!("products:{:?}:{filter:?}", self.viewer());

        // Search results are not cached
        if filter.is_cacheable()
            && let Some(CacheValue::Products(page)) = self.client.cache().get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let page: Page<Product> = self.client.execute(filter.to_request()).await?;

        if filter.is_cacheable() {
            self.client
                .cache()
                .insert(cache_key, CacheValue::Products(page.clone()))
                .await;
        }
        Ok(page)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown product.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        let cache_key = format!("product:{:?}:{id}", self.viewer());

        if let Some(CacheValue::Product(product)) = self.client.cache().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .client
            .execute(ApiRequest::get(format!("products/{id}/")).auth(Auth::Optional))
            .await?;

        self.client
            .cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let cache_key = "categories".to_string();
        if let Some(CacheValue::Categories(categories)) = self.client.cache().get(&cache_key).await {
            return Ok(categories);
        }

        let page: Page<Category> = self
            .client
            .execute(ApiRequest::get("products/categories/").auth(Auth::None))
            .await?;
        self.client
            .cache()
            .insert(cache_key, CacheValue::Categories(page.results.clone()))
            .await;
        Ok(page.results)
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reviews(&self, id: ProductId) -> Result<Vec<Review>> {
        let page: Page<Review> = self
            .client
            .execute(ApiRequest::get(format!("products/{id}/reviews/")).auth(Auth::Optional))
            .await?;
        Ok(page.results)
    }

    /// Review a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` unless `rating` is 1 to 5.
    #[instrument(skip(self, comment))]
    pub async fn add_review(&self, id: ProductId, rating: u8, comment: &str) -> Result<Review> {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::InvalidInput(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }

        let request = ApiRequest::post(format!("products/{id}/reviews/")).json(&json!({
            "rating": rating,
            "comment": comment.trim(),
        }))?;
        let review = self.client.execute(request).await?;
        self.client.cache().invalidate_all();
        Ok(review)
    }

    /// Like a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn like(&self, id: ProductId) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::post(format!("products/{id}/like/")))
            .await?;
        // Like counts show up on listing pages as well as the product.
        self.client.cache().invalidate_all();
        Ok(())
    }

    /// Remove a like.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn unlike(&self, id: ProductId) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::post(format!("products/{id}/unlike/")))
            .await?;
        self.client.cache().invalidate_all();
        Ok(())
    }

    /// Products the signed-in user liked.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn liked(&self) -> Result<Vec<Product>> {
        let page: Page<Product> = self
            .client
            .execute(ApiRequest::get("products/liked/"))
            .await?;
        Ok(page.results)
    }

    /// Match the signed-in user's allergies against a product's
    /// ingredients.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn allergy_check(&self, id: ProductId) -> Result<AllergyReport> {
        let request =
            ApiRequest::post("products/allergy-check/").json(&json!({ "product_id": id }))?;
        let mut report: AllergyReport = self.client.execute(request).await?;
        report.product_id.get_or_insert(id);
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::{client_with_store, signed_in_client};
    use crate::session::MemorySessionStore;

    fn product(id: i64, liked: bool) -> serde_json::Value {
        json!({"id": id, "name": "Niacinamide Serum", "price": "18.00", "is_liked": liked})
    }

    #[tokio::test]
    async fn test_anonymous_listing_with_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/"))
            .and(query_param("category", "4"))
            .and(query_param("ordering", "-price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1, "next": null, "previous": null, "results": [product(1, false)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_store(&server, Arc::new(MemorySessionStore::new()));
        let filter = ProductFilter {
            category: Some(CategoryId::new(4)),
            ordering: Some("-price".to_string()),
            ..ProductFilter::default()
        };

        let page = client.products().list(&filter).await.unwrap();
        assert_eq!(page.results.len(), 1);
        // Served from cache.
        client.products().list(&filter).await.unwrap();
    }

    #[tokio::test]
    async fn test_like_invalidates_cached_product() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product(5, false)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/products/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product(5, true)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/products/5/like/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"liked": true})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let id = ProductId::new(5);

        assert!(!client.products().get(id).await.unwrap().is_liked);
        assert!(!client.products().get(id).await.unwrap().is_liked);
        client.products().like(id).await.unwrap();
        assert!(client.products().get(id).await.unwrap().is_liked);
    }

    #[tokio::test]
    async fn test_add_review_rejects_out_of_range_rating() {
        let server = MockServer::start().await;
        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;

        for rating in [0, 6] {
            let err = client
                .products()
                .add_review(ProductId::new(1), rating, "meh")
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(_)));
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_allergy_check_fills_product_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/products/allergy-check/"))
            .and(body_json(json!({"product_id": 9})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "has_allergens": true,
                "allergens": ["fragrance"]
            })))
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let report = client.products().allergy_check(ProductId::new(9)).await.unwrap();

        assert_eq!(report.product_id, Some(ProductId::new(9)));
        assert_eq!(report.matched_allergens, vec!["fragrance"]);
    }
}
