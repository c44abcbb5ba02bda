//! Admin dashboard: stats, order fulfilment, catalog and banners.
//!
//! Every call checks the stored session's role first so a customer gets a
//! `Forbidden` error without a round trip. The backend enforces the same
//! rule regardless.

use dewdrop_core::{BannerId, OrderId, OrderStatus, ProductId};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::{ApiClient, ApiRequest, Upload};
use crate::error::{ApiError, Result};
use crate::types::{Banner, DashboardStats, Order, Page, Product, ProductDraft};

/// Admin endpoints.
pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn ensure_admin(&self) -> Result<()> {
        let session = self
            .client
            .store()
            .load()?
            .ok_or(ApiError::NotAuthenticated)?;
        if !session.user.is_admin() {
            return Err(ApiError::Forbidden("admin access required".to_string()));
        }
        Ok(())
    }

    /// Headline numbers.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.ensure_admin()?;
        self.client.execute(ApiRequest::get("admin/stats/")).await
    }

    /// All customers' orders, optionally in one status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    pub async fn orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        self.ensure_admin()?;
        let page: Page<Order> = self
            .client
            .execute(ApiRequest::get("admin/orders/").query_opt("status", status))
            .await?;
        Ok(page.results)
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    #[instrument(skip(self))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        self.ensure_admin()?;
        let request = ApiRequest::patch(format!("admin/orders/{id}/status/"))
            .json(&json!({ "status": status }))?;
        let order = self.client.execute(request).await?;
        info!(order_id = %id, status = %status, "Order status updated");
        Ok(order)
    }

    /// Add a product, with an optional image.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` when the name or price is missing.
    #[instrument(skip(self, draft, image), fields(name = ?draft.name))]
    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        image: Option<Upload>,
    ) -> Result<Product> {
        self.ensure_admin()?;
        if draft.name.as_deref().is_none_or(|name| name.trim().is_empty()) {
            return Err(ApiError::InvalidInput("product name is required".to_string()));
        }
        if draft.price.is_none() {
            return Err(ApiError::InvalidInput("product price is required".to_string()));
        }

        let product: Product = self
            .client
            .execute(product_form(ApiRequest::post("admin/products/"), draft, image))
            .await?;
        self.client.cache().invalidate_all();
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Edit a product. Unset draft fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    #[instrument(skip(self, draft, image))]
    pub async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        image: Option<Upload>,
    ) -> Result<Product> {
        self.ensure_admin()?;
        let request = product_form(ApiRequest::patch(format!("admin/products/{id}/")), draft, image);
        let product = self.client.execute(request).await?;
        self.client.cache().invalidate_all();
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        self.ensure_admin()?;
        self.client
            .execute_unit(ApiRequest::delete(format!("admin/products/{id}/")))
            .await?;
        self.client.cache().invalidate_all();
        Ok(())
    }

    /// Home page banners.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    pub async fn banners(&self) -> Result<Vec<Banner>> {
        self.ensure_admin()?;
        let page: Page<Banner> = self
            .client
            .execute(ApiRequest::get("admin/banners/"))
            .await?;
        Ok(page.results)
    }

    /// Upload a banner image.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for an empty image.
    #[instrument(skip(self, image), fields(file = %image.file_name))]
    pub async fn upload_banner(
        &self,
        title: Option<&str>,
        link: Option<&str>,
        image: Upload,
    ) -> Result<Banner> {
        self.ensure_admin()?;
        if image.bytes.is_empty() {
            return Err(ApiError::InvalidInput("banner image is empty".to_string()));
        }

        let mut request = ApiRequest::post("admin/banners/");
        if let Some(title) = title {
            request = request.text_field("title", title.trim());
        }
        if let Some(link) = link {
            request = request.text_field("link", link.trim());
        }
        self.client
            .execute(request.file_field("image", image))
            .await
    }

    /// Remove a banner.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    pub async fn delete_banner(&self, id: BannerId) -> Result<()> {
        self.ensure_admin()?;
        self.client
            .execute_unit(ApiRequest::delete(format!("admin/banners/{id}/")))
            .await
    }
}

fn product_form(request: ApiRequest, draft: &ProductDraft, image: Option<Upload>) -> ApiRequest {
    let request = draft
        .fields()
        .into_iter()
        .fold(request, |request, (name, value)| request.text_field(name, value));
    match image {
        Some(image) => request.file_field("image", image),
        None => request,
    }
}
