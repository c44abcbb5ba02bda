//! Admin dashboard commands.
//!
//! # Usage
//!
//! ```bash
//! dewdrop admin stats
//! dewdrop admin orders --status pending
//! dewdrop admin set-status 40 shipped
//! dewdrop admin add-product --name "Cica Balm" --price 24.00 --image balm.jpg
//! dewdrop admin upload-banner summer.png --title "Summer sale"
//! ```
//!
//! The signed-in user must be an admin.

use std::path::{Path, PathBuf};

use dewdrop_client::types::ProductDraft;
use dewdrop_client::{ApiClient, Upload};
use dewdrop_core::{BannerId, OrderId, OrderStatus, ProductId};

use crate::output;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

async fn read_image(path: Option<PathBuf>) -> std::io::Result<Option<Upload>> {
    match path {
        Some(path) => Ok(Some(Upload::from_path(path).await?)),
        None => Ok(None),
    }
}

pub async fn stats(client: &ApiClient) -> CommandResult {
    output::dashboard(&client.admin().dashboard_stats().await?);
    Ok(())
}

pub async fn orders(client: &ApiClient, status: Option<OrderStatus>) -> CommandResult {
    output::orders(&client.admin().orders(status).await?);
    Ok(())
}

pub async fn set_status(client: &ApiClient, order: OrderId, status: OrderStatus) -> CommandResult {
    let order = client.admin().update_order_status(order, status).await?;
    output::order(&order);
    Ok(())
}

pub async fn add_product(
    client: &ApiClient,
    draft: &ProductDraft,
    image: Option<PathBuf>,
) -> CommandResult {
    let image = read_image(image).await?;
    let product = client.admin().create_product(draft, image).await?;
    output::products(&[product]);
    Ok(())
}

pub async fn edit_product(
    client: &ApiClient,
    id: ProductId,
    draft: &ProductDraft,
    image: Option<PathBuf>,
) -> CommandResult {
    let image = read_image(image).await?;
    let product = client.admin().update_product(id, draft, image).await?;
    output::products(&[product]);
    Ok(())
}

pub async fn delete_product(client: &ApiClient, id: ProductId) -> CommandResult {
    client.admin().delete_product(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}

pub async fn banners(client: &ApiClient) -> CommandResult {
    output::banners(&client.admin().banners().await?);
    Ok(())
}

pub async fn upload_banner(
    client: &ApiClient,
    image: &Path,
    title: Option<&str>,
    link: Option<&str>,
) -> CommandResult {
    let upload = Upload::from_path(image).await?;
    let banner = client.admin().upload_banner(title, link, upload).await?;
    output::banners(&[banner]);
    Ok(())
}

pub async fn delete_banner(client: &ApiClient, id: BannerId) -> CommandResult {
    client.admin().delete_banner(id).await?;
    tracing::info!(banner_id = %id, "Banner deleted");
    Ok(())
}
