//! Catalog, cart, checkout and orders.
//!
//! # Usage
//!
//! ```bash
//! dewdrop products list --search serum --ordering price
//! dewdrop cart add 12 -q 2
//! dewdrop checkout --address "1 Dew Lane" --payment online
//! dewdrop orders track 40
//! ```

use dewdrop_client::types::NewOrder;
use dewdrop_client::{ApiClient, CartController, CheckoutFlow, CheckoutOutcome, LikedProducts, ProductFilter};
use dewdrop_core::{CartItemId, OrderId, OrderStatus, PaymentMethod, ProductId};

use super::CommandError;
use crate::output;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn list_products(client: &ApiClient, filter: &ProductFilter) -> CommandResult {
    let page = client.products().list(filter).await?;
    output::products(&page.results);
    if page.has_next() {
        let next = filter.page.unwrap_or(1) + 1;
        tracing::info!("{} products in total; use --page {next} for more", page.count);
    }
    Ok(())
}

pub async fn show_product(client: &ApiClient, id: ProductId) -> CommandResult {
    let products = client.products();
    let product = products.get(id).await?;
    let reviews = products.reviews(id).await?;
    output::product_detail(&product, &reviews);
    Ok(())
}

pub async fn categories(client: &ApiClient) -> CommandResult {
    output::categories(&client.products().categories().await?);
    Ok(())
}

pub async fn review(client: &ApiClient, id: ProductId, rating: u8, comment: &str) -> CommandResult {
    let review = client.products().add_review(id, rating, comment).await?;
    tracing::info!(review_id = %review.id, "Review posted");
    Ok(())
}

/// Like or unlike through the optimistic set, so a failure is reported
/// with the state rolled back.
pub async fn set_liked(client: &ApiClient, id: ProductId, liked: bool) -> CommandResult {
    let set = LikedProducts::new(client.clone());
    set.load().await?;
    if set.is_liked(id) == liked {
        tracing::info!(product_id = %id, liked, "Nothing to change");
        return Ok(());
    }
    let now_liked = set.toggle(id).await?;
    output::like_state(id, now_liked);
    Ok(())
}

pub async fn liked(client: &ApiClient) -> CommandResult {
    output::products(&client.products().liked().await?);
    Ok(())
}

async fn loaded_cart(client: &ApiClient) -> Result<CartController, Box<dyn std::error::Error>> {
    if !client.is_authenticated() {
        return Err(CommandError::NotSignedIn.into());
    }
    let cart = CartController::new(client.clone());
    cart.rehydrate().await?;
    Ok(cart)
}

pub async fn show_cart(client: &ApiClient) -> CommandResult {
    output::cart(&loaded_cart(client).await?);
    Ok(())
}

pub async fn add_to_cart(client: &ApiClient, product: ProductId, quantity: u32) -> CommandResult {
    let cart = loaded_cart(client).await?;
    cart.add(product, quantity).await?;
    output::cart(&cart);
    Ok(())
}

pub async fn update_cart(client: &ApiClient, item: CartItemId, quantity: u32) -> CommandResult {
    let cart = loaded_cart(client).await?;
    cart.set_quantity(item, quantity).await?;
    output::cart(&cart);
    Ok(())
}

pub async fn clear_cart(client: &ApiClient) -> CommandResult {
    let cart = loaded_cart(client).await?;
    cart.clear().await?;
    tracing::info!("Cart emptied");
    Ok(())
}

pub async fn checkout(client: &ApiClient, order: &NewOrder, accept_allergens: bool) -> CommandResult {
    let cart = loaded_cart(client).await?;
    output::cart(&cart);

    let flow = CheckoutFlow::new(client, &cart);
    let outcome = if accept_allergens {
        flow.place_order_acknowledging_allergens(order).await?
    } else {
        flow.place_order(order).await?
    };

    match outcome {
        CheckoutOutcome::Placed { order, payment } => {
            output::order(&order);
            if let Some(payment) = payment {
                output::payment(&payment);
            } else if order.payment_method == PaymentMethod::Online {
                tracing::warn!("Payment not started; run `dewdrop orders pay {}`", order.id);
            }
            Ok(())
        }
        CheckoutOutcome::AllergyWarning(reports) => {
            output::allergy_warning(&reports);
            Err(CommandError::AllergensFound.into())
        }
    }
}

pub async fn list_orders(client: &ApiClient, status: Option<OrderStatus>) -> CommandResult {
    let orders = match status {
        Some(status) => client.orders().list_with_status(status).await?,
        None => client.orders().list().await?,
    };
    output::orders(&orders);
    Ok(())
}

pub async fn show_order(client: &ApiClient, id: OrderId) -> CommandResult {
    output::order(&client.orders().get(id).await?);
    Ok(())
}

pub async fn cancel_order(client: &ApiClient, id: OrderId) -> CommandResult {
    let orders = client.orders();
    let order = orders.get(id).await?;
    let cancelled = orders.cancel_if_allowed(&order).await?;
    output::order(&cancelled);
    Ok(())
}

pub async fn track_order(client: &ApiClient, id: OrderId) -> CommandResult {
    output::tracking(&client.orders().track(id).await?);
    Ok(())
}

pub async fn pay(client: &ApiClient, id: OrderId) -> CommandResult {
    let payment = client.payments().initiate(id, PaymentMethod::Online).await?;
    output::payment(&payment);
    Ok(())
}

pub async fn verify_payment(client: &ApiClient, id: OrderId, reference: &str) -> CommandResult {
    let payment = client.payments().verify(id, reference).await?;
    output::payment(&payment);
    Ok(())
}
