//! Plain-text rendering of command results.
//!
//! Results go to stdout; diagnostics go through `tracing` on stderr.

#![allow(clippy::print_stdout)]

use std::io::Write;

use dewdrop_client::types::{
    AllergyReport, Banner, Category, Conversation, DashboardStats, Message, Notification, Order,
    OrderTracking, PaymentSession, Product, ProductCategory, Review, SocialUser,
};
use dewdrop_client::{CartController, Session, SessionEndReason};
use dewdrop_core::ProductId;

pub fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

pub fn signed_in(session: &Session) {
    println!("Signed in as {} (id {})", session.user.username, session.user.id);
    if !session.user.allergies.is_empty() {
        println!("Declared allergies: {}", session.user.allergies.join(", "));
    }
}

pub fn whoami(session: &Session) {
    let user = &session.user;
    println!("{} (id {}, {})", user.username, user.id, user.role);
    if let Some(email) = &user.email {
        println!("  email:      {email}");
    }
    if !user.allergies.is_empty() {
        println!("  allergies:  {}", user.allergies.join(", "));
    }
    match session.access_expires_at() {
        Some(expiry) if session.is_access_expired() => println!(
            "  token expired {} (renewed on next request)",
            expiry.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Some(expiry) => println!("  token until {}", expiry.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  token expiry unknown"),
    }
    if session.refresh_token.is_none() {
        println!("  no refresh token stored; you will need to sign in again when it expires");
    }
}

pub fn session_ended(reason: SessionEndReason) {
    let why = match reason {
        SessionEndReason::MissingRefreshToken => "no refresh token was stored",
        SessionEndReason::RefreshFailed => "the server refused to renew it",
    };
    println!("Your session has ended ({why}). Run `dewdrop login` to sign in again.");
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products.");
        return;
    }
    for product in products {
        let stock = if product.in_stock() { "" } else { "  [sold out]" };
        let liked = if product.is_liked { " ♥" } else { "" };
        println!(
            "#{:<5} {:<40} {:>9}{liked}{stock}",
            product.id, product.name, product.price
        );
    }
}

pub fn product_detail(product: &Product, reviews: &[Review]) {
    println!("#{} {}", product.id, product.name);
    if let Some(brand) = &product.brand {
        println!("by {brand}");
    }
    println!("Price: {}   In stock: {}", product.price, product.stock);
    match &product.category {
        Some(ProductCategory::Full(category)) => println!("Category: {}", category.name),
        Some(ProductCategory::Name(name)) => println!("Category: {name}"),
        Some(ProductCategory::Id(id)) => println!("Category: #{id}"),
        None => {}
    }
    if let Some(rating) = product.average_rating {
        println!("Rating: {rating:.1} / 5   Likes: {}", product.likes_count);
    }
    if !product.description.is_empty() {
        println!("\n{}", product.description);
    }
    if let Some(ingredients) = &product.ingredients {
        println!("\nIngredients: {ingredients}");
    }
    if !reviews.is_empty() {
        println!("\nReviews:");
        for review in reviews {
            let author = review.user.as_deref().unwrap_or("anonymous");
            println!("  {}/5 {author}: {}", review.rating, review.comment);
        }
    }
}

pub fn categories(categories: &[Category]) {
    for category in categories {
        println!("#{:<4} {}", category.id, category.name);
    }
}

pub fn like_state(id: ProductId, liked: bool) {
    if liked {
        println!("Liked product #{id}");
    } else {
        println!("Unliked product #{id}");
    }
}

pub fn cart(cart: &CartController) {
    let lines = cart.lines();
    if lines.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in &lines {
        println!(
            "[{}] {} x{} @ {}",
            line.id, line.product.name, line.quantity, line.product.price
        );
    }
    let totals = cart.totals();
    println!("Subtotal: {:>10}", totals.subtotal);
    println!("Tax:      {:>10}", totals.tax);
    println!("Total:    {:>10}", totals.total);
}

pub fn allergy_warning(reports: &[AllergyReport]) {
    println!("Allergy warning:");
    for report in reports {
        let name = report
            .product_name
            .clone()
            .or_else(|| report.product_id.map(|id| format!("#{id}")))
            .unwrap_or_else(|| "a product".to_string());
        println!("  {name} contains {}", report.matched_allergens.join(", "));
    }
}

pub fn order(order: &Order) {
    println!(
        "Order #{}: {} / payment {} ({})  total {}",
        order.id, order.status, order.payment_status, order.payment_method, order.total
    );
    for item in &order.items {
        let name = item.product_name.as_deref().unwrap_or("item");
        println!("  {name} x{} @ {}", item.quantity, item.price);
    }
    if let Some(tracking) = &order.tracking_number {
        println!("  tracking number {tracking}");
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
        return;
    }
    for order in orders {
        let placed = order
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "#{:<6} {:<10} {:<10} {:>10} {placed}",
            order.id, order.status, order.payment_status, order.total
        );
    }
}

pub fn tracking(tracking: &OrderTracking) {
    println!("Order #{}: {}", tracking.order_id, tracking.status);
    if let Some(number) = &tracking.tracking_number {
        println!("Tracking number: {number}");
    }
    for event in &tracking.events {
        let at = event
            .timestamp
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {at:<16} {:<10} {}",
            event.status,
            event.description.as_deref().unwrap_or("")
        );
    }
}

pub fn payment(payment: &PaymentSession) {
    println!(
        "Payment {} for order #{}: {}",
        payment.reference, payment.order_id, payment.status
    );
    if let Some(url) = &payment.payment_url {
        println!("Complete payment at {url}");
    }
}

pub fn users(users: &[SocialUser]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    for user in users {
        let following = if user.is_following { "  (following)" } else { "" };
        println!(
            "#{:<5} @{:<20} {} followers{following}",
            user.id, user.username, user.followers_count
        );
    }
}

pub fn conversations(conversations: &[Conversation]) {
    for conversation in conversations {
        let who = conversation
            .participants
            .iter()
            .map(|user| format!("@{}", user.username))
            .collect::<Vec<_>>()
            .join(", ");
        let unread = match conversation.unread_count {
            0 => String::new(),
            n => format!("  ({n} unread)"),
        };
        println!("[{}] {who}{unread}", conversation.id);
    }
}

pub fn messages(messages: &[Message]) {
    for message in messages {
        let at = message
            .created_at
            .map(|at| at.format("%H:%M").to_string())
            .unwrap_or_default();
        println!("{at:>5} @{}: {}", message.sender.username, message.content);
        if let Some(product) = &message.shared_product {
            println!("      shared #{} {} ({})", product.id, product.name, product.price);
        }
    }
}

pub fn notifications(notifications: &[Notification], unread: u32) {
    println!("{unread} unread");
    for notification in notifications {
        let marker = if notification.is_read { ' ' } else { '*' };
        println!(
            "{marker} [{}] {}: {}",
            notification.id, notification.kind, notification.message
        );
    }
}

pub fn dashboard(stats: &DashboardStats) {
    println!("Orders:    {} ({} pending)", stats.total_orders, stats.pending_orders);
    println!("Revenue:   {}", stats.total_revenue);
    println!("Users:     {}", stats.total_users);
    println!(
        "Products:  {} ({} low on stock)",
        stats.total_products, stats.low_stock_products
    );
}

pub fn banners(banners: &[Banner]) {
    for banner in banners {
        let state = if banner.is_active { "active" } else { "hidden" };
        println!(
            "[{}] {} {} -> {} ({state})",
            banner.id,
            banner.title.as_deref().unwrap_or("(untitled)"),
            banner.image,
            banner.link.as_deref().unwrap_or("-"),
        );
    }
}
