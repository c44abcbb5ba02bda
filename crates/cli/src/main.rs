//! Dewdrop CLI - a command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password is read from stdin when -p is omitted)
//! dewdrop login -u glowgetter
//!
//! # Browse and shop
//! dewdrop products list --search "vitamin c"
//! dewdrop cart add 12 -q 2
//! dewdrop checkout --address "1 Dew Lane" --payment online
//!
//! # Admin dashboard
//! dewdrop admin set-status 40 shipped
//! ```
//!
//! # Environment Variables
//!
//! - `DEWDROP_API_BASE_URL` - Storefront API root
//! - `DEWDROP_TIMEOUT_SECS` - Per-request timeout
//! - `DEWDROP_SESSION_FILE` - Where the session is kept between runs
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Optional error reporting
//! - `RUST_LOG` - Log filter (default: `dewdrop_client=info,dewdrop_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dewdrop_client::{ApiClient, AuthEvent, ClientConfig, FileSessionStore};
use dewdrop_core::{
    BannerId, CartItemId, CategoryId, ConversationId, Money, NotificationId, OrderId, OrderStatus,
    PaymentMethod, ProductId, UserId,
};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "dewdrop")]
#[command(author, version, about = "Dewdrop skincare storefront CLI")]
struct Cli {
    /// Override `DEWDROP_API_BASE_URL`
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Declared allergen; repeat or comma-separate for several
        #[arg(long = "allergy", value_delimiter = ',')]
        allergies: Vec<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout(CheckoutArgs),
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Follow graph and sharing
    Social {
        #[command(subcommand)]
        action: SocialAction,
    },
    /// Direct messages
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
    /// Notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationsAction,
    },
    /// Admin dashboard
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        category: Option<CategoryId>,

        /// Ordering key, e.g. `price` or `-created_at`
        #[arg(short, long)]
        ordering: Option<String>,

        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one product with its reviews
    Show { id: ProductId },
    /// List categories
    Categories,
    /// Review a product
    Review {
        id: ProductId,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// Like a product
    Like { id: ProductId },
    /// Remove a like
    Unlike { id: ProductId },
    /// Products you liked
    Liked,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and totals
    Show,
    /// Add a product
    Add {
        product: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity (0 removes it)
    Update { item: CartItemId, quantity: u32 },
    /// Remove a line
    Remove { item: CartItemId },
    /// Empty the cart
    Clear,
}

#[derive(Args)]
struct CheckoutArgs {
    /// Shipping address
    #[arg(short, long)]
    address: String,

    #[arg(long)]
    phone: Option<String>,

    /// `cod` or `online`
    #[arg(long, default_value = "cod")]
    payment: PaymentMethod,

    #[arg(long)]
    notes: Option<String>,

    /// Place the order even if products match your allergies
    #[arg(long)]
    accept_allergens: bool,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Your orders
    List {
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// One order
    Show { id: OrderId },
    /// Cancel an order that has not shipped
    Cancel { id: OrderId },
    /// Delivery tracking
    Track { id: OrderId },
    /// Start paying for an order online
    Pay { id: OrderId },
    /// Confirm a payment with the gateway reference
    Verify { id: OrderId, reference: String },
}

#[derive(Subcommand)]
enum SocialAction {
    /// Follow a user
    Follow { user: UserId },
    /// Stop following a user
    Unfollow { user: UserId },
    /// Your followers
    Followers,
    /// Users you follow
    Following,
    /// Search users
    Search { query: String },
    /// Suggested users
    Suggestions,
    /// A user's profile
    Profile { username: String },
    /// Send a product into a conversation
    Share {
        product: ProductId,

        #[arg(long = "to")]
        conversation: ConversationId,

        #[arg(short, long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
enum ChatAction {
    /// Your conversations
    List,
    /// Open a conversation with a user
    Start { user: UserId },
    /// Show a conversation and mark it read
    Read { conversation: ConversationId },
    /// Send a message
    Send {
        conversation: ConversationId,
        content: String,
    },
}

#[derive(Subcommand)]
enum NotificationsAction {
    /// Your notifications
    List,
    /// Mark notifications read
    Read {
        /// Notification to mark
        id: Option<NotificationId>,

        /// Mark every notification read
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Dashboard numbers
    Stats,
    /// All orders
    Orders {
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Move an order to a new status
    SetStatus { order: OrderId, status: OrderStatus },
    /// Add a product
    AddProduct(ProductArgs),
    /// Edit a product
    EditProduct {
        id: ProductId,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    DeleteProduct { id: ProductId },
    /// Home page banners
    Banners,
    /// Upload a banner image
    UploadBanner {
        image: PathBuf,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        link: Option<String>,
    },
    /// Delete a banner
    DeleteBanner { id: BannerId },
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    brand: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    price: Option<Money>,

    #[arg(long)]
    stock: Option<u32>,

    #[arg(long)]
    category: Option<CategoryId>,

    #[arg(long)]
    ingredients: Option<String>,

    /// Product image file
    #[arg(long)]
    image: Option<PathBuf>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Must be initialized before the tracing subscriber
    let sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dewdrop_client=info,dewdrop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            sentry_guard
                .as_ref()
                .map(|_| sentry_tracing::layer().event_filter(sentry_event_filter)),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config.base_url = ClientConfig::new(api_url)?.base_url;
    }

    let store = Arc::new(FileSessionStore::new(&config.session_file));
    let client = ApiClient::new(&config, store)?;
    let mut events = client.subscribe();

    let result = dispatch(&client, cli.command).await;

    // Surface a forced sign-out however the command ended
    while let Ok(event) = events.try_recv() {
        if let AuthEvent::SessionEnded { reason } = event {
            output::session_ended(reason);
        }
    }
    result
}

async fn dispatch(client: &ApiClient, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Login { username, password } => {
            commands::account::login(client, &username, password).await?;
        }
        Commands::Register {
            username,
            email,
            password,
            allergies,
        } => commands::account::register(client, &username, &email, password, allergies).await?,
        Commands::Logout => commands::account::logout(client).await?,
        Commands::Whoami => commands::account::whoami(client)?,
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                ordering,
                page,
            } => {
                let filter = dewdrop_client::ProductFilter {
                    search,
                    category,
                    ordering,
                    page,
                };
                commands::shop::list_products(client, &filter).await?;
            }
            ProductsAction::Show { id } => commands::shop::show_product(client, id).await?,
            ProductsAction::Categories => commands::shop::categories(client).await?,
            ProductsAction::Review {
                id,
                rating,
                comment,
            } => commands::shop::review(client, id, rating, &comment).await?,
            ProductsAction::Like { id } => commands::shop::set_liked(client, id, true).await?,
            ProductsAction::Unlike { id } => commands::shop::set_liked(client, id, false).await?,
            ProductsAction::Liked => commands::shop::liked(client).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::shop::show_cart(client).await?,
            CartAction::Add { product, quantity } => {
                commands::shop::add_to_cart(client, product, quantity).await?;
            }
            CartAction::Update { item, quantity } => {
                commands::shop::update_cart(client, item, quantity).await?;
            }
            CartAction::Remove { item } => commands::shop::update_cart(client, item, 0).await?,
            CartAction::Clear => commands::shop::clear_cart(client).await?,
        },
        Commands::Checkout(args) => {
            let order = dewdrop_client::types::NewOrder {
                shipping_address: args.address,
                phone: args.phone,
                payment_method: args.payment,
                notes: args.notes,
            };
            commands::shop::checkout(client, &order, args.accept_allergens).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List { status } => commands::shop::list_orders(client, status).await?,
            OrdersAction::Show { id } => commands::shop::show_order(client, id).await?,
            OrdersAction::Cancel { id } => commands::shop::cancel_order(client, id).await?,
            OrdersAction::Track { id } => commands::shop::track_order(client, id).await?,
            OrdersAction::Pay { id } => commands::shop::pay(client, id).await?,
            OrdersAction::Verify { id, reference } => {
                commands::shop::verify_payment(client, id, &reference).await?;
            }
        },
        Commands::Social { action } => match action {
            SocialAction::Follow { user } => commands::social::follow(client, user, true).await?,
            SocialAction::Unfollow { user } => {
                commands::social::follow(client, user, false).await?;
            }
            SocialAction::Followers => commands::social::followers(client).await?,
            SocialAction::Following => commands::social::following(client).await?,
            SocialAction::Search { query } => commands::social::search(client, &query).await?,
            SocialAction::Suggestions => commands::social::suggestions(client).await?,
            SocialAction::Profile { username } => {
                commands::social::profile(client, &username).await?;
            }
            SocialAction::Share {
                product,
                conversation,
                note,
            } => commands::social::share(client, product, conversation, note.as_deref()).await?,
        },
        Commands::Chat { action } => match action {
            ChatAction::List => commands::social::conversations(client).await?,
            ChatAction::Start { user } => commands::social::start_conversation(client, user).await?,
            ChatAction::Read { conversation } => {
                commands::social::read_conversation(client, conversation).await?;
            }
            ChatAction::Send {
                conversation,
                content,
            } => commands::social::send(client, conversation, &content).await?,
        },
        Commands::Notifications { action } => match action {
            NotificationsAction::List => commands::social::notifications(client).await?,
            NotificationsAction::Read { id, all } => {
                commands::social::mark_notifications_read(client, id, all).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Stats => commands::admin::stats(client).await?,
            AdminAction::Orders { status } => commands::admin::orders(client, status).await?,
            AdminAction::SetStatus { order, status } => {
                commands::admin::set_status(client, order, status).await?;
            }
            AdminAction::AddProduct(fields) => {
                let image = fields.image.clone();
                commands::admin::add_product(client, &fields.into_draft(), image).await?;
            }
            AdminAction::EditProduct { id, fields } => {
                let image = fields.image.clone();
                commands::admin::edit_product(client, id, &fields.into_draft(), image).await?;
            }
            AdminAction::DeleteProduct { id } => commands::admin::delete_product(client, id).await?,
            AdminAction::Banners => commands::admin::banners(client).await?,
            AdminAction::UploadBanner { image, title, link } => {
                commands::admin::upload_banner(client, &image, title.as_deref(), link.as_deref())
                    .await?;
            }
            AdminAction::DeleteBanner { id } => commands::admin::delete_banner(client, id).await?,
        },
    }
    Ok(())
}

impl ProductArgs {
    fn into_draft(self) -> dewdrop_client::types::ProductDraft {
        dewdrop_client::types::ProductDraft {
            name: self.name,
            brand: self.brand,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            ingredients: self.ingredients,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_checkout() {
        let cli = Cli::try_parse_from([
            "dewdrop",
            "checkout",
            "--address",
            "1 Dew Lane",
            "--payment",
            "online",
            "--accept-allergens",
        ])
        .unwrap_or_else(|err| panic!("{err}"));

        let Commands::Checkout(args) = cli.command else {
            panic!("expected checkout");
        };
        assert_eq!(args.payment, PaymentMethod::Online);
        assert!(args.accept_allergens);
    }

    #[test]
    fn test_parses_comma_separated_allergies() {
        let cli = Cli::try_parse_from([
            "dewdrop",
            "register",
            "-u",
            "glowgetter",
            "-e",
            "glow@example.com",
            "--allergy",
            "fragrance,nuts",
            "--allergy",
            "parabens",
        ])
        .unwrap_or_else(|err| panic!("{err}"));

        let Commands::Register { allergies, .. } = cli.command else {
            panic!("expected register");
        };
        assert_eq!(allergies, vec!["fragrance", "nuts", "parabens"]);
    }
}
