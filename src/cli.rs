use clap::{Parser, Subcommand};

use crate::auth::{AuthService, AuthToken};
use crate::config::Config;
use crate::services::poller::{PaymentCallback, PollerEvent, StatusPoller};
use crate::services::products::ProductQuery;
use crate::services::{CartService, OrderService, ProductService};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront API client - cart, orders and payment reconciliation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Session commands
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Catalog browsing
    #[command(subcommand)]
    Products(ProductCommands),

    /// Cart management
    #[command(subcommand)]
    Cart(CartCommands),

    /// Order management
    #[command(subcommand)]
    Orders(OrderCommands),

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Log in and print the session token
    Login {
        email: String,
        password: String,
    },

    /// Register a new account and log in
    Register {
        email: String,
        password: String,
    },

    /// End the current session (best effort on the server side)
    Logout,

    /// Show the currently authenticated user
    Me,
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List catalog products
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one product
    Show {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,
    },
}

#[derive(Subcommand)]
pub enum CartCommands {
    /// Show the current cart
    Show,

    /// Add a product to the cart
    Add {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },

    /// Set the quantity of a cart line (0 removes it)
    Set {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,
        quantity: i64,
    },

    /// Remove a cart line
    Remove {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,
    },

    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// List your orders
    List,

    /// Show one order
    Show {
        #[arg(value_name = "ORDER_ID")]
        order_id: String,
    },

    /// Create an order from the current cart
    Checkout,

    /// Request a payment URL for an order
    Pay {
        #[arg(value_name = "ORDER_ID")]
        order_id: String,
    },

    /// Process a payment-provider redirect callback (its query string) and
    /// poll the order until the payment is confirmed
    Callback {
        #[arg(value_name = "QUERY_STRING")]
        query: String,
    },
}

pub async fn handle_auth_login(
    auth: &AuthService,
    token: &AuthToken,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let user = auth.login(email, password).await?;
    println!("✓ Logged in as {}", user.email);
    if let Some(token) = token.get() {
        println!("  export STOREFRONT_AUTH_TOKEN={token}");
    }
    Ok(())
}

pub async fn handle_auth_register(
    auth: &AuthService,
    token: &AuthToken,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let user = auth.register(email, password).await?;
    println!("✓ Registered {}", user.email);
    if let Some(token) = token.get() {
        println!("  export STOREFRONT_AUTH_TOKEN={token}");
    }
    Ok(())
}

pub async fn handle_auth_logout(auth: &AuthService) -> anyhow::Result<()> {
    auth.logout().await;
    println!("✓ Logged out");
    Ok(())
}

pub async fn handle_auth_me(auth: &AuthService) -> anyhow::Result<()> {
    let user = auth.me().await?;
    println!("{} <{}>", user.id, user.email);
    if let Some(role) = user.role {
        println!("  role: {role}");
    }
    Ok(())
}

pub async fn handle_products_list(
    products: &ProductService,
    query: ProductQuery,
) -> anyhow::Result<()> {
    let page = products.list(&query).await?;

    if page.data.is_empty() {
        println!("No products found");
        return Ok(());
    }

    for product in &page.data {
        let stock = match product.in_stock {
            Some(false) => " (out of stock)",
            _ => "",
        };
        println!("{}  {}  ${}{}", product.id, product.name, product.price, stock);
    }
    if let Some(meta) = page.meta {
        if let (Some(page_no), Some(total_pages)) = (meta.page, meta.total_pages) {
            println!("page {page_no}/{total_pages}");
        }
    }
    Ok(())
}

pub async fn handle_products_show(
    products: &ProductService,
    product_id: &str,
) -> anyhow::Result<()> {
    let product = products.get(product_id).await?;
    println!("{}  ${}", product.name, product.price);
    if let Some(category) = product.category {
        println!("  category: {category}");
    }
    if let Some(description) = product.description {
        println!("  {description}");
    }
    Ok(())
}

pub async fn handle_cart_show(cart: &mut CartService) -> anyhow::Result<()> {
    cart.refresh().await?;

    let state = match cart.server_cart() {
        Some(state) if !state.items.is_empty() => state,
        _ => {
            println!("Your cart is empty");
            return Ok(());
        }
    };

    for line in &state.items {
        let lock = if line.mutable_product_id().is_none() {
            " (display only)"
        } else {
            ""
        };
        println!(
            "{}  x{}  ${}{}",
            line.product.name, line.quantity, line.subtotal, lock
        );
    }
    println!("{} items, total ${}", cart.total_count(), state.total_amount);
    Ok(())
}

pub async fn handle_cart_add(
    cart: &mut CartService,
    product_id: &str,
    quantity: u32,
) -> anyhow::Result<()> {
    cart.add(product_id, quantity).await?;
    println!("✓ Added {product_id} x{quantity}");
    Ok(())
}

pub async fn handle_cart_set(
    cart: &mut CartService,
    product_id: &str,
    quantity: i64,
) -> anyhow::Result<()> {
    cart.refresh().await?;
    cart.commit_quantity(product_id, quantity).await?;
    println!("✓ Cart updated");
    Ok(())
}

pub async fn handle_cart_remove(cart: &mut CartService, product_id: &str) -> anyhow::Result<()> {
    cart.refresh().await?;
    cart.remove(product_id).await?;
    println!("✓ Item removed");
    Ok(())
}

pub async fn handle_cart_clear(cart: &mut CartService) -> anyhow::Result<()> {
    cart.clear().await?;
    println!("✓ Cart cleared");
    Ok(())
}

pub async fn handle_orders_list(orders: &OrderService) -> anyhow::Result<()> {
    let records = orders.list().await?;

    if records.is_empty() {
        println!("No orders yet");
        return Ok(());
    }

    for order in records {
        println!(
            "{}  {}  ${}  ({} items)",
            order.id,
            order.status.as_str(),
            order.total_amount,
            order.items.len()
        );
    }
    Ok(())
}

pub async fn handle_orders_show(orders: &OrderService, order_id: &str) -> anyhow::Result<()> {
    let order = orders.get(order_id).await?;
    println!("Order {}  [{}]", order.id, order.status.as_str());
    for item in &order.items {
        println!("  {}  x{}  ${}", item.name, item.quantity, item.subtotal);
    }
    println!("Total: ${}", order.total_amount);
    Ok(())
}

pub async fn handle_orders_checkout(orders: &OrderService) -> anyhow::Result<()> {
    let order = orders.checkout().await?;
    println!("✓ Order {} placed, total ${}", order.id, order.total_amount);
    Ok(())
}

pub async fn handle_orders_pay(orders: &OrderService, order_id: &str) -> anyhow::Result<()> {
    let session = orders.request_payment(order_id).await?;
    if let Some(url) = session.payment_url {
        println!("Open the payment page to continue:");
        println!("  {url}");
    }
    Ok(())
}

pub async fn handle_orders_callback(
    orders: OrderService,
    config: &Config,
    query: &str,
) -> anyhow::Result<()> {
    let Some(callback) = PaymentCallback::from_query(query) else {
        anyhow::bail!("not a payment callback: missing code, status or orderId");
    };

    let order_id = callback.order_id.clone();
    let mut poller = StatusPoller::new(orders, config.poller());
    let Some(mut events) = poller.activate(callback) else {
        anyhow::bail!("a poll is already active for this callback");
    };

    while let Some(event) = events.recv().await {
        match event {
            PollerEvent::PaymentConfirmed => println!("✓ Payment confirmed for order {order_id}"),
            PollerEvent::PaymentCancelled => println!("Payment was cancelled"),
            PollerEvent::StillProcessing => {
                println!("Payment still processing; check the order again later")
            }
            PollerEvent::Navigate(path) => {
                println!("→ {path}");
                break;
            }
        }
    }
    Ok(())
}

pub fn handle_config_show(config: &Config) -> anyhow::Result<()> {
    println!("Configuration:");
    println!("  API base URL: {}", config.api_base_url);
    println!(
        "  Auth token: {}",
        match &config.auth_token {
            Some(_) => "set (masked)",
            None => "not set",
        }
    );
    println!("  Poll interval: {}ms", config.poll_interval_ms);
    println!("  Poll attempts: {}", config.poll_max_attempts);
    println!("  Redirect delay: {}ms", config.redirect_delay_ms);
    println!("  HTTP timeout: {}s", config.http_timeout_secs);
    Ok(())
}
