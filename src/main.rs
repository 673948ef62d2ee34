use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use storefront_core::auth::{AuthService, AuthToken};
use storefront_core::cli::{self, AuthCommands, CartCommands, Cli, Commands, OrderCommands, ProductCommands};
use storefront_core::config::Config;
use storefront_core::gateway::ApiGateway;
use storefront_core::services::products::ProductQuery;
use storefront_core::services::{CartService, OrderService, ProductService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let token = AuthToken::new(config.auth_token.clone());
    let gateway = ApiGateway::with_timeout(
        config.api_base_url.clone(),
        token.clone(),
        config.http_timeout(),
    );

    match cli.command {
        Commands::Auth(command) => {
            let auth = AuthService::new(gateway, token.clone());
            match command {
                AuthCommands::Login { email, password } => {
                    cli::handle_auth_login(&auth, &token, &email, &password).await?;
                }
                AuthCommands::Register { email, password } => {
                    cli::handle_auth_register(&auth, &token, &email, &password).await?;
                }
                AuthCommands::Logout => cli::handle_auth_logout(&auth).await?,
                AuthCommands::Me => cli::handle_auth_me(&auth).await?,
            }
        }
        Commands::Products(command) => {
            let products = ProductService::new(gateway);
            match command {
                ProductCommands::List {
                    page,
                    limit,
                    category,
                    search,
                } => {
                    let query = ProductQuery {
                        page,
                        limit,
                        category,
                        search,
                    };
                    cli::handle_products_list(&products, query).await?;
                }
                ProductCommands::Show { product_id } => {
                    cli::handle_products_show(&products, &product_id).await?;
                }
            }
        }
        Commands::Cart(command) => {
            let mut cart = CartService::new(gateway);
            match command {
                CartCommands::Show => cli::handle_cart_show(&mut cart).await?,
                CartCommands::Add {
                    product_id,
                    quantity,
                } => cli::handle_cart_add(&mut cart, &product_id, quantity).await?,
                CartCommands::Set {
                    product_id,
                    quantity,
                } => cli::handle_cart_set(&mut cart, &product_id, quantity).await?,
                CartCommands::Remove { product_id } => {
                    cli::handle_cart_remove(&mut cart, &product_id).await?;
                }
                CartCommands::Clear => cli::handle_cart_clear(&mut cart).await?,
            }
        }
        Commands::Orders(command) => {
            let orders = OrderService::new(gateway);
            match command {
                OrderCommands::List => cli::handle_orders_list(&orders).await?,
                OrderCommands::Show { order_id } => {
                    cli::handle_orders_show(&orders, &order_id).await?;
                }
                OrderCommands::Checkout => cli::handle_orders_checkout(&orders).await?,
                OrderCommands::Pay { order_id } => {
                    cli::handle_orders_pay(&orders, &order_id).await?;
                }
                OrderCommands::Callback { query } => {
                    cli::handle_orders_callback(orders, &config, &query).await?;
                }
            }
        }
        Commands::Config => cli::handle_config_show(&config)?,
    }

    Ok(())
}
