use anyhow::{Context, Result};
use cli::{Cli, Commands};
use common::{MarketState, Price, Side};
use config::{generate_default_config, load_config, save_config, validate_config, ExchangeConfig};
use market_data::{
    CancelMessage, Direction, EventHub, FillMessage, MarketObserver, MarketSnapshot,
};
use matching_engine::ProductRegistry;
use observability::{init_logging, LogFormat};
use session::SessionManager;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start { config } => start_exchange(config),
        Commands::Validate { config } => validate_command(config),
        Commands::Init { output } => init_command(output),
    }
}

fn start_exchange<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_config(&config_path)?;
    let format: LogFormat = config
        .logging
        .format
        .parse()
        .map_err(|message: String| anyhow::anyhow!(message))?;
    init_logging("equex", format)?;

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!("Configuration warning: {}", warning);
    }
    if !report.is_valid() {
        for problem in &report.errors {
            error!("Configuration error: {}", problem);
        }
        anyhow::bail!("Cannot start exchange due to configuration errors");
    }

    info!(name = %config.exchange.name, version = %config.exchange.version, "Exchange starting");

    let hub = Arc::new(EventHub::new());
    let registry = Arc::new(ProductRegistry::new(hub.clone(), config.engine.clone()));
    let sessions = SessionManager::new(registry.clone(), hub);
    for product in &config.products {
        registry.create_product(product)?;
    }

    run_demo_session(&registry, &sessions, &config)?;
    info!("Exchange shut down");
    Ok(())
}

/// Walk one full market session so every part of the engine is exercised:
/// PREOPEN staging, the opening cross, continuous trading, cancels,
/// queries and the close.
fn run_demo_session(
    registry: &ProductRegistry,
    sessions: &SessionManager,
    config: &ExchangeConfig,
) -> Result<()> {
    let Some(product) = config.products.first().map(String::as_str) else {
        warn!("No products configured; nothing to trade");
        return Ok(());
    };

    let ann = Arc::new(ConsoleObserver::new("ANN"));
    let bob = Arc::new(ConsoleObserver::new("BOB"));
    let ann_conn = sessions.connect(ann)?;
    let bob_conn = sessions.connect(bob)?;
    for (user, conn) in [("ANN", ann_conn), ("BOB", bob_conn)] {
        sessions.subscribe_current_market(user, conn, product)?;
        sessions.subscribe_last_sale(user, conn, product)?;
        sessions.subscribe_ticker(user, conn, product)?;
        sessions.subscribe_messages(user, conn, product)?;
    }

    registry.set_market_state(MarketState::Preopen)?;
    sessions.submit_quote(
        "ANN",
        ann_conn,
        product,
        Price::limit(1000),
        100,
        Price::limit(1010),
        100,
    )?;
    registry.set_market_state(MarketState::Open)?;

    // A crossing limit order, then a market order that exhausts the offer
    // and has its remainder cancelled.
    sessions.submit_order("BOB", bob_conn, product, Price::limit(1010), 60, Side::Buy)?;
    sessions.submit_order("BOB", bob_conn, product, Price::market(), 80, Side::Buy)?;

    let resting = sessions.submit_order(
        "BOB",
        bob_conn,
        product,
        Price::limit(995),
        25,
        Side::Buy,
    )?;

    let (buy_depth, sell_depth) = sessions.get_book_depth("BOB", bob_conn, product)?;
    println!("{product} book depth:");
    println!("  BUY:  {}", buy_depth.join(", "));
    println!("  SELL: {}", sell_depth.join(", "));
    for snapshot in sessions.get_orders_with_remaining_qty("BOB", bob_conn, product)? {
        println!("  open: {snapshot}");
    }
    println!(
        "products: {}",
        sessions.get_products("BOB", bob_conn)?.join(", ")
    );

    sessions.submit_order_cancel("BOB", bob_conn, product, Side::Buy, &resting)?;
    registry.set_market_state(MarketState::Closed)?;

    sessions.disconnect("ANN", ann_conn)?;
    sessions.disconnect("BOB", bob_conn)?;
    Ok(())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    init_logging("equex", LogFormat::default())?;
    let config = load_config(&config_path)?;
    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");
    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
        println!();
    }
    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for problem in &report.errors {
            println!("  - {}", problem);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("Configuration is valid");
    println!();
    println!("Exchange: {}", config.exchange.name);
    println!("Version: {}", config.exchange.version);
    println!("Products: {}", config.products.len());
    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    init_logging("equex", LogFormat::default())?;
    let output_path = output_path.as_ref();
    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    save_config(&config, output_path)?;

    println!("Configuration file created at {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit the file to name your exchange and list its products");
    println!("  2. Run 'equex validate --config {:?}'", output_path);
    println!("  3. Run 'equex start --config {:?}'", output_path);
    Ok(())
}

/// Observer that prints every delivered event to stdout
struct ConsoleObserver {
    user: String,
}

impl ConsoleObserver {
    fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }
}

impl MarketObserver for ConsoleObserver {
    fn user_name(&self) -> &str {
        &self.user
    }

    fn current_market(&self, snapshot: &MarketSnapshot) {
        println!("[{}] current market: {snapshot}", self.user);
    }

    fn last_sale(&self, product: &str, price: Price, volume: u32) {
        println!("[{}] last sale: {product} {volume}@{price}", self.user);
    }

    fn ticker(&self, product: &str, price: Price, direction: Direction) {
        println!("[{}] ticker: {product} {price} {direction}", self.user);
    }

    fn fill(&self, fill: &FillMessage) {
        println!("[{}] fill: {fill}", self.user);
    }

    fn cancel(&self, cancel: &CancelMessage) {
        println!("[{}] cancel: {cancel}", self.user);
    }

    fn market_state(&self, state: MarketState) {
        println!("[{}] market is now {state}", self.user);
    }
}
