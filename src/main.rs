use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use logistics_core::audit::StoreAuditSink;
use logistics_core::cache::{CacheAside, CacheBackend, RedisBackend};
use logistics_core::config::Config;
use logistics_core::distance::{GoogleMapsService, LatLng};
use logistics_core::domain::order::models::{
    Address, DropDraft, OrderDraft, PricingMode, VehicleType,
};
use logistics_core::domain::pricing::{DriverPaymentCalculator, PricingEngine};
use logistics_core::orders::{OrderService, PostgresSequence};
use logistics_core::store::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging with environment-based filtering.
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,logistics_core=debug")),
        )
        .init();

    tracing::info!("Starting logistics-core demo");

    let config = Config::from_env();

    // === 1. Persistent store (shared pool, one per process) ===
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PostgresStore::new(pool.clone()));

    // === 2. Cache backend: optional, the system runs uncached without it ===
    let backend: Option<Arc<dyn CacheBackend>> = match &config.redis_url {
        Some(url) => match RedisBackend::connect(url).await {
            Ok(backend) => Some(Arc::new(backend)),
            Err(err) => {
                tracing::warn!(error = %err, "Redis unavailable, running without cache");
                None
            }
        },
        None => {
            tracing::info!("No REDIS_URL configured, running without cache");
            None
        }
    };
    let cache = Arc::new(CacheAside::new(backend).with_namespace(config.cache_namespace.clone()));

    // === 3. Distance collaborator ===
    let maps = Arc::new(GoogleMapsService::new(
        config.google_maps_api_key.clone().unwrap_or_default(),
    ));

    // === 4. Wire the order service ===
    let pricing = PricingEngine::new(store.clone(), maps);
    let service = OrderService::new(
        store.clone(),
        pricing,
        Arc::new(PostgresSequence::new(pool)),
        Arc::new(StoreAuditSink::new(store)),
        cache.clone(),
    );

    // === 5. Create a demo order and read it back through the cache ===
    let customer_id = Uuid::new_v4();
    let draft = OrderDraft {
        company_id: None,
        vehicle_type: VehicleType::Small,
        pricing_mode: PricingMode::DistanceBased,
        pickup: Address {
            line: "Warehouse 4, Port Rd".to_string(),
            location: LatLng { lat: 13.7563, lng: 100.5018 },
        },
        drops: vec![DropDraft {
            recipient_name: "K. Recipient".to_string(),
            recipient_phone: "+66812345678".to_string(),
            address: Address {
                line: "88 Sukhumvit Rd".to_string(),
                location: LatLng { lat: 13.7367, lng: 100.5600 },
            },
            delivery_instructions: Some("Call on arrival".to_string()),
        }],
        items: vec![],
        payment_method: Some("cash".to_string()),
        scheduled_pickup_time: None,
    };

    let created = service.create_order(draft, customer_id).await?;
    tracing::info!(
        order_number = %created.order.order_number,
        total_price = %created.order.total_price,
        "✅ Order created"
    );

    let first = service.get_order(created.order.id).await?;
    let second = service.get_order(created.order.id).await?;
    tracing::info!(
        first_from_cache = first.from_cache,
        second_from_cache = second.from_cache,
        "Order detail read twice"
    );

    // === 6. Driver payout preview for the gross order value ===
    let calculator = DriverPaymentCalculator::new(config.payment_rates);
    let payout = calculator.compute_net_payment(created.order.total_price);
    tracing::info!(
        gross = %payout.gross_amount,
        commission = %payout.commission,
        insurance = %payout.insurance,
        withholding_tax = %payout.withholding_tax,
        net = %payout.net_amount,
        "Driver payout breakdown"
    );

    Ok(())
}
