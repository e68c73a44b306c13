//! Seed data script - populates the database with a demo furniture catalog
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://backyard.db?mode=rwc
//!
//! This creates:
//! - 3 categories and 3 materials
//! - 6 products with images
//! - 2 warehouses with stock for every product
//! - 1 customer with a default address
//! - 1 site-wide promotion

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use backyard_api::{
    db::{self, DbConfig},
    entities::commerce::{AddressType, DiscountType, MaintenanceLevel},
    events,
    services::{
        commerce::{
            customer_service::{AddAddressInput, CreateCustomerInput},
            product_catalog_service::{
                AddImageInput, CreateCategoryInput, CreateMaterialInput, CreateProductInput,
            },
        },
        inventory::{CreateInventoryInput, CreateWarehouseInput},
        promotions::CreatePromotionInput,
    },
    AppState,
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Seed a demo backyard furniture catalog", version)]
struct Cli {
    /// Database to seed; falls back to DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Skip running migrations before seeding
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,

    /// Units stocked per product per warehouse
    #[arg(long, default_value_t = 25)]
    stock: i32,
}

struct ProductSeed {
    name: &'static str,
    category: usize,
    material: usize,
    price: Decimal,
    sale_price: Option<Decimal>,
    sku: &'static str,
    featured: bool,
}

const PRODUCTS: &[ProductSeed] = &[
    ProductSeed {
        name: "Teak Adirondack Chair",
        category: 0,
        material: 0,
        price: dec!(349.00),
        sale_price: Some(dec!(299.00)),
        sku: "CHR-TEAK-001",
        featured: true,
    },
    ProductSeed {
        name: "Aluminum Bistro Chair",
        category: 0,
        material: 1,
        price: dec!(129.00),
        sale_price: None,
        sku: "CHR-ALU-002",
        featured: false,
    },
    ProductSeed {
        name: "Teak Dining Table",
        category: 1,
        material: 0,
        price: dec!(1199.00),
        sale_price: None,
        sku: "TBL-TEAK-001",
        featured: true,
    },
    ProductSeed {
        name: "Wicker Coffee Table",
        category: 1,
        material: 2,
        price: dec!(279.00),
        sale_price: Some(dec!(229.00)),
        sku: "TBL-WCK-002",
        featured: false,
    },
    ProductSeed {
        name: "Wicker Sectional Sofa",
        category: 2,
        material: 2,
        price: dec!(1899.00),
        sale_price: None,
        sku: "LNG-WCK-001",
        featured: true,
    },
    ProductSeed {
        name: "Aluminum Chaise Lounge",
        category: 2,
        material: 1,
        price: dec!(449.00),
        sale_price: None,
        sku: "LNG-ALU-002",
        featured: false,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://backyard.db?mode=rwc".to_string());

    info!("=== Backyard Furniture Seed Data ===");
    info!("Connecting to database: {}", database_url);
    let pool = db::establish_connection_with_config(&DbConfig {
        url: database_url,
        max_connections: 5,
        acquire_timeout: StdDuration::from_secs(10),
        ..Default::default()
    })
    .await
    .context("failed to connect to the database")?;

    if !cli.skip_migrations {
        db::run_migrations(&pool).await?;
    }

    let (event_sender, event_rx) = events::channel(256);
    let drain = tokio::spawn(events::process_events(event_rx));

    let config = backyard_api::config::load_config().unwrap_or_else(|_| {
        backyard_api::config::AppConfig::new(
            String::new(),
            "127.0.0.1".into(),
            8080,
            "development".into(),
        )
    });
    let state = AppState::new(Arc::new(pool), config, event_sender);
    seed(&state, cli.stock).await?;

    // Dropping the state closes the channel so the drain task finishes
    drop(state);
    let _ = drain.await;
    info!("Seeding complete");
    Ok(())
}

async fn seed(state: &AppState, stock: i32) -> anyhow::Result<()> {
    let catalog = &state.services.product_catalog;
    let inventory = &state.services.inventory;

    info!("Creating categories...");
    let mut categories = Vec::new();
    for (name, description) in [
        ("Chairs", "Dining, lounge and accent chairs"),
        ("Tables", "Dining, coffee and side tables"),
        ("Lounge", "Sofas, sectionals and chaises"),
    ] {
        categories.push(
            catalog
                .create_category(CreateCategoryInput {
                    name: name.into(),
                    slug: None,
                    description: Some(description.into()),
                    parent_id: None,
                    image_url: None,
                    is_active: Some(true),
                })
                .await?,
        );
    }

    info!("Creating materials...");
    let mut materials = Vec::new();
    for (name, rating, level, eco) in [
        ("Teak", 9, MaintenanceLevel::Medium, true),
        ("Powder-coated Aluminum", 8, MaintenanceLevel::Low, false),
        ("All-weather Wicker", 7, MaintenanceLevel::Low, false),
    ] {
        materials.push(
            catalog
                .create_material(CreateMaterialInput {
                    name: name.into(),
                    description: None,
                    weather_resistance_rating: rating,
                    maintenance_level: level,
                    is_eco_friendly: Some(eco),
                })
                .await?,
        );
    }

    info!("Creating warehouses...");
    let mut warehouses = Vec::new();
    for name in ["East Coast Warehouse", "West Coast Warehouse"] {
        warehouses.push(
            inventory
                .create_warehouse(CreateWarehouseInput {
                    name: name.into(),
                    address_id: None,
                    phone: None,
                    email: None,
                    manager: None,
                    is_active: Some(true),
                })
                .await?,
        );
    }

    info!("Creating products...");
    for seed in PRODUCTS {
        let product = catalog
            .create_product(CreateProductInput {
                name: seed.name.into(),
                slug: None,
                description: Some(format!("{} built for years outdoors.", seed.name)),
                category_id: categories[seed.category].id,
                material_id: materials[seed.material].id,
                price: seed.price,
                sale_price: seed.sale_price,
                weight: None,
                width: None,
                height: None,
                depth: None,
                assembly_required: Some(false),
                weather_resistant: Some(true),
                sku: seed.sku.into(),
                is_active: Some(true),
                featured: Some(seed.featured),
                warranty_months: Some(24),
            })
            .await?;

        catalog
            .add_image(
                product.id,
                AddImageInput {
                    image_url: format!("https://images.example.com/products/{}.jpg", product.slug),
                    alt_text: Some(product.name.clone()),
                    is_primary: true,
                    display_order: Some(0),
                },
            )
            .await?;

        for warehouse in &warehouses {
            inventory
                .create_inventory(CreateInventoryInput {
                    product_id: product.id,
                    warehouse_id: warehouse.id,
                    quantity: stock,
                    reserved_quantity: None,
                    reorder_point: None,
                })
                .await?;
        }
        info!("  {} ({})", product.name, product.sku);
    }

    info!("Creating demo customer...");
    let customer = state
        .services
        .customer
        .create_customer(CreateCustomerInput {
            email: "jordan@example.com".into(),
            first_name: "Jordan".into(),
            last_name: "Rivera".into(),
            phone: Some("555-0100".into()),
            birth_date: None,
            is_subscribed_to_newsletter: Some(true),
            notes: None,
        })
        .await?;
    state
        .services
        .customer
        .add_address(
            customer.id,
            AddAddressInput {
                line1: "12 Garden Lane".into(),
                line2: None,
                city: "Portland".into(),
                state: "OR".into(),
                postal_code: "97201".into(),
                country: "US".into(),
                address_type: AddressType::Both,
                is_default: true,
            },
        )
        .await?;
    info!("  Customer id: {}", customer.id);

    info!("Creating promotion...");
    let now = Utc::now();
    state
        .services
        .promotions
        .create_promotion(CreatePromotionInput {
            name: "Summer Patio Sale".into(),
            description: Some("10% off orders over $500".into()),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            code: Some("SUMMER10".into()),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(60),
            is_active: Some(true),
            minimum_order_value: Some(dec!(500)),
            usage_limit: None,
        })
        .await?;

    Ok(())
}
