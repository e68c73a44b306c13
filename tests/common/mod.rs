#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use backyard_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{
        commerce::{
            AddressType, CategoryModel, CustomerModel, DiscountType, MaintenanceLevel,
            MaterialModel, PromotionModel,
        },
        InventoryModel, ProductModel, WarehouseModel,
    },
    events,
    handlers::common::{CUSTOMER_ID_HEADER, SESSION_KEY_HEADER},
    services::{
        commerce::{
            customer_service::{AddAddressInput, CreateCustomerInput},
            product_catalog_service::{CreateCategoryInput, CreateMaterialInput, CreateProductInput},
        },
        inventory::{CreateInventoryInput, CreateWarehouseInput},
        promotions::CreatePromotionInput,
    },
    AppState,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Who a test request claims to be
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    Customer(Uuid),
    Session(String),
}

/// Application state and router over a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub category: CategoryModel,
    pub material: MaterialModel,
    pub warehouse: WarehouseModel,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Fresh database with one category, one material and one warehouse.
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::sqlite_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        let (event_sender, event_rx) = events::channel(1024);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = backyard_api::app_router(state.clone());

        let catalog = state.services.product_catalog.clone();
        let category = catalog
            .create_category(CreateCategoryInput {
                name: "Patio Chairs".to_string(),
                slug: None,
                description: None,
                parent_id: None,
                image_url: None,
                is_active: Some(true),
            })
            .await
            .expect("seed category");
        let material = catalog
            .create_material(CreateMaterialInput {
                name: "Teak".to_string(),
                description: None,
                weather_resistance_rating: 9,
                maintenance_level: MaintenanceLevel::Medium,
                is_eco_friendly: Some(true),
            })
            .await
            .expect("seed material");
        let warehouse = state
            .services
            .inventory
            .create_warehouse(CreateWarehouseInput {
                name: "Main Warehouse".to_string(),
                address_id: None,
                phone: None,
                email: None,
                manager: None,
                is_active: Some(true),
            })
            .await
            .expect("seed warehouse");

        Self {
            router,
            state,
            category,
            material,
            warehouse,
            _event_task: event_task,
        }
    }

    /// Send a request against the router as `caller`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        caller: &Caller,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        match caller {
            Caller::Anonymous => {}
            Caller::Customer(id) => builder = builder.header(CUSTOMER_ID_HEADER, id.to_string()),
            Caller::Session(key) => builder = builder.header(SESSION_KEY_HEADER, key.as_str()),
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request whose JSON body is returned with the status.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        caller: &Caller,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, caller).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    /// Active product with `stock` units in the main warehouse.
    pub async fn seed_product(&self, name: &str, sku: &str, price: Decimal, stock: i32) -> ProductModel {
        let product = self
            .seed_product_with(CreateProductInput {
                name: name.to_string(),
                slug: None,
                description: Some(format!("{} for the garden", name)),
                category_id: self.category.id,
                material_id: self.material.id,
                price,
                sale_price: None,
                weight: None,
                width: None,
                height: None,
                depth: None,
                assembly_required: None,
                weather_resistant: Some(true),
                sku: sku.to_string(),
                is_active: Some(true),
                featured: None,
                warranty_months: None,
            })
            .await;
        self.stock(&product, &self.warehouse, stock).await;
        product
    }

    pub async fn seed_product_with(&self, input: CreateProductInput) -> ProductModel {
        self.state
            .services
            .product_catalog
            .create_product(input)
            .await
            .expect("seed product")
    }

    pub async fn stock(&self, product: &ProductModel, warehouse: &WarehouseModel, quantity: i32) -> InventoryModel {
        self.state
            .services
            .inventory
            .create_inventory(CreateInventoryInput {
                product_id: product.id,
                warehouse_id: warehouse.id,
                quantity,
                reserved_quantity: None,
                reorder_point: None,
            })
            .await
            .expect("seed inventory")
            .inventory
    }

    /// Customer with one default address; returns the address id too.
    pub async fn seed_customer(&self, email: &str) -> (CustomerModel, Uuid) {
        let customers = &self.state.services.customer;
        let customer = customers
            .create_customer(CreateCustomerInput {
                email: email.to_string(),
                first_name: "Sam".to_string(),
                last_name: "Gardner".to_string(),
                phone: None,
                birth_date: None,
                is_subscribed_to_newsletter: None,
                notes: None,
            })
            .await
            .expect("seed customer");
        let address = customers
            .add_address(
                customer.id,
                AddAddressInput {
                    line1: "1 Orchard Way".to_string(),
                    line2: None,
                    city: "Springfield".to_string(),
                    state: "IL".to_string(),
                    postal_code: "62701".to_string(),
                    country: "US".to_string(),
                    address_type: AddressType::Both,
                    is_default: true,
                },
            )
            .await
            .expect("seed address");
        (customer, address.address.id)
    }

    /// Promotion valid from yesterday until next month.
    pub async fn seed_promotion(
        &self,
        name: &str,
        discount_type: DiscountType,
        value: Decimal,
        minimum: Decimal,
        code: Option<&str>,
        usage_limit: Option<i32>,
    ) -> PromotionModel {
        let now = Utc::now();
        self.state
            .services
            .promotions
            .create_promotion(CreatePromotionInput {
                name: name.to_string(),
                description: None,
                discount_type,
                discount_value: value,
                code: code.map(str::to_string),
                start_date: now - Duration::days(1),
                end_date: now + Duration::days(30),
                is_active: Some(true),
                minimum_order_value: Some(minimum),
                usage_limit,
            })
            .await
            .expect("seed promotion")
    }

    pub async fn inventory_row(&self, inventory_id: Uuid) -> Value {
        let (status, body) = self
            .call(
                Method::GET,
                &format!("/api/v1/admin/inventory/{}", inventory_id),
                None,
                &Caller::Anonymous,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body bytes")
        .to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}

/// Decimal from a JSON money field, whether it arrived as a string or a number.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a money value: {}", other),
    }
}
