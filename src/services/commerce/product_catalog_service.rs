use crate::{
    entities::{
        commerce::{
            category, material, product_image, product_review, product_variant, Category,
            CategoryModel, MaintenanceLevel, Material, MaterialModel, ProductImage,
            ProductImageModel, ProductReview, ProductReviewModel, ProductVariant,
            ProductVariantModel, PromotionModel,
        },
        order_item, product, OrderItem, Product, ProductModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        commerce::{review_service, wishlist_service::WishlistService},
        inventory::{InventoryFilter, InventoryService, InventoryView, WarehouseStock},
        promotions::PromotionService,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

const HOME_FEATURED_LIMIT: usize = 8;
const HOME_NEW_ARRIVALS_LIMIT: usize = 8;
const HOME_PROMOTION_LIMIT: usize = 3;
const RELATED_PRODUCT_LIMIT: usize = 4;

/// URL slug: lowercase ASCII alphanumerics, every other run collapsed to `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceLow,
    PriceHigh,
    Newest,
    /// Most ordered line items first
    Popular,
    /// Highest average rating first, unrated last
    Rating,
    #[default]
    #[serde(alias = "default")]
    Name,
}

/// Storefront shop filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopQuery {
    /// Category slug
    pub category: Option<String>,
    pub material: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<ProductSort>,
}

/// Staff product list filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<Uuid>,
    pub material: Option<Uuid>,
    pub sort: Option<ProductSort>,
}

/// Product with the bits a listing tile needs
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    #[serde(flatten)]
    pub product: ProductModel,
    pub effective_price: Decimal,
    pub on_sale: bool,
    pub primary_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopListing {
    pub products: Vec<ProductCard>,
    pub categories: Vec<CategoryModel>,
    pub materials: Vec<MaterialModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeFeed {
    pub featured_products: Vec<ProductCard>,
    pub new_arrivals: Vec<ProductCard>,
    pub promotions: Vec<PromotionModel>,
}

/// Storefront product page
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub effective_price: Decimal,
    pub images: Vec<ProductImageModel>,
    pub variants: Vec<ProductVariantModel>,
    pub inventory: Vec<WarehouseStock>,
    pub reviews: Vec<ProductReviewModel>,
    pub average_rating: Decimal,
    pub related_products: Vec<ProductCard>,
    pub in_wishlist: bool,
}

/// Staff product page
#[derive(Debug, Clone, Serialize)]
pub struct StaffProductDetail {
    pub product: ProductModel,
    pub images: Vec<ProductImageModel>,
    pub variants: Vec<ProductVariantModel>,
    pub inventory: Vec<InventoryView>,
    pub reviews: Vec<ProductReviewModel>,
    pub average_rating: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateMaterialInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub weather_resistance_rating: i32,
    pub maintenance_level: MaintenanceLevel,
    pub is_eco_friendly: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub material_id: Uuid,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub depth: Option<Decimal>,
    pub assembly_required: Option<bool>,
    pub weather_resistant: Option<bool>,
    #[validate(length(min = 1, max = 50))]
    pub sku: String,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    #[validate(range(min = 0))]
    pub warranty_months: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    /// Ends a sale; wins over `sale_price`
    #[serde(default)]
    pub clear_sale_price: bool,
    pub weight: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub depth: Option<Decimal>,
    pub assembly_required: Option<bool>,
    pub weather_resistant: Option<bool>,
    #[validate(length(min = 1, max = 50))]
    pub sku: Option<String>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    #[validate(range(min = 0))]
    pub warranty_months: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddImageInput {
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 200))]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddVariantInput {
    #[validate(length(min = 1, max = 50))]
    pub color: String,
    #[validate(length(max = 20))]
    pub color_code: Option<String>,
    pub price_adjustment: Option<Decimal>,
}

fn check_prices(price: Decimal, sale_price: Option<Decimal>) -> Result<(), ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price must be greater than zero".to_string(),
        ));
    }
    if let Some(sale) = sale_price {
        if sale <= Decimal::ZERO || sale >= price {
            return Err(ServiceError::ValidationError(
                "Sale price must be positive and lower than the regular price".to_string(),
            ));
        }
    }
    Ok(())
}

/// Sorts products in place. `order_counts` and `ratings` are only consulted
/// by the sorts that need them. Ties fall back to name order.
pub fn sort_products(
    products: &mut [ProductModel],
    sort: ProductSort,
    order_counts: &HashMap<Uuid, usize>,
    ratings: &HashMap<Uuid, Decimal>,
) {
    products.sort_by(|a, b| {
        let primary = match sort {
            ProductSort::PriceLow => a.price.cmp(&b.price),
            ProductSort::PriceHigh => b.price.cmp(&a.price),
            ProductSort::Newest => b.created_at.cmp(&a.created_at),
            ProductSort::Popular => {
                let count = |p: &ProductModel| order_counts.get(&p.id).copied().unwrap_or(0);
                count(b).cmp(&count(a))
            }
            ProductSort::Rating => {
                // None sorts below Some, so unrated products land last
                ratings.get(&b.id).cmp(&ratings.get(&a.id))
            }
            ProductSort::Name => std::cmp::Ordering::Equal,
        };
        primary.then_with(|| a.name.cmp(&b.name)).then(a.id.cmp(&b.id))
    });
}

/// Product catalog service for managing products, images and variants
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    inventory: InventoryService,
    promotions: PromotionService,
    wishlists: WishlistService,
}

impl ProductCatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        inventory: InventoryService,
        promotions: PromotionService,
        wishlists: WishlistService,
    ) -> Self {
        Self {
            db,
            event_sender,
            inventory,
            promotions,
            wishlists,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, input: CreateCategoryInput) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        if let Some(parent_id) = input.parent_id {
            Category::find_by_id(parent_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Category", parent_id))?;
        }

        let slug = slugify(input.slug.as_deref().unwrap_or(&input.name));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name must contain letters or digits".to_string(),
            ));
        }
        let taken = Category::find()
            .filter(category::Column::Slug.eq(slug.as_str()))
            .one(&*self.db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(format!("Category slug {} already exists", slug)));
        }

        let now = Utc::now();
        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description.unwrap_or_default()),
            parent_id: Set(input.parent_id),
            image_url: Set(input.image_url),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!("Created category {} ({})", category.name, category.id);
        Ok(category)
    }

    pub async fn list_categories(&self, active_only: bool) -> Result<Vec<CategoryModel>, ServiceError> {
        let mut query = Category::find();
        if active_only {
            query = query.filter(category::Column::IsActive.eq(true));
        }
        let mut categories = query.all(&*self.db).await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn create_material(&self, input: CreateMaterialInput) -> Result<MaterialModel, ServiceError> {
        input.validate()?;

        let now = Utc::now();
        let material = material::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description.unwrap_or_default()),
            weather_resistance_rating: Set(input.weather_resistance_rating),
            maintenance_level: Set(input.maintenance_level),
            is_eco_friendly: Set(input.is_eco_friendly.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!("Created material {} ({})", material.name, material.id);
        Ok(material)
    }

    pub async fn list_materials(&self) -> Result<Vec<MaterialModel>, ServiceError> {
        let mut materials = Material::find().all(&*self.db).await?;
        materials.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(materials)
    }

    /// Create a new product
    #[instrument(skip(self))]
    pub async fn create_product(&self, input: CreateProductInput) -> Result<ProductModel, ServiceError> {
        input.validate()?;
        check_prices(input.price, input.sale_price)?;

        let slug = slugify(input.slug.as_deref().unwrap_or(&input.name));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name must contain letters or digits".to_string(),
            ));
        }
        let sku = input.sku.trim().to_string();

        self.ensure_references(input.category_id, input.material_id).await?;
        self.ensure_unique_sku(&sku, None).await?;
        self.ensure_unique_slug(&slug, None).await?;

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description.unwrap_or_default()),
            category_id: Set(input.category_id),
            material_id: Set(input.material_id),
            price: Set(input.price),
            sale_price: Set(input.sale_price),
            weight: Set(input.weight.unwrap_or_default()),
            width: Set(input.width.unwrap_or_default()),
            height: Set(input.height.unwrap_or_default()),
            depth: Set(input.depth.unwrap_or_default()),
            assembly_required: Set(input.assembly_required.unwrap_or(false)),
            weather_resistant: Set(input.weather_resistant.unwrap_or(true)),
            sku: Set(sku),
            is_active: Set(input.is_active.unwrap_or(true)),
            featured: Set(input.featured.unwrap_or(false)),
            warranty_months: Set(input.warranty_months.unwrap_or(12)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;
        info!("Created product: {}", product.id);
        Ok(product)
    }

    /// Update an existing product
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        let product = self.get_product(product_id).await?;

        let price = input.price.unwrap_or(product.price);
        let sale_price = if input.clear_sale_price {
            None
        } else {
            input.sale_price.or(product.sale_price)
        };
        check_prices(price, sale_price)?;

        if let Some(sku) = &input.sku {
            self.ensure_unique_sku(sku.trim(), Some(product_id)).await?;
        }
        let slug = input.slug.as_deref().map(slugify);
        if let Some(slug) = &slug {
            self.ensure_unique_slug(slug, Some(product_id)).await?;
        }
        self.ensure_references(
            input.category_id.unwrap_or(product.category_id),
            input.material_id.unwrap_or(product.material_id),
        )
        .await?;

        let mut active: product::ActiveModel = product.into();
        active.price = Set(price);
        active.sale_price = Set(sale_price);

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(material_id) = input.material_id {
            active.material_id = Set(material_id);
        }
        if let Some(weight) = input.weight {
            active.weight = Set(weight);
        }
        if let Some(width) = input.width {
            active.width = Set(width);
        }
        if let Some(height) = input.height {
            active.height = Set(height);
        }
        if let Some(depth) = input.depth {
            active.depth = Set(depth);
        }
        if let Some(assembly_required) = input.assembly_required {
            active.assembly_required = Set(assembly_required);
        }
        if let Some(weather_resistant) = input.weather_resistant {
            active.weather_resistant = Set(weather_resistant);
        }
        if let Some(sku) = input.sku {
            active.sku = Set(sku.trim().to_string());
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(featured) = input.featured {
            active.featured = Set(featured);
        }
        if let Some(warranty_months) = input.warranty_months {
            active.warranty_months = Set(warranty_months);
        }

        active.updated_at = Set(Utc::now());

        let product = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;
        info!("Updated product: {}", product_id);
        Ok(product)
    }

    /// Takes a product off the storefront; the row itself stays.
    #[instrument(skip(self))]
    pub async fn deactivate_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        self.update_product(
            product_id,
            UpdateProductInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }

    /// Adds an image. A new primary image demotes the previous one.
    #[instrument(skip(self))]
    pub async fn add_image(
        &self,
        product_id: Uuid,
        input: AddImageInput,
    ) -> Result<ProductImageModel, ServiceError> {
        input.validate()?;
        self.get_product(product_id).await?;

        if input.is_primary {
            ProductImage::update_many()
                .col_expr(product_image::Column::IsPrimary, Expr::value(false))
                .filter(product_image::Column::ProductId.eq(product_id))
                .exec(&*self.db)
                .await?;
        }

        let display_order = match input.display_order {
            Some(order) => order,
            None => {
                ProductImage::find()
                    .filter(product_image::Column::ProductId.eq(product_id))
                    .count(&*self.db)
                    .await? as i32
            }
        };

        let image = product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            image_url: Set(input.image_url),
            alt_text: Set(input.alt_text.unwrap_or_default()),
            is_primary: Set(input.is_primary),
            display_order: Set(display_order),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!("Added image {} to product {}", image.id, product_id);
        Ok(image)
    }

    /// Create a product variant
    #[instrument(skip(self))]
    pub async fn add_variant(
        &self,
        product_id: Uuid,
        input: AddVariantInput,
    ) -> Result<ProductVariantModel, ServiceError> {
        input.validate()?;
        self.get_product(product_id).await?;

        let now = Utc::now();
        let variant = product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            color: Set(input.color),
            color_code: Set(input.color_code.unwrap_or_default()),
            price_adjustment: Set(input.price_adjustment.unwrap_or(Decimal::ZERO)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!("Created variant {} for product {}", variant.id, product_id);
        Ok(variant)
    }

    /// Storefront listing of active products
    #[instrument(skip(self))]
    pub async fn shop(&self, query: ShopQuery) -> Result<ShopListing, ServiceError> {
        let mut db_query = Product::find().filter(product::Column::IsActive.eq(true));

        if let Some(slug) = query.category.as_deref().filter(|s| !s.is_empty()) {
            let category = Category::find()
                .filter(category::Column::Slug.eq(slug))
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Category", slug))?;
            db_query = db_query.filter(product::Column::CategoryId.eq(category.id));
        }
        if let Some(material_id) = query.material {
            db_query = db_query.filter(product::Column::MaterialId.eq(material_id));
        }

        let mut products: Vec<ProductModel> = db_query
            .all(&*self.db)
            .await?
            .into_iter()
            .filter(|p| query.min_price.map_or(true, |min| p.price >= min))
            .filter(|p| query.max_price.map_or(true, |max| p.price <= max))
            .collect();

        self.apply_sort(&mut products, query.sort.unwrap_or_default())
            .await?;

        Ok(ShopListing {
            products: self.cards(products).await?,
            categories: self.list_categories(true).await?,
            materials: self.list_materials().await?,
        })
    }

    /// Staff product list over every product, active or not
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<ProductModel>, ServiceError> {
        let mut db_query = Product::find();

        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            let mut condition = Condition::any();
            for column in [
                product::Column::Name,
                product::Column::Description,
                product::Column::Sku,
            ] {
                condition = condition.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.as_str()));
            }
            db_query = db_query.filter(condition);
        }
        if let Some(category_id) = query.category {
            db_query = db_query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(material_id) = query.material {
            db_query = db_query.filter(product::Column::MaterialId.eq(material_id));
        }

        let mut products = db_query.all(&*self.db).await?;
        self.apply_sort(&mut products, query.sort.unwrap_or_default())
            .await?;
        Ok(products)
    }

    /// Storefront product page by slug; inactive products are not found.
    #[instrument(skip(self))]
    pub async fn product_detail(
        &self,
        slug: &str,
        customer_id: Option<Uuid>,
    ) -> Result<ProductDetail, ServiceError> {
        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", slug))?;

        let images = self.images(product.id).await?;
        let variants = self.variants(product.id).await?;
        let inventory = self.inventory.product_stock(product.id).await?;
        let reviews = self.reviews(product.id).await?;
        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();

        let mut related: Vec<ProductModel> = Product::find()
            .filter(product::Column::CategoryId.eq(product.category_id))
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Id.ne(product.id))
            .all(&*self.db)
            .await?;
        related.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        related.truncate(RELATED_PRODUCT_LIMIT);

        let in_wishlist = match customer_id {
            Some(customer_id) => self.wishlists.contains_product(customer_id, product.id).await?,
            None => false,
        };

        Ok(ProductDetail {
            effective_price: product.effective_price(),
            product,
            images,
            variants,
            inventory,
            average_rating: review_service::average_rating(&ratings),
            reviews,
            related_products: self.cards(related).await?,
            in_wishlist,
        })
    }

    #[instrument(skip(self))]
    pub async fn staff_product_detail(&self, product_id: Uuid) -> Result<StaffProductDetail, ServiceError> {
        let product = self.get_product(product_id).await?;
        let inventory = self
            .inventory
            .list_inventory(InventoryFilter {
                product_id: Some(product_id),
                ..Default::default()
            })
            .await?;
        let reviews = self.reviews(product_id).await?;
        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();

        Ok(StaffProductDetail {
            images: self.images(product_id).await?,
            variants: self.variants(product_id).await?,
            inventory,
            average_rating: review_service::average_rating(&ratings),
            reviews,
            product,
        })
    }

    /// Featured products, new arrivals and running promotions.
    #[instrument(skip(self))]
    pub async fn home_feed(&self) -> Result<HomeFeed, ServiceError> {
        let active = Product::find()
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        let mut featured: Vec<ProductModel> = active.iter().filter(|p| p.featured).cloned().collect();
        featured.sort_by(|a, b| a.name.cmp(&b.name));
        featured.truncate(HOME_FEATURED_LIMIT);

        let mut new_arrivals = active;
        new_arrivals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        new_arrivals.truncate(HOME_NEW_ARRIVALS_LIMIT);

        Ok(HomeFeed {
            featured_products: self.cards(featured).await?,
            new_arrivals: self.cards(new_arrivals).await?,
            promotions: self
                .promotions
                .current_promotions(Utc::now(), HOME_PROMOTION_LIMIT)
                .await?,
        })
    }

    async fn images(&self, product_id: Uuid) -> Result<Vec<ProductImageModel>, ServiceError> {
        let mut images = ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?;
        images.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.created_at.cmp(&b.created_at)));
        Ok(images)
    }

    async fn variants(&self, product_id: Uuid) -> Result<Vec<ProductVariantModel>, ServiceError> {
        let mut variants = ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?;
        variants.sort_by(|a, b| a.color.cmp(&b.color));
        Ok(variants)
    }

    async fn reviews(&self, product_id: Uuid) -> Result<Vec<ProductReviewModel>, ServiceError> {
        let mut reviews = ProductReview::find()
            .filter(product_review::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?;
        review_service::sort_newest_first(&mut reviews);
        Ok(reviews)
    }

    async fn apply_sort(&self, products: &mut [ProductModel], sort: ProductSort) -> Result<(), ServiceError> {
        let mut order_counts = HashMap::new();
        let mut ratings = HashMap::new();

        match sort {
            ProductSort::Popular => {
                let product_ids: Vec<Uuid> = OrderItem::find()
                    .select_only()
                    .column(order_item::Column::ProductId)
                    .into_tuple()
                    .all(&*self.db)
                    .await?;
                for id in product_ids {
                    *order_counts.entry(id).or_insert(0usize) += 1;
                }
            }
            ProductSort::Rating => {
                let rows: Vec<(Uuid, i32)> = ProductReview::find()
                    .select_only()
                    .column(product_review::Column::ProductId)
                    .column(product_review::Column::Rating)
                    .into_tuple()
                    .all(&*self.db)
                    .await?;
                let mut grouped: HashMap<Uuid, Vec<i32>> = HashMap::new();
                for (id, rating) in rows {
                    grouped.entry(id).or_default().push(rating);
                }
                ratings = grouped
                    .into_iter()
                    .map(|(id, r)| (id, review_service::average_rating(&r)))
                    .collect();
            }
            _ => {}
        }

        sort_products(products, sort, &order_counts, &ratings);
        Ok(())
    }

    async fn cards(&self, products: Vec<ProductModel>) -> Result<Vec<ProductCard>, ServiceError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        let mut images = ProductImage::find()
            .filter(product_image::Column::ProductId.is_in(ids))
            .all(&*self.db)
            .await?;
        images.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(a.display_order.cmp(&b.display_order))
        });
        let mut primary: HashMap<Uuid, String> = HashMap::new();
        for image in images {
            primary.entry(image.product_id).or_insert(image.image_url);
        }

        Ok(products
            .into_iter()
            .map(|product| ProductCard {
                effective_price: product.effective_price(),
                on_sale: product.is_on_sale(),
                primary_image: primary.remove(&product.id),
                product,
            })
            .collect())
    }

    async fn ensure_references(&self, category_id: Uuid, material_id: Uuid) -> Result<(), ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;
        Material::find_by_id(material_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Material", material_id))?;
        Ok(())
    }

    async fn ensure_unique_sku(&self, sku: &str, exclude_id: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
        }

        Ok(())
    }

    async fn ensure_unique_slug(&self, slug: &str, exclude_id: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("Slug {} already exists", slug)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("Teak Garden Bench", "teak-garden-bench")]
    #[case("  Adirondack  Chair!! ", "adirondack-chair")]
    #[case("Set of 4 - Bistro Chairs", "set-of-4-bistro-chairs")]
    #[case("Café Table", "caf-table")]
    #[case("!!!", "")]
    fn slugify_collapses_non_alphanumerics(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn sale_price_must_undercut_price() {
        assert!(check_prices(dec!(100), Some(dec!(80))).is_ok());
        assert!(check_prices(dec!(100), Some(dec!(100))).is_err());
        assert!(check_prices(dec!(0), None).is_err());
        assert!(check_prices(dec!(100), None).is_ok());
    }

    fn product(name: &str, price: Decimal, age_days: i64) -> ProductModel {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() - Duration::days(age_days);
        ProductModel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            description: String::new(),
            category_id: Uuid::new_v4(),
            material_id: Uuid::new_v4(),
            price,
            sale_price: None,
            weight: Decimal::ZERO,
            width: Decimal::ZERO,
            height: Decimal::ZERO,
            depth: Decimal::ZERO,
            assembly_required: false,
            weather_resistant: true,
            sku: name.to_uppercase(),
            is_active: true,
            featured: false,
            warranty_months: 12,
            created_at: created,
            updated_at: created,
        }
    }

    fn names(products: &[ProductModel]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn price_and_age_sorts() {
        let mut products = vec![
            product("Bench", dec!(300), 10),
            product("Chair", dec!(120), 1),
            product("Lounger", dec!(450), 30),
        ];
        let none = HashMap::new();
        let no_ratings = HashMap::new();

        sort_products(&mut products, ProductSort::PriceLow, &none, &no_ratings);
        assert_eq!(names(&products), ["Chair", "Bench", "Lounger"]);

        sort_products(&mut products, ProductSort::PriceHigh, &none, &no_ratings);
        assert_eq!(names(&products), ["Lounger", "Bench", "Chair"]);

        sort_products(&mut products, ProductSort::Newest, &none, &no_ratings);
        assert_eq!(names(&products), ["Chair", "Bench", "Lounger"]);

        sort_products(&mut products, ProductSort::Name, &none, &no_ratings);
        assert_eq!(names(&products), ["Bench", "Chair", "Lounger"]);
    }

    #[test]
    fn popular_and_rating_sorts() {
        let mut products = vec![
            product("Bench", dec!(300), 10),
            product("Chair", dec!(120), 1),
            product("Lounger", dec!(450), 30),
        ];
        let bench = products[0].id;
        let chair = products[1].id;
        let lounger = products[2].id;

        let counts = HashMap::from([(lounger, 5), (bench, 2)]);
        sort_products(&mut products, ProductSort::Popular, &counts, &HashMap::new());
        assert_eq!(names(&products), ["Lounger", "Bench", "Chair"]);

        let ratings = HashMap::from([(chair, dec!(4.5)), (lounger, dec!(3.0))]);
        sort_products(&mut products, ProductSort::Rating, &HashMap::new(), &ratings);
        assert_eq!(names(&products), ["Chair", "Lounger", "Bench"]);
    }

    #[test]
    fn sort_parses_query_values() {
        let sort: ProductSort = serde_json::from_str("\"price_low\"").unwrap();
        assert_eq!(sort, ProductSort::PriceLow);
        let sort: ProductSort = serde_json::from_str("\"default\"").unwrap();
        assert_eq!(sort, ProductSort::Name);
    }
}
