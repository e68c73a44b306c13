use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_catalog_tables::Migration),
            Box::new(m20240601_000002_create_customer_tables::Migration),
            Box::new(m20240601_000003_create_inventory_tables::Migration),
            Box::new(m20240601_000004_create_cart_tables::Migration),
            Box::new(m20240601_000005_create_promotions_table::Migration),
            Box::new(m20240601_000006_create_order_tables::Migration),
            Box::new(m20240601_000007_create_review_and_wishlist_tables::Migration),
        ]
    }
}

fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).decimal_len(16, 4).not_null().to_owned()
}

/// Unique index over the rows matching `predicate`. NULLs never collide in a
/// plain unique index, so nullable keys get one partial index per case.
async fn create_partial_unique_index(
    manager: &SchemaManager<'_>,
    name: &str,
    table: &str,
    columns: &str,
    predicate: &str,
) -> Result<(), DbErr> {
    manager
        .get_connection()
        .execute_unprepared(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({}) WHERE {}",
            name, table, columns, predicate
        ))
        .await?;
    Ok(())
}

fn timestamps(table: &mut TableCreateStatement, created: impl IntoIden, updated: impl IntoIden) {
    table
        .col(
            ColumnDef::new(created)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(updated)
                .timestamp_with_time_zone()
                .not_null(),
        );
}

mod m20240601_000001_create_catalog_tables {
    use super::{money, timestamps};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut categories = Table::create()
                .table(Categories::Table)
                .if_not_exists()
                .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Categories::Name).string_len(100).not_null())
                .col(
                    ColumnDef::new(Categories::Slug)
                        .string_len(100)
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(Categories::Description).text().not_null())
                .col(ColumnDef::new(Categories::ParentId).uuid().null())
                .col(ColumnDef::new(Categories::ImageUrl).string().null())
                .col(
                    ColumnDef::new(Categories::IsActive)
                        .boolean()
                        .not_null()
                        .default(true),
                )
                .to_owned();
            timestamps(&mut categories, Categories::CreatedAt, Categories::UpdatedAt);
            manager.create_table(categories).await?;

            let mut materials = Table::create()
                .table(Materials::Table)
                .if_not_exists()
                .col(ColumnDef::new(Materials::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Materials::Name).string_len(100).not_null())
                .col(ColumnDef::new(Materials::Description).text().not_null())
                .col(
                    ColumnDef::new(Materials::WeatherResistanceRating)
                        .integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(Materials::MaintenanceLevel)
                        .string_len(10)
                        .not_null(),
                )
                .col(
                    ColumnDef::new(Materials::IsEcoFriendly)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .to_owned();
            timestamps(&mut materials, Materials::CreatedAt, Materials::UpdatedAt);
            manager.create_table(materials).await?;

            let mut products = Table::create()
                .table(Products::Table)
                .if_not_exists()
                .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Products::Name).string_len(200).not_null())
                .col(
                    ColumnDef::new(Products::Slug)
                        .string_len(200)
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(Products::Description).text().not_null())
                .col(ColumnDef::new(Products::CategoryId).uuid().not_null())
                .col(ColumnDef::new(Products::MaterialId).uuid().not_null())
                .col(&mut money(Products::Price))
                .col(ColumnDef::new(Products::SalePrice).decimal_len(16, 4).null())
                .col(ColumnDef::new(Products::Weight).decimal_len(10, 2).not_null())
                .col(ColumnDef::new(Products::Width).decimal_len(10, 2).not_null())
                .col(ColumnDef::new(Products::Height).decimal_len(10, 2).not_null())
                .col(ColumnDef::new(Products::Depth).decimal_len(10, 2).not_null())
                .col(
                    ColumnDef::new(Products::AssemblyRequired)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(
                    ColumnDef::new(Products::WeatherResistant)
                        .boolean()
                        .not_null()
                        .default(true),
                )
                .col(
                    ColumnDef::new(Products::Sku)
                        .string_len(50)
                        .not_null()
                        .unique_key(),
                )
                .col(
                    ColumnDef::new(Products::IsActive)
                        .boolean()
                        .not_null()
                        .default(true),
                )
                .col(
                    ColumnDef::new(Products::Featured)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(
                    ColumnDef::new(Products::WarrantyMonths)
                        .integer()
                        .not_null()
                        .default(12),
                )
                .to_owned();
            timestamps(&mut products, Products::CreatedAt, Products::UpdatedAt);
            manager.create_table(products).await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductImages::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductImages::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductImages::ImageUrl).string().not_null())
                        .col(
                            ColumnDef::new(ProductImages::AltText)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductImages::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductImages::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductImages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_images_product")
                                .from(ProductImages::Table, ProductImages::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            let mut variants = Table::create()
                .table(ProductVariants::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(ProductVariants::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(ProductVariants::ProductId).uuid().not_null())
                .col(ColumnDef::new(ProductVariants::Color).string_len(50).not_null())
                .col(
                    ColumnDef::new(ProductVariants::ColorCode)
                        .string_len(20)
                        .not_null(),
                )
                .col(&mut money(ProductVariants::PriceAdjustment))
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_product_variants_product")
                        .from(ProductVariants::Table, ProductVariants::ProductId)
                        .to(Products::Table, Products::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned();
            timestamps(
                &mut variants,
                ProductVariants::CreatedAt,
                ProductVariants::UpdatedAt,
            );
            manager.create_table(variants).await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Materials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
        Name,
        Slug,
        Description,
        ParentId,
        ImageUrl,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Materials {
        Table,
        Id,
        Name,
        Description,
        WeatherResistanceRating,
        MaintenanceLevel,
        IsEcoFriendly,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Slug,
        Description,
        CategoryId,
        MaterialId,
        Price,
        SalePrice,
        Weight,
        Width,
        Height,
        Depth,
        AssemblyRequired,
        WeatherResistant,
        Sku,
        IsActive,
        Featured,
        WarrantyMonths,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductImages {
        Table,
        Id,
        ProductId,
        ImageUrl,
        AltText,
        IsPrimary,
        DisplayOrder,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductVariants {
        Table,
        Id,
        ProductId,
        Color,
        ColorCode,
        PriceAdjustment,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_customer_tables {
    use super::timestamps;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_customer_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut addresses = Table::create()
                .table(Addresses::Table)
                .if_not_exists()
                .col(ColumnDef::new(Addresses::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Addresses::Line1).string_len(255).not_null())
                .col(ColumnDef::new(Addresses::Line2).string_len(255).null())
                .col(ColumnDef::new(Addresses::City).string_len(100).not_null())
                .col(ColumnDef::new(Addresses::State).string_len(100).not_null())
                .col(ColumnDef::new(Addresses::PostalCode).string_len(20).not_null())
                .col(ColumnDef::new(Addresses::Country).string_len(100).not_null())
                .col(
                    ColumnDef::new(Addresses::IsDefault)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .to_owned();
            timestamps(&mut addresses, Addresses::CreatedAt, Addresses::UpdatedAt);
            manager.create_table(addresses).await?;

            let mut customers = Table::create()
                .table(Customers::Table)
                .if_not_exists()
                .col(ColumnDef::new(Customers::Id).uuid().not_null().primary_key())
                .col(
                    ColumnDef::new(Customers::Email)
                        .string_len(254)
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(Customers::FirstName).string_len(100).not_null())
                .col(ColumnDef::new(Customers::LastName).string_len(100).not_null())
                .col(ColumnDef::new(Customers::Phone).string_len(20).null())
                .col(ColumnDef::new(Customers::BirthDate).date().null())
                .col(
                    ColumnDef::new(Customers::IsSubscribedToNewsletter)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(
                    ColumnDef::new(Customers::LoyaltyPoints)
                        .integer()
                        .not_null()
                        .default(0),
                )
                .col(ColumnDef::new(Customers::Notes).text().not_null())
                .to_owned();
            timestamps(&mut customers, Customers::CreatedAt, Customers::UpdatedAt);
            manager.create_table(customers).await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerAddresses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerAddresses::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerAddresses::CustomerId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerAddresses::AddressId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerAddresses::AddressType)
                                .string_len(10)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerAddresses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_addresses_customer")
                                .from(CustomerAddresses::Table, CustomerAddresses::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customer_addresses_customer_id")
                        .table(CustomerAddresses::Table)
                        .col(CustomerAddresses::CustomerId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomerAddresses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Addresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Addresses {
        Table,
        Id,
        Line1,
        Line2,
        City,
        State,
        PostalCode,
        Country,
        IsDefault,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        Email,
        FirstName,
        LastName,
        Phone,
        BirthDate,
        IsSubscribedToNewsletter,
        LoyaltyPoints,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CustomerAddresses {
        Table,
        Id,
        CustomerId,
        AddressId,
        AddressType,
        CreatedAt,
    }
}

mod m20240601_000003_create_inventory_tables {
    use super::timestamps;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut warehouses = Table::create()
                .table(Warehouses::Table)
                .if_not_exists()
                .col(ColumnDef::new(Warehouses::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Warehouses::Name).string_len(100).not_null())
                .col(ColumnDef::new(Warehouses::AddressId).uuid().null())
                .col(ColumnDef::new(Warehouses::Phone).string_len(20).not_null())
                .col(ColumnDef::new(Warehouses::Email).string_len(254).not_null())
                .col(ColumnDef::new(Warehouses::Manager).string_len(100).not_null())
                .col(
                    ColumnDef::new(Warehouses::IsActive)
                        .boolean()
                        .not_null()
                        .default(true),
                )
                .to_owned();
            timestamps(&mut warehouses, Warehouses::CreatedAt, Warehouses::UpdatedAt);
            manager.create_table(warehouses).await?;

            let mut inventory = Table::create()
                .table(Inventory::Table)
                .if_not_exists()
                .col(ColumnDef::new(Inventory::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Inventory::ProductId).uuid().not_null())
                .col(ColumnDef::new(Inventory::WarehouseId).uuid().not_null())
                .col(
                    ColumnDef::new(Inventory::Quantity)
                        .integer()
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(Inventory::ReservedQuantity)
                        .integer()
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(Inventory::ReorderPoint)
                        .integer()
                        .not_null()
                        .default(5),
                )
                .col(ColumnDef::new(Inventory::LastRestockDate).date().null())
                .to_owned();
            timestamps(&mut inventory, Inventory::CreatedAt, Inventory::UpdatedAt);
            manager.create_table(inventory).await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_product_warehouse")
                        .table(Inventory::Table)
                        .col(Inventory::ProductId)
                        .col(Inventory::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Inventory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Warehouses {
        Table,
        Id,
        Name,
        AddressId,
        Phone,
        Email,
        Manager,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Inventory {
        Table,
        Id,
        ProductId,
        WarehouseId,
        Quantity,
        ReservedQuantity,
        ReorderPoint,
        LastRestockDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000004_create_cart_tables {
    use super::{create_partial_unique_index, timestamps};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_cart_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut carts = Table::create()
                .table(Carts::Table)
                .if_not_exists()
                .col(ColumnDef::new(Carts::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Carts::CustomerId).uuid().null())
                .col(ColumnDef::new(Carts::SessionKey).string_len(100).null())
                .to_owned();
            timestamps(&mut carts, Carts::CreatedAt, Carts::UpdatedAt);
            manager.create_table(carts).await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_carts_customer_id")
                        .table(Carts::Table)
                        .col(Carts::CustomerId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // one anonymous cart per session
            create_partial_unique_index(
                manager,
                "uq_carts_session_key",
                "carts",
                "session_key",
                "customer_id IS NULL",
            )
            .await?;

            let mut items = Table::create()
                .table(CartItems::Table)
                .if_not_exists()
                .col(ColumnDef::new(CartItems::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                .col(ColumnDef::new(CartItems::ProductId).uuid().not_null())
                .col(ColumnDef::new(CartItems::VariantId).uuid().null())
                .col(
                    ColumnDef::new(CartItems::Quantity)
                        .integer()
                        .not_null()
                        .default(1),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_cart_items_cart")
                        .from(CartItems::Table, CartItems::CartId)
                        .to(Carts::Table, Carts::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned();
            timestamps(&mut items, CartItems::CreatedAt, CartItems::UpdatedAt);
            manager.create_table(items).await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_cart_id")
                        .table(CartItems::Table)
                        .col(CartItems::CartId)
                        .to_owned(),
                )
                .await?;

            create_partial_unique_index(
                manager,
                "uq_cart_items_variant_line",
                "cart_items",
                "cart_id, product_id, variant_id",
                "variant_id IS NOT NULL",
            )
            .await?;
            create_partial_unique_index(
                manager,
                "uq_cart_items_plain_line",
                "cart_items",
                "cart_id, product_id",
                "variant_id IS NULL",
            )
            .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Carts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        CustomerId,
        SessionKey,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CartId,
        ProductId,
        VariantId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000005_create_promotions_table {
    use super::{money, timestamps};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_promotions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut promotions = Table::create()
                .table(Promotions::Table)
                .if_not_exists()
                .col(ColumnDef::new(Promotions::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Promotions::Name).string_len(100).not_null())
                .col(ColumnDef::new(Promotions::Description).text().not_null())
                .col(
                    ColumnDef::new(Promotions::DiscountType)
                        .string_len(20)
                        .not_null(),
                )
                .col(&mut money(Promotions::DiscountValue))
                .col(
                    ColumnDef::new(Promotions::Code)
                        .string_len(50)
                        .null()
                        .unique_key(),
                )
                .col(
                    ColumnDef::new(Promotions::StartDate)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(Promotions::EndDate)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(Promotions::IsActive)
                        .boolean()
                        .not_null()
                        .default(true),
                )
                .col(&mut money(Promotions::MinimumOrderValue))
                .col(
                    ColumnDef::new(Promotions::UsageLimit)
                        .integer()
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(Promotions::UsedCount)
                        .integer()
                        .not_null()
                        .default(0),
                )
                .to_owned();
            timestamps(&mut promotions, Promotions::CreatedAt, Promotions::UpdatedAt);
            manager.create_table(promotions).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Promotions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Promotions {
        Table,
        Id,
        Name,
        Description,
        DiscountType,
        DiscountValue,
        Code,
        StartDate,
        EndDate,
        IsActive,
        MinimumOrderValue,
        UsageLimit,
        UsedCount,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000006_create_order_tables {
    use super::{money, timestamps};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000006_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut orders = Table::create()
                .table(Orders::Table)
                .if_not_exists()
                .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                .col(
                    ColumnDef::new(Orders::OrderNumber)
                        .string_len(20)
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                .col(ColumnDef::new(Orders::ShippingAddressId).uuid().null())
                .col(ColumnDef::new(Orders::BillingAddressId).uuid().null())
                .col(ColumnDef::new(Orders::ShippingMethod).string_len(20).not_null())
                .col(ColumnDef::new(Orders::PaymentMethod).string_len(20).not_null())
                .col(ColumnDef::new(Orders::PaymentStatus).string_len(20).not_null())
                .col(
                    ColumnDef::new(Orders::PaymentDate)
                        .timestamp_with_time_zone()
                        .null(),
                )
                .col(ColumnDef::new(Orders::TrackingNumber).string_len(100).null())
                .col(ColumnDef::new(Orders::Notes).text().not_null())
                .col(&mut money(Orders::Subtotal))
                .col(&mut money(Orders::Tax))
                .col(&mut money(Orders::ShippingCost))
                .col(&mut money(Orders::Discount))
                .col(&mut money(Orders::Total))
                .col(ColumnDef::new(Orders::PromotionId).uuid().null())
                .to_owned();
            timestamps(&mut orders, Orders::CreatedAt, Orders::UpdatedAt);
            manager.create_table(orders).await?;

            for (name, column) in [
                ("idx_orders_customer_id", Orders::CustomerId),
                ("idx_orders_status", Orders::Status),
                ("idx_orders_created_at", Orders::CreatedAt),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Orders::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OrderItems::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::VariantId).uuid().null())
                        .col(
                            ColumnDef::new(OrderItems::ProductName)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Sku).string_len(50).not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(&mut money(OrderItems::Price))
                        .col(&mut money(OrderItems::Total))
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderStatusHistory::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderStatusHistory::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderStatusHistory::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderStatusHistory::ChangedBy)
                                .string_len(100)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OrderStatusHistory::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_status_history_order")
                                .from(OrderStatusHistory::Table, OrderStatusHistory::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderStatusHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        Status,
        ShippingAddressId,
        BillingAddressId,
        ShippingMethod,
        PaymentMethod,
        PaymentStatus,
        PaymentDate,
        TrackingNumber,
        Notes,
        Subtotal,
        Tax,
        ShippingCost,
        Discount,
        Total,
        PromotionId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        VariantId,
        ProductName,
        Sku,
        Quantity,
        Price,
        Total,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderStatusHistory {
        Table,
        Id,
        OrderId,
        Status,
        ChangedBy,
        Timestamp,
    }
}

mod m20240601_000007_create_review_and_wishlist_tables {
    use super::{create_partial_unique_index, timestamps};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000007_create_review_and_wishlist_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut reviews = Table::create()
                .table(ProductReviews::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(ProductReviews::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(ProductReviews::ProductId).uuid().not_null())
                .col(ColumnDef::new(ProductReviews::CustomerId).uuid().not_null())
                .col(ColumnDef::new(ProductReviews::OrderItemId).uuid().null())
                .col(ColumnDef::new(ProductReviews::Rating).integer().not_null())
                .col(ColumnDef::new(ProductReviews::Title).string_len(200).not_null())
                .col(ColumnDef::new(ProductReviews::Comment).text().not_null())
                .col(
                    ColumnDef::new(ProductReviews::VerifiedPurchase)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(
                    ColumnDef::new(ProductReviews::HelpfulVotes)
                        .integer()
                        .not_null()
                        .default(0),
                )
                .to_owned();
            timestamps(
                &mut reviews,
                ProductReviews::CreatedAt,
                ProductReviews::UpdatedAt,
            );
            manager.create_table(reviews).await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_reviews_product_customer")
                        .table(ProductReviews::Table)
                        .col(ProductReviews::ProductId)
                        .col(ProductReviews::CustomerId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            let mut wishlists = Table::create()
                .table(Wishlists::Table)
                .if_not_exists()
                .col(ColumnDef::new(Wishlists::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Wishlists::CustomerId).uuid().not_null())
                .col(ColumnDef::new(Wishlists::Name).string_len(100).not_null())
                .col(
                    ColumnDef::new(Wishlists::IsPublic)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .to_owned();
            timestamps(&mut wishlists, Wishlists::CreatedAt, Wishlists::UpdatedAt);
            manager.create_table(wishlists).await?;

            manager
                .create_table(
                    Table::create()
                        .table(WishlistItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WishlistItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(WishlistItems::WishlistId).uuid().not_null())
                        .col(ColumnDef::new(WishlistItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(WishlistItems::VariantId).uuid().null())
                        .col(ColumnDef::new(WishlistItems::Notes).text().not_null())
                        .col(
                            ColumnDef::new(WishlistItems::AddedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_wishlist_items_wishlist")
                                .from(WishlistItems::Table, WishlistItems::WishlistId)
                                .to(Wishlists::Table, Wishlists::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            create_partial_unique_index(
                manager,
                "uq_wishlist_items_variant_entry",
                "wishlist_items",
                "wishlist_id, product_id, variant_id",
                "variant_id IS NOT NULL",
            )
            .await?;
            create_partial_unique_index(
                manager,
                "uq_wishlist_items_plain_entry",
                "wishlist_items",
                "wishlist_id, product_id",
                "variant_id IS NULL",
            )
            .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WishlistItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Wishlists::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductReviews::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductReviews {
        Table,
        Id,
        ProductId,
        CustomerId,
        OrderItemId,
        Rating,
        Title,
        Comment,
        VerifiedPurchase,
        HelpfulVotes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Wishlists {
        Table,
        Id,
        CustomerId,
        Name,
        IsPublic,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WishlistItems {
        Table,
        Id,
        WishlistId,
        ProductId,
        VariantId,
        Notes,
        AddedAt,
    }
}
