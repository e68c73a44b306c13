pub mod commerce;
pub mod inventory;
pub mod order;
pub mod order_item;
pub mod order_status_history;
pub mod product;
pub mod warehouse;

pub use inventory::{Entity as Inventory, Model as InventoryModel};
pub use order::{
    Entity as Order, Model as OrderModel, OrderStatus, PaymentMethod, PaymentStatus,
    ShippingMethod,
};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use order_status_history::{Entity as OrderStatusHistory, Model as OrderStatusHistoryModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use warehouse::{Entity as Warehouse, Model as WarehouseModel};
