/// Storefront-facing entities
pub mod address;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod customer;
pub mod customer_address;
pub mod material;
pub mod product_image;
pub mod product_review;
pub mod product_variant;
pub mod promotion;
pub mod wishlist;
pub mod wishlist_item;

pub use address::{Entity as Address, Model as AddressModel};
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use customer_address::{AddressType, Entity as CustomerAddress, Model as CustomerAddressModel};
pub use material::{Entity as Material, MaintenanceLevel, Model as MaterialModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_review::{Entity as ProductReview, Model as ProductReviewModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
pub use promotion::{DiscountType, Entity as Promotion, Model as PromotionModel};
pub use wishlist::{Entity as Wishlist, Model as WishlistModel};
pub use wishlist_item::{Entity as WishlistItem, Model as WishlistItemModel};
