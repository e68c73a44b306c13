// Storefront and checkout flows
pub mod commerce;

// Back office
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod promotions;
