// Promotions module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{DiscountType, Promotion, PromotionDefinition};
pub use repositories::{InMemoryPromotionCatalog, PromotionCatalog};
pub use services::PromotionResolver;
