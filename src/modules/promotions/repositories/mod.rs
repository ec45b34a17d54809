pub mod promotion_catalog;

pub use promotion_catalog::{InMemoryPromotionCatalog, PromotionCatalog};
