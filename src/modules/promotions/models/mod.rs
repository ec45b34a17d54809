mod promotion;

pub use promotion::{DiscountType, Promotion, PromotionDefinition};
