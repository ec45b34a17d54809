pub mod promotion_resolver;

pub use promotion_resolver::PromotionResolver;
