pub mod error_handler;

pub use error_handler::{json_config, path_config, query_config};
