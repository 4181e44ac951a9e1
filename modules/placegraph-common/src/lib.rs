pub mod config;
pub mod error;
pub mod resolve;
pub mod types;
pub mod wkt;

pub use config::Config;
pub use error::PlaceGraphError;
pub use resolve::FieldChains;
pub use types::*;
