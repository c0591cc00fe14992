pub mod traits;
pub mod schema;
pub mod error;
pub mod weather;
pub mod air_quality;
