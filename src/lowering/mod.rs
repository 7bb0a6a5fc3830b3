pub mod lower;
pub mod migrate;
pub mod pipeline_json;
pub mod util;

pub use lower::{lower, to_pipeline_json};
pub use migrate::migrate_pipeline_from_json;
