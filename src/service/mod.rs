pub mod products;
pub mod refresh;

pub use products::ProductCatalog;
pub use refresh::{DatasetReplacer, RefreshSummary};
