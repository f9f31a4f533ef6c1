pub mod listing;
pub mod product;

pub use listing::*;
pub use product::*;
