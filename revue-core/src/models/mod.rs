pub mod category;
pub mod review;

pub use category::{CategoryField, FilterField, GroupKey};
pub use review::Review;
