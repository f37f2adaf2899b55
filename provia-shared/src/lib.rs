pub mod models;
pub mod normalize;

pub use normalize::normalize_name;
