pub mod analysis;
pub mod price;
pub mod ticker;
