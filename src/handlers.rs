pub mod discount;
pub mod freight;
pub mod quote;
pub mod sale;
