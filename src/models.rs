pub mod catalog;
pub mod quote;
pub mod sale;
