pub mod cart;
pub mod freight;
pub mod payment;
pub mod quote_service;
pub mod stock;
