pub mod catalog_repo;
pub mod discount_repo;
pub mod quote_repo;
pub mod stock_repo;

pub use catalog_repo::CatalogRepository;
pub use discount_repo::DiscountRepository;
pub use quote_repo::QuoteRepository;
pub use stock_repo::StockRepository;
