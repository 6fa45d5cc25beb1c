pub mod http_market;

pub use http_market::HttpMarketClient;
