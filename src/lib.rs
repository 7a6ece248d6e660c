pub mod aggregate;
pub mod analysis_fetch;
pub mod api_types;
pub mod config;
pub mod death;
pub mod detail;
pub mod error;
pub mod fake_feed;
pub mod fight_order;
pub mod http_client;
pub mod provider;
pub mod rank;
pub mod state;
