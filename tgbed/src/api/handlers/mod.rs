pub mod fetch;
pub mod static_assets;
pub mod upload;
