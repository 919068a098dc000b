pub mod app;
pub mod client;
pub mod conf;
pub mod error;
pub mod record;
pub mod resize;
pub mod storage;
