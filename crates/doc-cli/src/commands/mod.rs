pub mod cache;
pub mod export;
pub mod generate;
pub mod mock;
pub mod watch;
