pub mod config;
pub mod db;
pub mod export;
pub mod files;
pub mod import;
pub mod logging;
pub mod reference_data;
pub mod stats;
