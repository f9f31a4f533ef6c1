pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod scrapers;
pub mod service;
pub mod storage;
pub mod utils;
