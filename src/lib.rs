pub mod config;
pub mod datefmt;
pub mod error;
pub mod gallery;
pub mod masonry;
pub mod purge;
pub mod schema;
pub mod storage;
pub mod upload;
pub mod web;
