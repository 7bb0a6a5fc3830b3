pub mod config;
pub mod dlq;
pub mod domain;
pub mod error;
pub mod expression;
pub mod http;
pub mod lowering;
pub mod schema;
pub mod service;
