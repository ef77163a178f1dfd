//! HotelHub Core - hotel booking service backend
//!
//! Hotel listings with an admin approval workflow, the booking lifecycle,
//! role-scoped access control and revenue statistics, served over a JSON
//! REST API backed by MySQL.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod wechat;

pub use config::Config;
pub use error::{AppError, Result};
