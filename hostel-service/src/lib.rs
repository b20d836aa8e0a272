//! hostel-service: multi-tenant hostel management with monthly rent
//! invoicing and manual payment verification.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;
