//! ozon-dash: analytics dashboard for Ozon marketplace sellers.
//!
//! Talks to the seller backend for products, analytics, cost updates and
//! Telegram reports, and falls back to built-in demo data while the backend
//! is unreachable.

pub mod api;
pub mod auth;
pub mod charts;
pub mod cli;
pub mod config;
pub mod events;
pub mod metrics;
pub mod models;
pub mod products;
pub mod shell;
pub mod storage;
pub mod web;
