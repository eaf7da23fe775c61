pub mod cluster;
pub mod config;
pub mod controller;
pub mod metrics;
pub mod trace;
pub mod webhook;

pub mod error;
pub mod logger;
