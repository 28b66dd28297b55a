// src/lib.rs

//! sismiq: recent-earthquake tracker for the KOERI feed

pub mod error;
pub mod models;
pub mod pipeline;
#[cfg(feature = "relay")]
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
