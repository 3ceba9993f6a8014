//! Command-line client for a generative-AI gateway
//!
//! Sends text, image, speech and video generation requests to the gateway over
//! HTTPS and saves the results as local files. Video generation runs as a
//! long-running operation that is polled until the file is ready.

pub mod app;
pub mod audit;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mime;
pub mod models;
pub mod operation;
pub mod output;

pub use error::{Error, Result};
