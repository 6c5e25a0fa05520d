//! X API clients and services for communicating with X over HTTP.

pub mod client;
pub mod service;

pub use client::Client;
pub use service::{Raw, Service, ServiceError, XService};
