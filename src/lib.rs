#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Route handlers, session-based authentication, the persistence seam and the avatar"]
#![doc = "pipeline of the taskdesk task-management service. The binary (`main.rs`) only reads"]
#![doc = "configuration, builds an `AppState` and mounts `routes::config` on an `HttpServer`."]

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
