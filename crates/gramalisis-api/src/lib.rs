//! Backend side of Gramálisis: accounts, the per-user entry feed, an
//! in-process [`LocalBackend`](local::LocalBackend) for the store's
//! collaborator traits, and the HTTP/WebSocket handlers.

pub mod accounts;
pub mod auth;
pub mod convert;
pub mod entries;
pub mod feed;
pub mod local;
pub mod middleware;
pub mod profile;
pub mod progress;
pub mod stream;
