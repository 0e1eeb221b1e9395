//! Core types, business rules and the storage port for the stock-study
//! tracker.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::StudyStore`]; transports drive
//! [`service::StudyService`].

// Native `async fn` in traits; the futures' `Send` bounds are spelled out on
// the trait methods themselves.
#![allow(async_fn_in_trait)]

pub mod comment;
pub mod curriculum;
pub mod error;
pub mod invite;
pub mod progress;
pub mod service;
pub mod store;
pub mod study;
pub mod submission;
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use service::StudyService;
