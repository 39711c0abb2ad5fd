//! WebGetter Test - Shared test utilities for the WebGetter crates.
//!
//! This crate provides a mock host (trigger registry, message sender and
//! formatter provider in one), a scripted fetcher, a loopback HTTP fixture
//! server and canned pages and configurations.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! webgetter-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webgetter_test::{MockFetcher, MockHost, weather_config, WEATHER_PAGE};
//!
//! #[tokio::test]
//! async fn test_weather() {
//!     let host = MockHost::new();
//!     let fetcher = MockFetcher::new().with_page("text/html", WEATHER_PAGE);
//!     let module = host.module().with_fetcher(Arc::new(fetcher));
//!     module.install(weather_config()).unwrap();
//!
//!     module.handle_request(&host.channel_message("weather paris")).await.unwrap();
//!     assert_eq!(host.sent_texts(), vec!["72F degrees"]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;
pub mod server;

pub use fixtures::*;
pub use mocks::*;
pub use server::*;
