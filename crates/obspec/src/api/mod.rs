//! Access to the Data Commons website API.
//!
//! The fetchers are written against the [`DataCommonsApi`] trait so they can
//! run against a live site ([`HttpApi`]) or canned fixtures ([`MockApi`]).
//!
//! # Example
//!
//! ```no_run
//! use obspec::{ApiConfig, DataCommonsApi, Dcid, HttpApi};
//!
//! # async fn run() -> obspec::Result<()> {
//! let api = HttpApi::new(&ApiConfig::default())?;
//! let _names = api
//!     .place_display_names(&[Dcid::new("geoId/06")?])
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod mock;
mod provider;

pub use http::HttpApi;
pub use mock::MockApi;
pub use provider::DataCommonsApi;
