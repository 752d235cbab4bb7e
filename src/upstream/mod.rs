//! Access to the eero cloud API
//!
//! - [`client`]: HTTP transport behind the [`Upstream`] trait
//! - [`fetch`]: one fetcher per resource
//! - [`normalize`] and [`fields`]: shape normalization and field extraction

pub mod client;
pub mod error;
pub mod fetch;
pub mod fields;
pub mod normalize;

pub use client::{DEFAULT_BASE_URL, HttpUpstream, Upstream};
pub use error::{FetchError, FetchResult};
pub use fetch::{Fetchers, Resource};
pub use normalize::Entity;
