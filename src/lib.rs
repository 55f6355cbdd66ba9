//! A small Rust client for the Data to Science (D2S) platform API.
//!
//! This crate implements a `d2spy`-style flow: sign in against a D2S
//! instance, then walk the read-only resource hierarchy
//! (workspace → projects → flights → data products). Cookie-based
//! access/refresh token handling is transparent: a 401 on any GET triggers
//! exactly one token refresh and one retry, and an unrecoverable 401 clears
//! the session and fails with [`Error::SessionExpired`].
//!
//! ## Quick start
//! - Configure the instance via environment variables (`D2S_URL`,
//!   `D2S_EMAIL`, `D2S_PASSWORD`) or a `.d2src` file (supported in the
//!   current directory and in your home directory).
//! - Call [`Auth::login`] and open a [`Workspace`] over the session.
//!
//! ```no_run
//! use anyhow::Result;
//! use d2s_client::{Auth, Workspace};
//!
//! fn main() -> Result<()> {
//!     let auth = Auth::from_env()?;
//!     let session = auth.login_from_config()?;
//!
//!     let workspace = Workspace::new(auth.base_url(), session)?;
//!     for project in workspace.get_projects(Some(true))?.collection {
//!         for flight in project.get_flights(None)?.collection {
//!             let products = flight.get_data_products()?;
//!             println!(
//!                 "{} {}: {} data product(s)",
//!                 project.id,
//!                 flight.acquisition_date.as_deref().unwrap_or("unknown"),
//!                 products.len()
//!             );
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Cookies are scoped to the target host: loopback hosts (`localhost`,
//! `127.0.0.1`) are stored without a domain attribute, every other host gets
//! the resolved hostname. For full usage and configuration details, see the
//! crate README.

#![forbid(unsafe_code)]

mod auth;
mod client;
mod config;
mod error;
mod resources;
mod session;
mod util;

pub use auth::{Auth, User};
pub use client::{ApiClient, ClientOptions};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use resources::{
    DataProduct, DataProductCollection, Flight, FlightCollection, Project, ProjectCollection,
    Workspace,
};
pub use session::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, Session, SessionCookie};
