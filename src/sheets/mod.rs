//! Google Sheets record store
//!
//! - [`auth`] - Service account JWT-bearer token flow
//! - [`client`] - [`SheetsRecordStore`], the Sheets v4 values API as a [`RecordStore`](crate::store::RecordStore)
//!
//! The spreadsheet is the database: one tab, a header row, then one note
//! per row in columns A..F (name, type, category, address, city, note).

pub mod auth;
pub mod client;

pub use auth::{AccessTokenSource, ServiceAccountKey, ServiceAccountTokenProvider, StaticToken};
pub use client::SheetsRecordStore;
