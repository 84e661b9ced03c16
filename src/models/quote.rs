//! # models::quote
//!
//! Defines [`Quote`], the normalized live price a quote source hands back for
//! a single symbol.  Quotes are never persisted; they are folded into a
//! [`Stock`](super::Stock) snapshot and dropped.

use serde::{Deserialize, Serialize};

/// A freshly fetched quote for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Last close / trade price.
    pub price: f64,

    /// Absolute change versus the previous close.
    pub change: f64,

    /// Percent change versus the previous close.
    pub change_percent: f64,
}
