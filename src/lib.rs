//! # StockSwipe — stock watchlist backend
//!
//! ```text
//!  ┌──────────────┐  GET /api/price ─────────────▶ ┌──────────────┐
//!  │  Client      │  GET /api/stocks[/:id]          │ routes       │
//!  │  (browser /  │  POST|GET|DELETE /api/watchlist │  ├─ auth ◀── bearer → AuthProvider
//!  │   watchlist) │  /api/auth/*  /api/profile      │  │            (firebase | memory)
//!  └──────────────┘                                 │  ├─ store ── DocumentStore
//!         ▲                                         │  │            (memory | postgres)
//!         │ IdentitySession ◀─ ClientAuth           │  └─ enrich ─ QuoteSource ──▶ Twelve Data
//!         └─────────────────────────────────────────┴──────────────── (twelvedata | proxy | offline)
//! ```
//!
//! The server binary lives in `main.rs`; `bin/watchlist.rs` is the terminal
//! client built on [`client`] and [`session`].

pub mod auth;
pub mod client;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod identity;
pub mod models;
pub mod quotes;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
