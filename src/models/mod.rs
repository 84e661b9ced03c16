//! Domain models shared across the StockSwipe system.

pub mod quote;
pub mod stock;
pub mod user;

pub use quote::Quote;
pub use stock::{Catalog, Stock, Volatility};
pub use user::{AuthSession, ProfileUpdate, User, UserProfile};
