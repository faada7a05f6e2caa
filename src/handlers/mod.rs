//! HTTP handlers, grouped by the router that mounts them.
//!
//! - `catalog`: public storefront reads.
//! - `account`: anything acting on the signed-in customer's own data.
//! - `admin`: back-office reads and mutations; every mutation leaves an audit entry.

pub mod account;
pub mod admin;
pub mod catalog;
