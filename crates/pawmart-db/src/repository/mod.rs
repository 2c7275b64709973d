//! # Repository Module
//!
//! Database repository implementations for PawMart checkout.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().place_order(&engine, &order, now)                 │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── place_order(...)   price, redeem, insert in ONE transaction       │
//! │  └── get_by_id(id)                                                     │
//! │       │                                                                 │
//! │       │  uses                                                           │
//! │       ▼                                                                 │
//! │  CouponRepository                                                      │
//! │  ├── create / update_definition   (admin + seed)                       │
//! │  ├── get_by_code / list_active                                         │
//! │  └── redeem / redeem_in_tx        single conditional UPDATE            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`coupon::CouponRepository`] - Coupon registry and atomic redemption
//! - [`order::OrderRepository`] - Order submission and lookup

pub mod coupon;
pub mod order;
