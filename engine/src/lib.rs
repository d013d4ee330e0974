//! Pricing and settlement engine for multi-outcome prediction markets.
//!
//! A creator posts a question with N mutually exclusive outcomes and seeds
//! every outcome with the same collateral reserve. Traders buy and sell
//! outcome shares against an automated market maker whose per-outcome price
//! is its share of total reserve inventory; after the resolve time a
//! designated outcome wins and winning shares redeem 1:1 for collateral.
//!
//! The engine is a pure state-transition component:
//!
//! 1. Every operation is synchronous and all-or-nothing - a failed call
//!    returns an error and leaves no partial mutation behind.
//! 2. Collateral custody, authorization and the clock are the caller's
//!    concern; the engine only computes how much collateral an operation
//!    requires or returns and how the share ledger must change.
//! 3. All quantities are fixed-point integers scaled by 1e18; arithmetic
//!    is checked and overflow is rejected, never saturated.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod binary;
pub mod market;

pub use market::*;
