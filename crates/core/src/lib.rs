//! `upkeep-core` -- maintenance history records and the reliability
//! metrics engine.
//!
//! The record modules ([`failure`], [`work_order`], [`asset`]) own the typed
//! records, their stored labels and lifecycle rules. [`fields`] converts rows
//! handed over by the record store. [`kpi`] and [`report`] are pure
//! computations over borrowed records.

pub mod asset;
pub mod error;
pub mod failure;
pub mod fields;
pub mod kpi;
pub mod report;
pub mod types;
pub mod validation;
pub mod work_order;
