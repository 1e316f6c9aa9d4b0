//! Core domain library for the Hearthwork household-services marketplace.
//!
//! The marketplace connects households posting jobs with workers applying to
//! them. This crate owns the job lifecycle state machine, application intake,
//! notification fan-out, and two-party messaging; HTTP serving and the
//! persistent store live behind the traits each module exposes.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
