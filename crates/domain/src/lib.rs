//! Domain layer for Building Manager backend.
//!
//! This crate contains:
//! - Domain models (Profile, Building, BuildingInvite, PendingInvite, Saga)
//! - Onboarding orchestration and authorization services
//! - Traits for the relational store, identity provider and object storage

pub mod models;
pub mod services;
