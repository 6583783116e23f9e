//! Settlement Service - rental clearance settlement and VAT calculation for
//! the Shibr shelf-rental marketplace.

pub mod config;
pub mod domain;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
