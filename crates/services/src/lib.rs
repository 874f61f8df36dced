//! Business rules for the TechnoMart storefront, layered over the `db` crate.

pub mod services;
