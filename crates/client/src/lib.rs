//! Client-side data stores for the TechnoMart storefront UI.
//!
//! Each store mirrors server rows for the current user behind an explicit
//! interface (fetch/add/remove/clear). Membership checks are synchronous
//! lookups against the locally cached list; caches change only after the
//! corresponding API call succeeds.

pub mod api;
pub mod stores;
