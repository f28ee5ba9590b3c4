//! patchgrid inventory — which hosts exist, in which region, with which role.
//!
//! Instances are listed with `gcloud compute instances list`, filtered by the
//! operator's scope, and bucketed into a [`HostRoster`](patchgrid_core::HostRoster).
//! Each role's host list is the provider's name-sorted listing reversed, so the
//! most recently listed host is dealt into the lowest patch group.

pub mod error;
pub mod gcloud;
pub mod roster;
pub mod scope;

pub use error::InventoryError;
pub use gcloud::GcloudInventory;
pub use roster::{build_roster, parse_instances};
pub use scope::Scope;
