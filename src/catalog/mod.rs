//! Catalog browsing: loading, faceting, filtering, sorting and the card
//! projection, all mediated by [`CatalogController`].

mod controller;
mod favorites;
mod filter;
mod render;
mod source;
mod types;

pub use controller::{CatalogController, ToggleOutcome};
pub use render::Card;
pub use source::{fetch_catalog, AnySource, CatalogSource};
pub use types::{Catalog, ALL_CATEGORY};
