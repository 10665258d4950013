mod catalog;

pub use catalog::{CatalogView, EMPTY_MESSAGE, LOAD_ERROR_MESSAGE};
