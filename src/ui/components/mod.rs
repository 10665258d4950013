mod category_bar;
mod input;
mod key_result;
mod search_input;

pub use category_bar::{CategoryBar, CategoryEvent};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
