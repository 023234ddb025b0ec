pub mod keys;
pub mod timer;

pub use keys::{eq_ignore_case, is_same_or_descendant};
pub use timer::sleep_until_deadline;
