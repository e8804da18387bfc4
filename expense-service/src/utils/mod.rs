pub mod date;
pub mod validation;

pub use date::today_in_lima;
pub use validation::ValidatedJson;
