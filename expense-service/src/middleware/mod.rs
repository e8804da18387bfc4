pub mod requester;

pub use requester::{Requester, REQUESTER_HEADER};
