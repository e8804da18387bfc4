//! Expense claim engine: amount calculation, form handling, submission gates.

pub mod calculator;
mod error;
pub mod form;
pub mod recipient;
pub mod submission;
pub mod validator;

pub use calculator::{calculate, AmountInputs, AmountOutcome, NotApplicable};
pub use error::SubmissionError;
pub use form::{ClaimDraft, ClaimFields, ClaimForm};
pub use recipient::{DebouncedRecipientResolver, RecipientLookup};
pub use submission::{Submission, SubmitOutcome, Submitter};
pub use validator::{SubmissionContext, SubmissionValidator, ValidatedClaim};
