/// Assignment submission core
///
/// - [`draft`]: the form state and its replace-on-change updates
/// - [`validation`]: submit-time presence checks
/// - [`transaction`]: payment reference generation
/// - [`notify`]: notice and navigation collaborators
/// - [`workflow`]: the controller that ties them together

pub mod draft;
pub mod notify;
pub mod transaction;
pub mod validation;
pub mod workflow;

pub use draft::{DraftUpdate, PaymentDetails, SelectedFile, SubmissionDraft};
pub use workflow::{
    PartialFailurePolicy, SubmissionController, SubmissionError, SubmissionOutcome,
    SubmissionStatus,
};
