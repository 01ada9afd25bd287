pub mod errors;
pub(crate) mod event_helper;
pub(crate) mod tx_submitter;
