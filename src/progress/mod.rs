//! The progress aggregation core: pure calendar bucketing of session
//! history into a [aggregate::ProgressSummary]. No I/O happens here; the
//! caller supplies the task snapshot and the reference instant.

pub mod aggregate;
pub mod keys;
