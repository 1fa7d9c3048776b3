//! Device actions
//!
//! This module provides:
//! - `dispatcher`: Precondition-checked primitive and intent actions
//! - `sequence`: Unlock, camera capture and gesture sequences
//! - `result`: Action outcomes and how far they can be trusted

mod dispatcher;
mod result;
mod sequence;

pub use dispatcher::Connector;
pub use result::{ActionResult, Confidence, SequenceReport};
pub use sequence::{CaptureOptions, GestureSequence, GestureStep};
