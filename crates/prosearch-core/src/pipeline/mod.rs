//! Pipeline event handling: envelope shapes, classification, and the
//! activity containers classification feeds.

pub mod activity;
pub mod classifier;
pub mod envelope;
