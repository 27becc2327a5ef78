//! The correlation engine: turn state, the correlator itself, and
//! snapshot publishing for observers.

pub mod correlator;
pub mod snapshot;
pub mod state;
