//! The answer workflow: relevance gate, research, verification, and the
//! state machine that sequences them.

pub mod controller;
pub mod relevance;
pub mod research;
pub mod verification;
