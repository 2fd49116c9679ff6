//! Logic Module - Detection Pipeline
//!
//! - `source` - controller flow queries
//! - `features/` - flow → feature vector
//! - `model/` - scaler + classifier loaded from artifacts
//! - `decision` - attack rules and network state
//! - `pipeline` - the above wired together
//! - `poll_loop` / `board` - periodic classification and its latest result

pub mod error;
pub mod source;
pub mod features;
pub mod model;
pub mod decision;
pub mod pipeline;
pub mod board;
pub mod poll_loop;

#[cfg(test)]
pub(crate) mod testing;
