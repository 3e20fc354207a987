//! Intervention schedules and training datasets for an epidemic simulator surrogate.
//!
//! The [`schedule`] module turns a calendar of color-zone periods plus a
//! parameter table into per-quantity change-point schedules. The [`dataset`]
//! module cuts simulated or observed time series into feature/label vectors,
//! and [`scaler`] fits the affine transforms applied to them.

pub mod calendar;
pub mod dataset;
pub mod error;
pub mod io;
mod macros;
pub mod prelude;
pub mod scaler;
pub mod schedule;
pub mod zone;
