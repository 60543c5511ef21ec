//! Read entities definitions.

pub mod trip;
