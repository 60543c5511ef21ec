//! Background [`Task`]s definitions.

mod background;
pub mod transition_trips;

pub use common::Handler as Task;

pub use self::{
    background::{Background, TaskError},
    transition_trips::TransitionTrips,
};
