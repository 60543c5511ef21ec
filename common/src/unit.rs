//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity modification.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Marker type describing a departure.
#[derive(Clone, Copy, Debug)]
pub struct Departure;

/// Marker type describing a return.
#[derive(Clone, Copy, Debug)]
pub struct Return;
