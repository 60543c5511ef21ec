//! Domain definitions.

pub mod account;
pub mod company;
pub mod trip;

pub use self::{account::Account, company::Company, trip::Trip};
