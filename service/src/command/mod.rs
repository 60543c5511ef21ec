//! [`Command`] definition.

pub mod create_account;
pub mod create_company;
pub mod create_trip;
pub mod delete_company;
pub mod delete_trip;
pub mod mark_trip_returned;
pub mod set_account_active;
pub mod set_company_active;
pub mod transition_trips;
pub mod update_trip;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_account::CreateAccount, create_company::CreateCompany,
    create_trip::CreateTrip, delete_company::DeleteCompany,
    delete_trip::DeleteTrip, mark_trip_returned::MarkTripReturned,
    set_account_active::SetAccountActive,
    set_company_active::SetCompanyActive, transition_trips::TransitionTrips,
    update_trip::UpdateTrip,
};
