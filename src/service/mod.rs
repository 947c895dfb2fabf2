// Services - queries and commands
//
// Each service borrows a repository and handles a fixed set of query and
// command types. Queries never write; every command records an audit event.

pub mod adresse;
pub mod finansstyring;
pub mod foodwaste;
pub mod kalender;

pub use adresse::AdresseService;
pub use finansstyring::FinansstyringService;
pub use foodwaste::FoodWasteService;
pub use kalender::KalenderService;

use crate::error::IntranetResult;

pub trait QueryHandler<Q> {
    type Output;

    fn query(&self, query: Q) -> IntranetResult<Self::Output>;
}

pub trait CommandHandler<C> {
    type Output;

    fn execute(&self, command: C) -> IntranetResult<Self::Output>;
}

/// Actor recorded on audit events written by the services
pub const SERVICE_ACTOR: &str = "osintranet_service";
