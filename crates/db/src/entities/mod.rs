//! Database entities.

#![allow(missing_docs)]

pub mod ballot;
pub mod event;
pub mod event_option;
pub mod user;

pub use ballot::Entity as Ballot;
pub use event::Entity as Event;
pub use event_option::Entity as EventOption;
pub use user::Entity as User;
