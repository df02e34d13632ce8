//! Database repositories.

pub mod ballot;
pub mod event;
pub mod event_option;
pub mod user;

pub use ballot::BallotRepository;
pub use event::EventRepository;
pub use event_option::EventOptionRepository;
pub use user::UserRepository;
