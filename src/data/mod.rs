pub mod builder;
pub mod structs;

pub use builder::SubjectBuilder;
pub use structs::{Population, SimulatedEvent, Status, Subject};
