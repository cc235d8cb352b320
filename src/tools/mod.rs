pub mod executor;
pub mod flights;
pub mod registry;
pub mod schema;

pub use executor::ActionExecutor;
pub use flights::{Availability, UNKNOWN_PRICE};
pub use registry::{Action, ActionRegistry, ActionSpec};
pub use schema::{parameters_schema, DestinationArgs};
