pub mod enums;
pub mod validation;
pub mod visit;

pub use enums::{FollowUpKind, Sex};
pub use validation::ValidationError;
pub use visit::*;
