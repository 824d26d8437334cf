pub mod constants;
pub mod error;
pub mod events;
pub mod external;
pub mod instructions;
pub mod nexus;
pub mod serde_helpers;
pub mod states;

pub use error::{NexusError, Result};
pub use events::NexusEvent;
pub use nexus::{InMemoryNexus, Nexus};
pub use states::Role;
