// Entity Models
//
// Each entity has:
// - Stable identity that never changes
// - Mutable values guarded by validation
// - Registry for lookups

pub mod patron;

pub use patron::{Patron, PatronRegistry};
