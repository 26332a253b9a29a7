//! Store discovery and stack assembly.
//!
//! [`StoreProvider`]s report the stores visible from a module through the
//! scopes of an [`Environment`]. The same logical store may be reported more
//! than once; [`combine_same_stores`] folds such duplicates together and
//! [`having_implicit_overrides`] finds ambiguous equal-order collisions.
//! [`StoreRegistry`] ties this together and builds stacks.

pub mod error;
pub mod merge;
pub mod provider;
pub mod registry;

pub use error::{ResolveError, ResolveResult};
pub use merge::{combine_same_stores, having_implicit_overrides, ImplicitOverride};
pub use provider::{Environment, Scope, ServiceRef, StaticStoreProvider, StoreProvider};
pub use registry::StoreRegistry;
