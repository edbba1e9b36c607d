//! Models and collections
//!
//! Base types that carry their own database reference and persist through a
//! `SyncAdapter`.

mod collection;
#[allow(clippy::module_inception)]
mod model;

pub use collection::Collection;
pub use model::Model;
