//! Identity types and durable session persistence for Vigil.
//!
//! This is the bottom of the stack. It knows what a user and a bearer
//! token look like, and how a session is laid out in the origin-scoped
//! key/value store. It knows nothing about time, timers, or routes.
//!
//! - **Types** ([`User`], [`Role`], [`BearerToken`], [`PersistedSession`])
//! - **Backends** ([`Storage`] trait, [`MemoryStorage`], [`FileStorage`])
//! - **Session store** ([`SessionStore`]): save / load / clear, with
//!   corruption recovery on load
//! - **Codec** ([`Codec`], [`JsonCodec`]) for the structured user entry
//!
//! ```text
//! Session layer (above)  ← owns when to save, load and clear
//!     ↕
//! Store layer (this crate)  ← owns how a session is laid out on disk
//!     ↕
//! Storage backend (below)  ← plain string key/value
//! ```

mod codec;
mod error;
mod storage;
mod store;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::StoreError;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{SessionStore, StorageKeys};
pub use types::{
    BearerToken, EmptyToken, PersistedSession, Role, UnknownRole, User, UserId,
};
