//! Host document environment for Pick
//!
//! Everything a selection touches lives behind the [`Document`] trait:
//! selector queries, text and markup access, inline styles, attributes,
//! event listeners and the ready signal. [`MemoryDocument`] is the
//! in-memory host, used for tests and headless embedding.
//!
//! ## Core Design
//!
//! ```text
//! HTML / CDP JSON → DomArena (owned, Vec<DomNode>) ← SelectorList (right-to-left match)
//!                        ↑
//!                  MemoryDocument (RefCell) ── ListenerRegistry (Rc identity)
//! ```

pub mod arena;
pub mod document;
pub mod error;
pub mod events;
pub mod markup;
pub mod memory;
pub mod selector;
pub mod style;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use document::Document;
pub use error::{DomError, Result};
pub use events::{listener, DomEvent, Listener, ReadyCallback};
pub use memory::{DocumentConfig, LateReady, MemoryDocument};
pub use selector::SelectorList;
pub use types::*;
