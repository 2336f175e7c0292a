//! The symbol-extraction collaborator: a single long-lived external parser
//! subprocess with a per-call timeout and serialized access, modeled as the
//! [`SymbolSource`] trait so the Builder never depends on the transport.

use std::path::Path;
use std::sync::Arc;

pub mod ctags;
pub mod error;
pub mod null;
pub mod source;

pub use ctags::CtagsSubprocess;
pub use error::{Error, Result};
pub use null::NullSymbolSource;
pub use source::SymbolSource;

/// `New` from the spec: if `ctags_path` is absent or doesn't exist on disk,
/// return the sentinel source. Callers with `ctags_must_succeed` are
/// expected to reject that case at `Builder::new`, not here.
pub fn new_symbol_source(ctags_path: Option<&Path>) -> Arc<dyn SymbolSource> {
    match ctags_path {
        Some(path) if path.exists() => Arc::new(CtagsSubprocess::new(path)),
        _ => Arc::new(NullSymbolSource),
    }
}
