//! Tessera - multi-tenant document store front-end
//!
//! Callers address independently named databases. Each database is opened
//! lazily on first use, shared by every later caller, and closed again once
//! it has sat idle past the configured timeout.
//!
//! # Quick Start
//!
//! ```ignore
//! use tessera::{CancelToken, EngineConfig, InsertStatement, Runtime};
//!
//! let runtime = Runtime::start(&EngineConfig::default())?;
//! runtime.commands().batch_insert(
//!     "orders",
//!     &[InsertStatement::new("o-1", "pending").with_timestamps()],
//!     &CancelToken::new(),
//! )?;
//! let docs = runtime.commands().multi_get("orders", &["o-1".to_string()])?;
//! runtime.shutdown()?;
//! ```
//!
//! # Architecture
//!
//! | Crate | Role |
//! |-------|------|
//! | `tessera-core` | errors, names, document model |
//! | `tessera-storage` | storage contract and the file engine |
//! | `tessera-engine` | resolver, handle registry, reaper, batch commands |
//! | `tessera-executor` | wire types, value conversion, request dispatch |

pub use tessera_core::{
    DocValue, Document, ErrorKind, LogicalName, NameError, TagValue, Tags, TesseraError,
    TesseraResult,
};
pub use tessera_engine::{
    BatchCommand, BatchOutcome, CancelToken, CommandEngine, EngineConfig, ExecResult,
    HandleGuard, HandleRegistry, InsertStatement, MultiGetResult, NameResolver, Reaper, Runtime,
    UpsertStatement,
};
pub use tessera_executor::{Command, Executor, Output};
pub use tessera_storage::{FileEngine, FileEngineOptions, Persistence, StorageEngine};

/// Wire-level types and conversions
pub mod wire {
    pub use tessera_executor::convert;
    pub use tessera_executor::{
        Error, FieldViolation, WireDocument, WireInsertStatement, WireTag, WireTagValue,
        WireUpsertStatement, WireValue,
    };
}
