//! Pass infrastructure for lowering shader modules.
//!
//! This module sits between the IR and the caller:
//!
//! - [`crate::ir`] — the SSA module, its instructions and constant folding
//! - [`compiler`](self) — passes, the pass manager, shared context and change tracking
//! - [`crate::metadata`] — per-stage float controls the passes consult
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Lowering Pipeline                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  LowerContext                Shared state across modules         │
//! │    ├─ Resource usage          (float controls per stage)         │
//! │    └─ EventLog                                                   │
//! │                                                                  │
//! │  PassManager                 Explicit pass list                  │
//! │    ├─ run()                   One module, repeat until stable    │
//! │    └─ run_modules()           Independent modules in parallel    │
//! │                                                                  │
//! │  ModulePass trait            Interface for all passes            │
//! │    ├─ run_on_module()         Per-module transformation          │
//! │    ├─ initialize()            One-time setup before pipeline     │
//! │    └─ finalize()              Cleanup after pipeline completes   │
//! │                                                                  │
//! │  AlgebraTransformPass        Floating-point algebra              │
//! │    ├─ Constant folding        (denormal flush policy)            │
//! │    ├─ Zero identities         (relaxed policy only)              │
//! │    ├─ Contract flags          (reassoc follows contract)         │
//! │    └─ fdiv lowering           (mangled library call)             │
//! │                                                                  │
//! │  EventLog                    Change tracking and diagnostics     │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

mod context;
mod events;
mod pass;
mod passes;
mod scheduler;

pub use context::LowerContext;
pub use events::{Event, EventBuilder, EventKind, EventLog, EventLogIter};
pub use pass::ModulePass;
pub use passes::{AlgebraOptions, AlgebraTransformPass};
pub use scheduler::PassManager;
