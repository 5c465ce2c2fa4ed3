// Library surface for headless/integration tests and reuse.
// The engine modules do no I/O; app, runtime, store and ui are the collaborators.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod replay;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod summary;
pub mod text;
pub mod texts;
pub mod time_series;
pub mod ui;
pub mod util;

pub use engine::{
    CharDisplayState, EngineConfig, InputOutcome, Keystroke, ProcessResult, Speed, TypingEngine,
};
pub use error::{EngineError, StoreError};
pub use summary::{SavePayload, SessionSummary};
