//! Bookkeeping of what the logger has consumed and written.

pub mod session;

// Re-export commonly used types
pub use session::{
    create_shared_log, create_shared_log_with_persistence, SessionLog, SessionStats,
    SharedSessionLog,
};
