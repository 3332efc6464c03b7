//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;
use study_assistant_core::service::StudyService;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// The knowledge base inside `study` lives exactly as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub study: Arc<StudyService>,
}
