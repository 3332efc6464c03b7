pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

// Re-export the handlers to make them easily accessible
// to the binary that will build the web server router.
pub use rest::{
    create_flashcards_handler, create_summary_handler, get_knowledge_base_handler,
    get_summary_handler, load_item_handler, save_note_handler,
};
pub use ws_handler::ws_handler;

use state::AppState;

/// Builds the API routes. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/knowledge-base", get(get_knowledge_base_handler))
        .route("/summaries", post(create_summary_handler))
        .route("/summaries/{id}", get(get_summary_handler))
        .route("/summaries/{id}/flashcards", post(create_flashcards_handler))
        .route("/summaries/{id}/note", put(save_note_handler))
        .route("/items/{kind}/{id}", get(load_item_handler))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}
