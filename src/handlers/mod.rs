pub mod feedback_handlers;
pub mod note_handlers;
pub mod user_handlers;
