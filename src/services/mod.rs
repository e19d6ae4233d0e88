pub mod email_service;
pub mod feedback_service;
pub mod media_store;
pub mod note_service;
pub mod token_service;
pub mod user_service;

pub use email_service::{create_email_service, ConsoleEmailService, EmailService, SmtpEmailService};
pub use feedback_service::{FeedbackService, FeedbackServiceError};
pub use media_store::{
    create_media_store, CloudinaryMediaStore, LocalMediaStore, MediaError, MediaKind, MediaStore,
};
pub use note_service::{ListNotesRequest, NoteService, NoteServiceError, SemesterFilters};
pub use token_service::{Claims, TokenError, TokenService};
pub use user_service::{UserService, UserServiceError};
