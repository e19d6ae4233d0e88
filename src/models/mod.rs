pub mod feedback;
pub mod note;
pub mod user;
pub mod visit;

pub use feedback::{Feedback, FeedbackForm};
pub use note::{NewNote, Note, NoteFilter, NoteMeta, NotePage, UploadedFile};
pub use user::{Profile, Role, User};
pub use visit::{DeviceCount, Visit};
