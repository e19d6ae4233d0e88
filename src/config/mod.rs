pub mod app;

pub use app::{
    AppConfig, ConfigError, MediaConfig, SmtpConfig, MAX_UPLOAD_BYTES, MULTIPART_OVERHEAD_BYTES,
};
