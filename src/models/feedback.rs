use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}
