use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub user_agent: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct DeviceCount {
    #[serde(rename = "_id")]
    pub device: String,
    pub count: i64,
}
