use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Workplace {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "SD Harapan Bangsa")]
    pub name: String,
    #[schema(example = json!(-6.2))]
    pub latitude: f64,
    #[schema(example = 106.816666)]
    pub longitude: f64,
}
