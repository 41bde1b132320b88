pub mod compensation;
pub mod membership;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::error::BillingError;

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Compensation deleted")]
    pub message: String,
}

impl ResponseError for BillingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BillingError::Validation { .. } => StatusCode::BAD_REQUEST,
            BillingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BillingError::UnassignedEmployee { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BillingError::AmbiguousAssociation { .. } => StatusCode::CONFLICT,
            BillingError::Persistence { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "message": self.to_string(),
            "retryable": self.is_retryable(),
        });

        match self {
            BillingError::Validation { field, .. } => body["field"] = json!(field),
            BillingError::AmbiguousAssociation { candidates, .. } => {
                body["candidates"] = json!(candidates)
            }
            BillingError::Persistence {
                collection,
                operation,
                ..
            } => {
                // store details stay in the logs
                body["message"] = json!("Storage is temporarily unavailable, please retry");
                body["collection"] = json!(collection);
                body["operation"] = json!(operation.to_string());
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
