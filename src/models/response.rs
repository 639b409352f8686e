use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::services::database::PaginatedResult;

/// 标准API响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data,
            message: Some(message),
        }
    }
}

/// 分页列表的统一响应体
pub fn paginated_json<T: Serialize>(result: PaginatedResult<T>) -> Value {
    json!({
        "success": true,
        "data": result.data,
        "pagination": {
            "current_page": result.page,
            "total_pages": result.total_pages,
            "total_items": result.total,
            "items_per_page": result.per_page,
            "has_next": result.page < result.total_pages,
            "has_prev": result.page > 1,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_json_flags() {
        let body = paginated_json(PaginatedResult::new(vec!["a", "b"], 5, 2, 2));

        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["pagination"]["total_pages"], 3);
        assert_eq!(body["pagination"]["has_next"], true);
        assert_eq!(body["pagination"]["has_prev"], true);
    }

    #[test]
    fn test_api_response_skips_empty_message() {
        let body = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert!(body.get("message").is_none());
    }
}
