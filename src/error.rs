// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Error Taxonomy

/// 경매 서브시스템 오류 분류
/// 클라이언트에게는 코드와 메시지만 노출하고, 저장소 오류 상세는 서버 로그에만 남긴다.
#[derive(Debug, Error)]
pub enum AuctionError {
    /// 잘못된 입력 (필드 단위 상세 포함)
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// 경매 또는 입찰을 찾을 수 없음
    #[error("{resource} {id}을(를) 찾을 수 없습니다.")]
    NotFound { resource: &'static str, id: i64 },

    /// 상태 충돌 (종료된 경매, 최소 입찰가 미달 등) - 재시도 가능
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
        minimum: Option<Decimal>,
    },

    /// 관리자 권한 필요 (권한 검증 자체는 외부 협력자의 몫)
    #[error("관리자 권한이 필요합니다.")]
    Unauthorized,

    /// 경매 잠금 획득 시간 초과 - 재시도 가능
    #[error("경매 잠금 획득 시간이 초과되었습니다.")]
    LockTimeout,

    /// 저장소 오류 (트랜잭션/커밋 실패)
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type AuctionResult<T> = Result<T, AuctionError>;

impl AuctionError {
    pub fn auction_not_found(id: i64) -> Self {
        AuctionError::NotFound {
            resource: "경매",
            id,
        }
    }

    pub fn bid_not_found(id: i64) -> Self {
        AuctionError::NotFound {
            resource: "입찰",
            id,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::Validation { .. } => "VAL_001",
            AuctionError::NotFound { resource, .. } => {
                if *resource == "입찰" {
                    "BID_NOT_FOUND"
                } else {
                    "AUCTION_NOT_FOUND"
                }
            }
            AuctionError::Conflict { code, .. } => code,
            AuctionError::Unauthorized => "UNAUTHORIZED",
            AuctionError::LockTimeout => "LOCK_TIMEOUT",
            AuctionError::Storage(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::Validation { .. } | AuctionError::Conflict { .. } => {
                StatusCode::BAD_REQUEST
            }
            AuctionError::NotFound { .. } => StatusCode::NOT_FOUND,
            AuctionError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuctionError::LockTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AuctionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        // 저장소 오류 상세는 서버 측에만 기록
        let body = match &self {
            AuctionError::Storage(e) => {
                error!("{:<12} --> 저장소 오류: {:?}", "Error", e);
                serde_json::json!({
                    "error": "내부 서버 오류가 발생했습니다.",
                    "code": self.code(),
                })
            }
            AuctionError::Validation { field, message } => serde_json::json!({
                "error": message,
                "code": self.code(),
                "field": field,
            }),
            AuctionError::Conflict {
                message, minimum, ..
            } => {
                let mut body = serde_json::json!({
                    "error": message,
                    "code": self.code(),
                });
                if let Some(min) = minimum {
                    body["minimum"] = serde_json::json!(min);
                }
                body
            }
            _ => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

// endregion: --- Error Taxonomy
