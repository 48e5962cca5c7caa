/// 입찰 검증기
/// 스냅샷과 입찰 명령만으로 수락/거절을 결정하는 순수 함수.
/// 부수 효과가 없고 입력에 대해 결정적이므로 저장소나 직렬화기 없이 단위 테스트할 수 있다.
// region:    --- Imports
use crate::auction::lifecycle::AuctionStatus;
use crate::auction::model::Auction;
use crate::bidding::commands::PlaceBidCommand;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Rejection

/// 타입화된 거절 사유 (검증기는 절대 panic하지 않는다)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BidRejection {
    #[error("경매가 진행 중이 아닙니다. (상태: {status})")]
    NotActive { status: String },

    #[error("경매가 이미 종료되었습니다.")]
    Ended,

    #[error("{message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("입찰 금액이 최소 입찰가보다 낮습니다. (최소 입찰가: {minimum})")]
    TooLow { minimum: Decimal },
}

impl From<BidRejection> for crate::error::AuctionError {
    fn from(rejection: BidRejection) -> Self {
        use crate::error::AuctionError;
        match rejection {
            BidRejection::NotActive { .. } => AuctionError::Conflict {
                code: "AUCTION_NOT_ACTIVE",
                message: rejection.to_string(),
                minimum: None,
            },
            BidRejection::Ended => AuctionError::Conflict {
                code: "AUCTION_ENDED",
                message: rejection.to_string(),
                minimum: None,
            },
            BidRejection::InvalidInput { field, message } => {
                AuctionError::Validation { field, message }
            }
            BidRejection::TooLow { minimum } => AuctionError::Conflict {
                code: "BID_TOO_LOW",
                message: rejection.to_string(),
                minimum: Some(minimum),
            },
        }
    }
}

// endregion: --- Rejection

// region:    --- Validator

/// 스냅샷에 대한 입찰 평가. 검사 순서는 고정이며 첫 실패가 우선한다.
/// `Ended` 거절을 받은 호출자는 같은 직렬화 구간 안에서 ENDED 전이를 적용해야 한다.
pub fn evaluate(
    auction: &Auction,
    cmd: &PlaceBidCommand,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    // 1. 상태 검사
    match AuctionStatus::parse(&auction.status) {
        Some(AuctionStatus::Active) => {}
        _ => {
            return Err(BidRejection::NotActive {
                status: auction.status.clone(),
            })
        }
    }

    // 2. 종료 시간 검사 (스윕이 돌기 전이라도 늦은 입찰은 거절)
    if now >= auction.end_time {
        return Err(BidRejection::Ended);
    }

    // 3. 입력 검사
    if cmd.bidder_name.trim().is_empty() {
        return Err(BidRejection::InvalidInput {
            field: "bidderName",
            message: "입찰자 이름은 비어 있을 수 없습니다.".to_string(),
        });
    }
    if !is_well_formed_phone(&cmd.phone_number) {
        return Err(BidRejection::InvalidInput {
            field: "phoneNumber",
            message: "전화번호 형식이 올바르지 않습니다.".to_string(),
        });
    }
    if cmd.amount <= Decimal::ZERO {
        return Err(BidRejection::InvalidInput {
            field: "amount",
            message: "입찰 금액은 0보다 커야 합니다.".to_string(),
        });
    }

    // 4. 최소 입찰가 검사 (현재가 + 최소 증가분)
    let minimum = auction.minimum_bid();
    if cmd.amount < minimum {
        return Err(BidRejection::TooLow { minimum });
    }

    Ok(())
}

/// 전화번호 형식 검사: 선행 '+' 허용, 구분자(-, 공백) 제거 후 숫자 7~15자리
pub fn is_well_formed_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = rest.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

// endregion: --- Validator

// region:    --- Tests


// endregion: --- Tests
