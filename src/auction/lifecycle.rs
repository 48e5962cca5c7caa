/// 경매 상태 전이 규칙
/// ACTIVE -> ENDED      : 종료 시간 경과 (쓰기 경계에서 지연 감지 또는 스케줄러 스윕)
/// ACTIVE -> CANCELLED  : 관리자 취소 또는 차량 가격 유형이 고정가로 전환
/// ACTIVE/ENDED -> SOLD : 관리자 낙찰 처리 (유보가 미달 시 자동 낙찰 금지)
/// ENDED/CANCELLED -> ACTIVE : 관리자 수정으로만 가능하며 종료 시간을 재검증한다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Auction Status

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Active,
    Ended,
    Cancelled,
    Sold,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Ended => "ENDED",
            AuctionStatus::Cancelled => "CANCELLED",
            AuctionStatus::Sold => "SOLD",
        }
    }

    pub fn parse(s: &str) -> Option<AuctionStatus> {
        match s {
            "ACTIVE" => Some(AuctionStatus::Active),
            "ENDED" => Some(AuctionStatus::Ended),
            "CANCELLED" => Some(AuctionStatus::Cancelled),
            "SOLD" => Some(AuctionStatus::Sold),
            _ => None,
        }
    }
}

// endregion: --- Auction Status

// region:    --- Transitions

/// 허용된 상태 전이인지 판정
pub fn can_transition(from: AuctionStatus, to: AuctionStatus) -> bool {
    use AuctionStatus::*;
    match (from, to) {
        (Active, Ended) => true,
        (Active, Cancelled) => true,
        (Active, Sold) | (Ended, Sold) => true,
        // 관리자 수정으로만 재활성화 (종료 시간 재검증은 호출자 몫)
        (Ended, Active) | (Cancelled, Active) => true,
        (a, b) if a == b => true,
        _ => false,
    }
}

/// 종료 시간 경과를 반영한 유효 상태
/// 스윕이 아직 돌지 않았더라도 ACTIVE 경매의 만료를 읽기/쓰기 경계에서 감지한다.
pub fn effective_status(
    status: AuctionStatus,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AuctionStatus {
    if status == AuctionStatus::Active && now >= end_time {
        AuctionStatus::Ended
    } else {
        status
    }
}

// endregion: --- Transitions

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_terminal_transitions() {
        use AuctionStatus::*;
        assert!(can_transition(Active, Ended));
        assert!(can_transition(Active, Cancelled));
        assert!(can_transition(Active, Sold));
        assert!(can_transition(Ended, Sold));
        // 낙찰/취소 상태에서는 낙찰 불가
        assert!(!can_transition(Cancelled, Sold));
        assert!(!can_transition(Sold, Active));
        assert!(!can_transition(Sold, Ended));
        assert!(!can_transition(Ended, Cancelled));
    }

    #[test]
    fn test_reactivation_allowed_from_ended_and_cancelled() {
        assert!(can_transition(AuctionStatus::Ended, AuctionStatus::Active));
        assert!(can_transition(
            AuctionStatus::Cancelled,
            AuctionStatus::Active
        ));
    }

    #[test]
    fn test_effective_status_detects_expiry_lazily() {
        let now = Utc::now();
        let expired = now - Duration::seconds(1);
        let open = now + Duration::hours(1);
        assert_eq!(
            effective_status(AuctionStatus::Active, expired, now),
            AuctionStatus::Ended
        );
        assert_eq!(
            effective_status(AuctionStatus::Active, open, now),
            AuctionStatus::Active
        );
        // 만료는 ACTIVE 상태에만 적용
        assert_eq!(
            effective_status(AuctionStatus::Sold, expired, now),
            AuctionStatus::Sold
        );
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["ACTIVE", "ENDED", "CANCELLED", "SOLD"] {
            assert_eq!(AuctionStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(AuctionStatus::parse("SCHEDULED").is_none());
    }
}

// endregion: --- Tests
