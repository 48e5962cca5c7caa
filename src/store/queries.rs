/// 경매 행 잠금 조회 (읽기-검증-쓰기 시퀀스는 이 행 잠금 아래에서만 진행)
pub const GET_AUCTION_FOR_UPDATE: &str = r#"
    SELECT id, car_id, starting_price, reserve_price, current_price, min_increment, end_time, status, created_at
    FROM auctions
    WHERE id = $1
    FOR UPDATE
"#;

/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, car_id, starting_price, reserve_price, current_price, min_increment, end_time, status, created_at FROM auctions WHERE id = $1";

/// 경매 목록 조회 (상태 필터, 페이지네이션)
pub const LIST_AUCTIONS: &str = r#"
    SELECT id, car_id, starting_price, reserve_price, current_price, min_increment, end_time, status, created_at
    FROM auctions
    WHERE ($1::text IS NULL OR status = $1)
      AND (NOT $2 OR (status = 'ACTIVE' AND end_time > now()))
    ORDER BY created_at DESC
    LIMIT $3 OFFSET $4
"#;

/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (car_id, starting_price, reserve_price, current_price, min_increment, end_time, status)
    VALUES ($1, $2, $3, $2, $4, $5, 'ACTIVE')
    RETURNING id, car_id, starting_price, reserve_price, current_price, min_increment, end_time, status, created_at
"#;

/// 입찰 이력 조회 (금액 내림차순, 동액은 접수 시각 오름차순)
pub const LIST_BIDS: &str = r#"
    SELECT id, auction_id, bidder_name, bidder_phone, amount, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, created_at ASC
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_name, bidder_phone, amount, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, auction_id, bidder_name, bidder_phone, amount, created_at
"#;

/// 현재가 갱신
pub const UPDATE_CURRENT_PRICE: &str = "UPDATE auctions SET current_price = $1 WHERE id = $2";

/// 경매 상태 갱신
pub const UPDATE_STATUS: &str = "UPDATE auctions SET status = $1 WHERE id = $2";

/// 입찰 조회 (소속 경매 확인 포함)
pub const GET_BID: &str = "SELECT id, auction_id, bidder_name, bidder_phone, amount, created_at FROM bids WHERE id = $1 AND auction_id = $2";

/// 입찰 삭제
pub const DELETE_BID: &str = "DELETE FROM bids WHERE id = $1";

/// 남은 최고 입찰가 조회 (삭제 후 현재가 재계산)
pub const GET_HIGHEST_REMAINING_BID: &str =
    "SELECT MAX(amount) AS highest FROM bids WHERE auction_id = $1";

/// 입찰 수 조회
pub const COUNT_BIDS: &str = "SELECT COUNT(*) AS bid_count FROM bids WHERE auction_id = $1";

/// 경매 조건 갱신
pub const UPDATE_TERMS: &str = r#"
    UPDATE auctions
    SET end_time = $1, status = $2, reserve_price = $3, min_increment = $4
    WHERE id = $5
    RETURNING id, car_id, starting_price, reserve_price, current_price, min_increment, end_time, status, created_at
"#;

/// 경매 삭제 (입찰은 FK CASCADE로 함께 삭제)
pub const DELETE_AUCTION: &str = "DELETE FROM auctions WHERE id = $1";

/// 만료된 ACTIVE 경매를 ENDED로 스윕
pub const SWEEP_EXPIRED: &str =
    "UPDATE auctions SET status = 'ENDED' WHERE status = 'ACTIVE' AND end_time <= $1";
