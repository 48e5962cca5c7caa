/// 경매 단위 직렬화기
/// 같은 경매에 대한 "스냅샷 읽기 -> 검증 -> 쓰기"가 한 번에 하나만 진행되도록 보장한다.
/// 서로 다른 경매는 완전히 병렬로 진행된다.
///
/// 잠금은 경매 ID별로 지연 생성되는 `Arc<Mutex<()>>` 아레나이며, 대기자가 없으면 회수된다.
/// tokio의 공정(fair) 뮤텍스를 사용하므로 대기자는 도착 순서(FIFO)로 서비스된다.
/// 구별 불가능한 시각에 도착한 두 요청의 순서만이 허용된 유일한 비결정성이다.
// region:    --- Imports
use crate::error::{AuctionError, AuctionResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::debug;

// endregion: --- Imports

// region:    --- Auction Serializer

pub type AuctionLock = Arc<Mutex<()>>;

pub struct AuctionSerializer {
    locks: StdMutex<HashMap<i64, AuctionLock>>,
    acquire_timeout: Duration,
}

impl Default for AuctionSerializer {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl AuctionSerializer {
    pub fn new(acquire_timeout: Duration) -> Self {
        Self {
            locks: StdMutex::new(HashMap::new()),
            acquire_timeout,
        }
    }

    /// 해당 경매의 잠금 핸들을 가져오거나 생성
    fn handle(&self, auction_id: i64) -> AuctionLock {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(locks.entry(auction_id).or_default())
    }

    /// 대기자가 더 이상 없으면 아레나에서 핸들 회수
    fn reap(&self, auction_id: i64) {
        let mut locks = self.locks.lock().unwrap();
        if let Some(lock) = locks.get(&auction_id) {
            // 아레나가 보유한 참조 하나뿐이면 제거
            if Arc::strong_count(lock) == 1 {
                locks.remove(&auction_id);
                debug!("{:<12} --> 잠금 회수 id: {}", "Serializer", auction_id);
            }
        }
    }

    /// 해당 경매의 배타 구간에서 `fut` 실행.
    /// 잠금 획득이 시간 내에 끝나지 않으면 아무것도 적용하지 않고 `LockTimeout`을 돌려준다.
    /// 이미 시작된 검증-쓰기 시퀀스는 끝까지 완료된다 (되돌리지 않는다).
    pub async fn with_auction<T, Fut>(
        &self,
        auction_id: i64,
        fut: Fut,
    ) -> AuctionResult<T>
    where
        Fut: Future<Output = AuctionResult<T>>,
    {
        let lock = self.handle(auction_id);
        let result = match timeout(self.acquire_timeout, lock.lock()).await {
            Ok(guard) => {
                let result = fut.await;
                drop(guard);
                result
            }
            Err(_) => Err(AuctionError::LockTimeout),
        };
        drop(lock);
        self.reap(auction_id);
        result
    }

    /// 현재 아레나에 남아 있는 잠금 수 (테스트/진단용)
    pub fn lock_count(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

// endregion: --- Auction Serializer

// region:    --- Tests


// endregion: --- Tests
