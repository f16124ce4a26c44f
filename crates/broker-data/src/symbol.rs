//! 종목 심볼 인덱스.
//!
//! 네 개의 맵(국내 코드/국내 종목명/해외 심볼/해외 종목명)을
//! `tokio::sync::RwLock` 뒤에 두고 프로세스 전역에서 공유합니다.
//! 조회는 동시에, 삽입은 쓰기 락을 통해 이루어집니다.

use crate::error::DataError;
use crate::provider::SymbolLookupProvider;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// 종목이 속한 시장 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolMarket {
    /// 국내 (KRX)
    Domestic,
    /// 해외 (미국)
    Overseas,
}

/// 해석된 종목 엔트리.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// 종목코드 (국내: 6자리 숫자, 해외: 티커 심볼)
    pub code: String,
    /// 종목명
    pub name: String,
    /// 시장 구분
    pub market: SymbolMarket,
    /// 거래소 코드 (해외 전용, 예: "NAS")
    pub exchange: Option<String>,
}

impl SymbolEntry {
    /// 국내 종목 엔트리 생성.
    pub fn domestic(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            market: SymbolMarket::Domestic,
            exchange: None,
        }
    }

    /// 해외 종목 엔트리 생성.
    pub fn overseas(
        code: impl Into<String>,
        name: impl Into<String>,
        exchange: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            market: SymbolMarket::Overseas,
            exchange: Some(exchange.into()),
        }
    }
}

#[derive(Default)]
struct Maps {
    domestic_by_code: HashMap<String, SymbolEntry>,
    domestic_by_name: HashMap<String, SymbolEntry>,
    overseas_by_symbol: HashMap<String, SymbolEntry>,
    overseas_by_name: HashMap<String, SymbolEntry>,
}

impl Maps {
    /// 이미 있는 키는 덮어쓰지 않는다.
    fn insert(&mut self, entry: SymbolEntry) {
        match entry.market {
            SymbolMarket::Domestic => {
                self.domestic_by_name
                    .entry(entry.name.to_lowercase())
                    .or_insert_with(|| entry.clone());
                self.domestic_by_code
                    .entry(entry.code.clone())
                    .or_insert(entry);
            }
            SymbolMarket::Overseas => {
                self.overseas_by_name
                    .entry(entry.name.to_lowercase())
                    .or_insert_with(|| entry.clone());
                self.overseas_by_symbol
                    .entry(entry.code.to_uppercase())
                    .or_insert(entry);
            }
        }
    }

    fn lookup(&self, keyword: &str) -> Option<&SymbolEntry> {
        // 조회 순서: 국내 코드 → 국내 종목명 → 해외 심볼 → 해외 종목명
        if let Some(entry) = self.domestic_by_code.get(keyword) {
            return Some(entry);
        }
        let lowered = keyword.to_lowercase();
        if let Some(entry) = self.domestic_by_name.get(&lowered) {
            return Some(entry);
        }
        if let Some(entry) = self.overseas_by_symbol.get(&keyword.to_uppercase()) {
            return Some(entry);
        }
        self.overseas_by_name.get(&lowered)
    }
}

/// 프로세스 전역 종목 심볼 인덱스.
///
/// 내장 시드 목록으로 초기화되며, 인덱스에 없는 키워드는 설정된 경우
/// 외부 조회 소스로 1회 조회 후 결과를 캐시합니다. 외부 소스 실패는
/// 미해석(NotFound)으로만 이어지며 인덱스 자체는 영향받지 않습니다.
pub struct SymbolIndex {
    maps: RwLock<Maps>,
    provider: Option<Arc<dyn SymbolLookupProvider>>,
}

impl SymbolIndex {
    /// 시드 목록만으로 인덱스 생성.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// 외부 조회 소스를 포함한 인덱스 생성.
    pub fn with_provider(provider: Arc<dyn SymbolLookupProvider>) -> Self {
        Self::build(Some(provider))
    }

    fn build(provider: Option<Arc<dyn SymbolLookupProvider>>) -> Self {
        let mut maps = Maps::default();
        for entry in seed_entries() {
            maps.insert(entry);
        }
        Self {
            maps: RwLock::new(maps),
            provider,
        }
    }

    /// 엔트리 삽입. 기존 키는 유지됩니다.
    pub async fn insert(&self, entry: SymbolEntry) {
        self.maps.write().await.insert(entry);
    }

    /// 키워드를 종목 엔트리로 해석.
    ///
    /// 인덱스에서 해석되지 않으면 외부 소스를 1회 조회하고, 첫 번째
    /// 결과를 캐시한 뒤 반환합니다.
    pub async fn search(&self, keyword: &str) -> Result<SymbolEntry, DataError> {
        if let Some(entry) = self.maps.read().await.lookup(keyword) {
            return Ok(entry.clone());
        }

        if let Some(provider) = &self.provider {
            match provider.lookup(keyword).await {
                Ok(results) => {
                    if let Some(first) = results.into_iter().next() {
                        debug!("symbol cache miss resolved externally: {}", keyword);
                        self.insert(first.clone()).await;
                        return Ok(first);
                    }
                }
                Err(e) => {
                    warn!("external symbol lookup failed for '{}': {}", keyword, e);
                }
            }
        }

        Err(DataError::NotFound {
            keyword: keyword.to_string(),
        })
    }

    /// 인기 종목 키워드를 선조회해 캐시를 채웁니다.
    ///
    /// 기동 시 호출합니다. 개별 조회 실패는 로그만 남기고 넘어가며,
    /// 해석에 성공한 키워드 수를 반환합니다.
    pub async fn warm_up(&self) -> usize {
        let mut resolved = 0;
        for keyword in WARM_UP_KEYWORDS {
            match self.search(keyword).await {
                Ok(_) => resolved += 1,
                Err(e) => debug!("warm-up lookup skipped for '{}': {}", keyword, e),
            }
        }
        resolved
    }

    /// 캐시된 엔트리 수 (국내 코드 + 해외 심볼 기준).
    pub async fn len(&self) -> usize {
        let maps = self.maps.read().await;
        maps.domestic_by_code.len() + maps.overseas_by_symbol.len()
    }

    /// 인덱스가 비어 있는지 여부.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// 기동 시 선조회할 인기 종목 키워드.
///
/// 시드 목록에 없는 국내 대형주 위주로, 첫 사용자 조회 전에 외부
/// 소스에서 미리 채워둡니다.
const WARM_UP_KEYWORDS: [&str; 12] = [
    "현대차",
    "기아",
    "카카오",
    "LG에너지솔루션",
    "삼성바이오로직스",
    "셀트리온",
    "POSCO홀딩스",
    "KB금융",
    "신한지주",
    "삼성SDI",
    "LG화학",
    "현대모비스",
];

impl Default for SymbolIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// 내장 시드 목록.
///
/// 외부 소스 없이도 주요 종목은 해석 가능해야 합니다.
fn seed_entries() -> Vec<SymbolEntry> {
    vec![
        SymbolEntry::domestic("005930", "삼성전자"),
        SymbolEntry::domestic("000660", "SK하이닉스"),
        SymbolEntry::domestic("035420", "NAVER"),
        SymbolEntry::overseas("AAPL", "Apple", "NAS"),
        SymbolEntry::overseas("MSFT", "Microsoft", "NAS"),
        SymbolEntry::overseas("GOOGL", "Alphabet", "NAS"),
        SymbolEntry::overseas("AMZN", "Amazon", "NAS"),
        SymbolEntry::overseas("TSLA", "Tesla", "NAS"),
        SymbolEntry::overseas("META", "Meta Platforms", "NAS"),
        SymbolEntry::overseas("NVDA", "NVIDIA", "NAS"),
        SymbolEntry::overseas("AMD", "Advanced Micro Devices", "NAS"),
        SymbolEntry::overseas("NFLX", "Netflix", "NAS"),
        SymbolEntry::overseas("DIS", "Walt Disney", "NYS"),
    ]
}
