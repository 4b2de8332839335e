//! Knowledge 모듈 - 토픽별 Q&A 검색 엔진
//!
//! - Corpus: 토픽 / Q&A 쌍 불변 모델 + JSON 스키마
//! - Store: 코퍼스 스냅샷 소유, 토픽 조회 / 전체 Q&A 순회
//! - Matcher: 키워드 / 문구 스코어링 + 순위
//! - Periodic: 원소 표 + 화학식 몰질량 계산
//! - Engine: 인사 / 감사 / 화학 단축 응답 + 매칭 실패 안내

mod corpus;
mod engine;
mod matcher;
mod periodic;
mod store;

// Re-exports
pub use corpus::{Corpus, CorpusError, QaPair, QaPairError, Topic, SCHEMA_VERSION};
pub use engine::{
    ChemistryQuery, Intent, QueryEngine, EMPTY_INPUT_REPLY, FALLBACK_PREFIX, GREETING_REPLY, THANKS_REPLY,
};
pub use matcher::{normalize, MatchWeights, Matcher, QueryText, ScoredMatch};
pub use periodic::{Component, Element, FormulaError, MolarMass, PeriodicTable};
pub use store::{get_data_dir, CorpusSource, KnowledgeStore, StoreStats, CORPUS_ENV};
