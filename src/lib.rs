//! chembot - 토픽별 Q&A 코퍼스 기반 챗봇
//!
//! 자유 질문을 고정된 Q&A 코퍼스와 키워드 / 문구 매칭으로 비교해
//! 가장 점수가 높은 답변을 돌려줍니다.

pub mod cli;
pub mod knowledge;

// Re-exports
pub use knowledge::{
    ChemistryQuery, Corpus, CorpusError, CorpusSource, Element, FormulaError, Intent, KnowledgeStore,
    MatchWeights, Matcher, MolarMass, PeriodicTable, QaPair, QaPairError, QueryEngine, QueryText,
    ScoredMatch, StoreStats, Topic, get_data_dir, normalize,
};
