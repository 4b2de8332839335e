//! Corpus Model - 토픽 / Q&A 쌍 불변 데이터 모델
//!
//! JSON 문서를 명시적인 스키마(DTO)로 역직렬화한 뒤,
//! 검증을 거쳐 불변 도메인 모델(`Corpus`)로 변환합니다.
//!
//! ```json
//! {
//!   "version": 1,
//!   "topics": [
//!     {
//!       "name": "Atomic Structure",
//!       "description": "Atoms, protons, neutrons and electrons",
//!       "qaPairs": [
//!         { "questions": ["What is an atom?"], "answer": "...", "keywords": ["atom"] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::Deserialize;
use thiserror::Error;

use super::matcher::normalize;

/// 지원하는 코퍼스 스키마 버전
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Errors
// ============================================================================

/// 코퍼스 로드 실패
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read corpus from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed corpus document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported corpus schema version: {0} (expected {})", SCHEMA_VERSION)]
    UnsupportedVersion(u32),

    #[error("Topic #{0} has a blank name")]
    BlankTopicName(usize),

    #[error("Duplicate topic name: {0}")]
    DuplicateTopic(String),

    #[error("Invalid Q&A pair #{index} in topic '{topic}': {reason}")]
    InvalidQaPair {
        topic: String,
        index: usize,
        #[source]
        reason: QaPairError,
    },

    #[error("In-memory corpus has no document to load")]
    NoDocument,

    #[error("Duplicate element symbol: {0}")]
    DuplicateElement(String),
}

/// Q&A 쌍 검증 실패 사유
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QaPairError {
    #[error("no questions")]
    NoQuestions,

    #[error("no question has searchable text")]
    NoSearchableQuestion,

    #[error("blank answer")]
    BlankAnswer,
}

// ============================================================================
// Schema (DTO)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CorpusDoc {
    #[serde(default = "default_version")]
    version: u32,
    topics: Vec<TopicDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicDoc {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    qa_pairs: Vec<QaPairDoc>,
}

#[derive(Debug, Deserialize)]
struct QaPairDoc {
    questions: Vec<String>,
    answer: String,
    #[serde(default)]
    keywords: Vec<String>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

// ============================================================================
// QaPair
// ============================================================================

/// 하나의 질문 개념 단위: 여러 질문 표현 + 하나의 답변 + 키워드 힌트
///
/// 정규화된 질문/키워드는 생성 시 한 번만 계산해 둡니다.
#[derive(Debug, Clone, PartialEq)]
pub struct QaPair {
    questions: Vec<String>,
    answer: String,
    keywords: Vec<String>,
    normalized_questions: Vec<String>,
    normalized_keywords: Vec<String>,
}

impl QaPair {
    /// 새 Q&A 쌍 생성 (검증 포함)
    ///
    /// - 답변은 공백이 아니어야 함
    /// - 정규화 후 빈 질문/키워드는 경고 후 버림 (빈 문자열은 모든 쿼리에 포함되므로)
    /// - 남은 질문이 없으면 에러
    /// - 키워드는 원문 기준 집합: 완전히 같은 문자열만 중복으로 보고 첫 번째만 유지.
    ///   `"pH"`와 `"ph"`처럼 원문이 다르면 둘 다 남아 각각 점수에 반영됨
    pub fn new(questions: Vec<String>, answer: String, keywords: Vec<String>) -> Result<Self, QaPairError> {
        if questions.is_empty() {
            return Err(QaPairError::NoQuestions);
        }
        if answer.trim().is_empty() {
            return Err(QaPairError::BlankAnswer);
        }

        let mut kept_questions = Vec::with_capacity(questions.len());
        let mut normalized_questions = Vec::with_capacity(questions.len());
        for question in questions {
            let normalized = normalize(&question);
            if normalized.is_empty() {
                tracing::warn!("Dropping question with no searchable text: {:?}", question);
                continue;
            }
            kept_questions.push(question);
            normalized_questions.push(normalized);
        }
        if kept_questions.is_empty() {
            return Err(QaPairError::NoSearchableQuestion);
        }

        let mut kept_keywords: Vec<String> = Vec::with_capacity(keywords.len());
        let mut normalized_keywords = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let normalized = normalize(&keyword);
            if normalized.is_empty() {
                tracing::warn!("Dropping keyword with no searchable text: {:?}", keyword);
                continue;
            }
            if kept_keywords.contains(&keyword) {
                continue;
            }
            kept_keywords.push(keyword);
            normalized_keywords.push(normalized);
        }

        Ok(Self {
            questions: kept_questions,
            answer,
            keywords: kept_keywords,
            normalized_questions,
            normalized_keywords,
        })
    }

    /// 질문 표현 목록 (원문)
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// 키워드 목록 (원문, 완전 중복만 제거됨)
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub(crate) fn normalized_questions(&self) -> &[String] {
        &self.normalized_questions
    }

    pub(crate) fn normalized_keywords(&self) -> &[String] {
        &self.normalized_keywords
    }

    /// 대표 질문 (토픽 상세 보기용)
    pub fn primary_question(&self) -> &str {
        &self.questions[0]
    }
}

// ============================================================================
// Topic
// ============================================================================

/// 이름이 있는 Q&A 쌍 그룹
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    name: String,
    description: String,
    qa_pairs: Vec<QaPair>,
}

impl Topic {
    pub fn new(name: impl Into<String>, description: impl Into<String>, qa_pairs: Vec<QaPair>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            qa_pairs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn qa_pairs(&self) -> &[QaPair] {
        &self.qa_pairs
    }
}

// ============================================================================
// Corpus
// ============================================================================

/// 전체 토픽 컬렉션 (프로세스 수명 동안 불변)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    topics: Vec<Topic>,
}

impl Corpus {
    /// 토픽 목록으로 코퍼스 생성
    ///
    /// 토픽 이름은 대소문자 무시 기준으로 유일해야 합니다.
    pub fn new(topics: Vec<Topic>) -> Result<Self, CorpusError> {
        for (i, topic) in topics.iter().enumerate() {
            if topic.name.trim().is_empty() {
                return Err(CorpusError::BlankTopicName(i));
            }
            let duplicate = topics[..i]
                .iter()
                .any(|prev| prev.name.to_lowercase() == topic.name.to_lowercase());
            if duplicate {
                return Err(CorpusError::DuplicateTopic(topic.name.clone()));
            }
        }

        Ok(Self { topics })
    }

    /// 빈 코퍼스
    pub fn empty() -> Self {
        Self::default()
    }

    /// JSON 문서 파싱 + 검증
    ///
    /// 전부 성공하거나 에러를 반환합니다. 부분 코퍼스는 만들지 않습니다.
    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let doc: CorpusDoc = serde_json::from_str(json)?;

        if doc.version != SCHEMA_VERSION {
            return Err(CorpusError::UnsupportedVersion(doc.version));
        }

        let mut topics = Vec::with_capacity(doc.topics.len());
        for topic_doc in doc.topics {
            let mut qa_pairs = Vec::with_capacity(topic_doc.qa_pairs.len());
            for (index, pair) in topic_doc.qa_pairs.into_iter().enumerate() {
                let qa_pair = QaPair::new(pair.questions, pair.answer, pair.keywords).map_err(
                    |reason| CorpusError::InvalidQaPair {
                        topic: topic_doc.name.clone(),
                        index,
                        reason,
                    },
                )?;
                qa_pairs.push(qa_pair);
            }
            topics.push(Topic::new(topic_doc.name, topic_doc.description, qa_pairs));
        }

        Self::new(topics)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// 전체 Q&A 쌍 (토픽 순서 → 토픽 내 순서)
    pub fn qa_pairs(&self) -> impl Iterator<Item = &QaPair> {
        self.topics.iter().flat_map(|t| t.qa_pairs.iter())
    }

    /// 전체 Q&A 쌍 개수
    pub fn qa_pair_count(&self) -> usize {
        self.topics.iter().map(|t| t.qa_pairs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
