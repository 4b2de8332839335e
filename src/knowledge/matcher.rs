//! Matcher - 키워드 / 문구 기반 Q&A 스코어링
//!
//! 질의 문자열을 모든 Q&A 쌍과 비교해 관련도 점수를 매기고 순위를 냅니다.
//!
//! 점수 규칙 (합산):
//! 1. 저장된 질문과 정규화 결과가 완전히 같으면 즉시 1000
//! 2. 저장된 질문 ⊂ 질의 또는 질의 ⊂ 저장된 질문: 질문마다 +500
//! 3. 키워드가 질의의 부분 문자열이면 +50
//! 4. 키워드 × 질의 단어(3자 이상): 일치 +30, 부분 포함 +10
//! 5. 저장된 질문 토큰 × 질의 단어(4자 이상): 일치하는 토큰마다 +5
//!
//! 점수가 0 이하인 쌍은 결과에서 제외합니다.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use super::corpus::QaPair;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("Invalid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// 키워드 단어 비교에 쓰는 질의 단어 최소 길이 (초과)
const KEYWORD_WORD_MIN_LEN: usize = 2;
/// 질문 토큰 비교에 쓰는 질의 단어 최소 길이 (초과)
const QUESTION_WORD_MIN_LEN: usize = 3;

// ============================================================================
// Normalization
// ============================================================================

/// 텍스트 정규화
///
/// 소문자 변환 → `[a-z0-9]`와 공백 외 문자를 공백으로 → 연속 공백 축약 → trim
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_ALNUM_RE.replace_all(&lower, " ");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// 정규화된 질의 + 단어 토큰
#[derive(Debug, Clone, PartialEq)]
pub struct QueryText {
    normalized: String,
    words: Vec<String>,
}

impl QueryText {
    /// 질의 파싱
    ///
    /// 정규화 결과가 비어 있으면 (공백, 문장부호만) `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return None;
        }

        let words = normalized.split(' ').map(str::to_string).collect();
        Some(Self { normalized, words })
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

// ============================================================================
// Weights
// ============================================================================

/// 규칙별 가중치
#[derive(Debug, Clone, PartialEq)]
pub struct MatchWeights {
    /// 질문 완전 일치 (단락 평가)
    pub exact_question: f64,
    /// 질문 ↔ 질의 부분 문자열 포함
    pub question_phrase: f64,
    /// 키워드가 질의 안에 포함
    pub keyword_phrase: f64,
    /// 키워드 == 질의 단어
    pub keyword_word_exact: f64,
    /// 키워드 ↔ 질의 단어 부분 포함
    pub keyword_word_partial: f64,
    /// 질문 토큰 == 질의 단어
    pub question_word: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            exact_question: 1000.0,
            question_phrase: 500.0,
            keyword_phrase: 50.0,
            keyword_word_exact: 30.0,
            keyword_word_partial: 10.0,
            question_word: 5.0,
        }
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// 스코어가 매겨진 매칭 결과
#[derive(Debug, Clone, Copy)]
pub struct ScoredMatch<'a> {
    /// 후보 목록 안에서의 원래 위치 (동점 처리 기준)
    pub index: usize,
    pub score: f64,
    pub pair: &'a QaPair,
}

/// Q&A 매처
///
/// 상태가 없으므로 여러 질의에서 공유해도 됩니다.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    weights: MatchWeights,
}

impl Matcher {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    /// 단일 Q&A 쌍 스코어 계산
    pub fn score(&self, query: &QueryText, pair: &QaPair) -> f64 {
        let w = &self.weights;
        let questions = pair.normalized_questions();

        // 1. 완전 일치
        if questions.iter().any(|q| *q == query.normalized) {
            return w.exact_question;
        }

        let mut score = 0.0;

        // 2. 문구 포함
        for question in questions {
            if question.contains(query.normalized.as_str())
                || query.normalized.contains(question.as_str())
            {
                score += w.question_phrase;
            }
        }

        // 3, 4. 키워드
        for keyword in pair.normalized_keywords() {
            if query.normalized.contains(keyword.as_str()) {
                score += w.keyword_phrase;
            }

            for word in query.words.iter().filter(|word| word.len() > KEYWORD_WORD_MIN_LEN) {
                if word == keyword {
                    score += w.keyword_word_exact;
                } else if keyword.contains(word.as_str()) || word.contains(keyword.as_str()) {
                    score += w.keyword_word_partial;
                }
            }
        }

        // 5. 질문 토큰
        for question in questions {
            for word in query.words.iter().filter(|word| word.len() > QUESTION_WORD_MIN_LEN) {
                let hits = question.split(' ').filter(|token| *token == word.as_str()).count();
                score += w.question_word * hits as f64;
            }
        }

        score
    }

    /// 점수 순 상위 `limit`개 (점수 포함)
    ///
    /// 양수 점수만 남긴 뒤 안정 정렬하므로 동점은 입력 순서를 따릅니다.
    pub fn rank<'a, I>(&self, query: &str, pairs: I, limit: usize) -> Vec<ScoredMatch<'a>>
    where
        I: IntoIterator<Item = &'a QaPair>,
    {
        let Some(query) = QueryText::parse(query) else {
            return Vec::new();
        };

        let mut scored: Vec<ScoredMatch<'a>> = pairs
            .into_iter()
            .enumerate()
            .filter_map(|(index, pair)| {
                let score = self.score(&query, pair);
                (score > 0.0).then_some(ScoredMatch { index, score, pair })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    /// 상위 `limit`개 Q&A 쌍
    pub fn find_matches<'a, I>(&self, query: &str, pairs: I, limit: usize) -> Vec<&'a QaPair>
    where
        I: IntoIterator<Item = &'a QaPair>,
    {
        self.rank(query, pairs, limit)
            .into_iter()
            .map(|m| m.pair)
            .collect()
    }

    /// 최고 점수 Q&A 쌍
    pub fn find_best_match<'a, I>(&self, query: &str, pairs: I) -> Option<&'a QaPair>
    where
        I: IntoIterator<Item = &'a QaPair>,
    {
        self.find_matches(query, pairs, 1).into_iter().next()
    }
}

// ============================================================================
// Tests
// ============================================================================
