//! Query Engine - 저장소 + 매처 조합
//!
//! 인사 / 감사 단축 응답을 먼저 처리하고, 이어서 원소 조회 / 몰질량 계산 단축
//! 응답을 검사합니다. 나머지 입력은 매처로 최고 점수 Q&A 쌍을 찾습니다.
//! 매칭이 없으면 토픽 목록을 안내하는 기본 응답을 돌려줍니다. 저장소가 비어 있어도
//! 같은 기본 응답이며, 차이는 로그로만 드러납니다.

use std::sync::LazyLock;

use regex::Regex;

use super::matcher::{Matcher, ScoredMatch};
use super::periodic::{Element, FormulaError, MolarMass, PeriodicTable};
use super::store::KnowledgeStore;

/// 빈 입력 응답
pub const EMPTY_INPUT_REPLY: &str = "Please ask me a chemistry question!";
/// 인사 응답
pub const GREETING_REPLY: &str =
    "Hello! I'm here to help you with chemistry questions. What would you like to know?";
/// 감사 응답
pub const THANKS_REPLY: &str = "You're welcome! Feel free to ask more chemistry questions anytime.";

/// 인사 패턴 (소문자 부분 문자열)
const GREETING_PATTERNS: [&str; 6] = [
    "hello",
    "hi",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
];

/// 감사 패턴 (소문자 부분 문자열)
const THANKS_PATTERNS: [&str; 3] = ["thank", "thanks", "appreciate"];

const RULE_WIDTH: usize = 50;

/// 기본 응답 첫 줄
pub const FALLBACK_PREFIX: &str = "I'm not sure about that. Try asking about:\n";

/// "molar mass of <화학식>"
static MOLAR_MASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bmolar\s+mass\s+of\s+([a-z0-9()]+)").expect("Invalid regex")
});
/// "mass of <화학식>", "calculate <화학식>" (화학식이 아니면 일반 질문으로)
static MASS_OF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:mass\s+of|calculate)\s+([a-z0-9()]+)").expect("Invalid regex")
});
static ATOMIC_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\batomic\s+number\s+of\s+(?:the\s+element\s+)?([a-z]+)").expect("Invalid regex")
});
/// "tell me about <원소>", "what is <원소>", "element <원소>", 또는 원소 이름/기호만
static ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:tell\s+me\s+about|what\s+is|what's|element)\s+(?:the\s+element\s+)?)?([a-z]+)\s*[?.!]*$",
    )
    .expect("Invalid regex")
});

// ============================================================================
// Intent
// ============================================================================

/// 입력 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// 공백뿐인 입력
    Empty,
    Greeting,
    Thanks,
    /// 화학 단축 응답 또는 매처로 보낼 질문
    Question,
}

impl Intent {
    /// 입력 분류 (인사 → 감사 순서로 검사)
    pub fn detect(input: &str) -> Self {
        let lower = input.trim().to_lowercase();
        if lower.is_empty() {
            return Intent::Empty;
        }
        if GREETING_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Intent::Greeting;
        }
        if THANKS_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Intent::Thanks;
        }
        Intent::Question
    }
}

// ============================================================================
// Chemistry Shortcuts
// ============================================================================

/// 매칭 전에 처리하는 화학 질의
#[derive(Debug, Clone, PartialEq)]
pub enum ChemistryQuery<'t> {
    /// 원소 정보
    Element(&'t Element),
    /// 원자 번호 질문
    AtomicNumber(&'t Element),
    MolarMass(MolarMass),
    /// "molar mass of" 뒤의 화학식을 계산할 수 없음
    InvalidFormula { formula: String, error: FormulaError },
}

impl<'t> ChemistryQuery<'t> {
    /// 몰질량 → 원자 번호 → 원소 순서로 검사
    ///
    /// 원소 표에서 찾을 수 없으면 `None` (일반 질문으로 매칭)
    pub fn detect(input: &str, table: &'t PeriodicTable) -> Option<Self> {
        let input = input.trim();

        if let Some(formula) = capture(&MOLAR_MASS_RE, input) {
            return Some(match table.molar_mass(formula) {
                Ok(mass) => ChemistryQuery::MolarMass(mass),
                Err(error) => ChemistryQuery::InvalidFormula {
                    formula: formula.to_string(),
                    error,
                },
            });
        }

        if let Some(formula) = capture(&MASS_OF_RE, input) {
            match table.molar_mass(formula) {
                Ok(mass) => return Some(ChemistryQuery::MolarMass(mass)),
                Err(e) => tracing::debug!("{:?} is not a formula ({})", formula, e),
            }
        }

        if let Some(element) = capture(&ATOMIC_NUMBER_RE, input).and_then(|name| table.find(name)) {
            return Some(ChemistryQuery::AtomicNumber(element));
        }

        capture(&ELEMENT_RE, input)
            .and_then(|name| table.find(name))
            .map(ChemistryQuery::Element)
    }

    /// 응답 텍스트
    pub fn reply(&self) -> String {
        let rule = "─".repeat(RULE_WIDTH);

        match self {
            ChemistryQuery::Element(element) => {
                let mut out = format!("Element: {} ({})\n{}\n", element.name, element.symbol, rule);
                out.push_str(&format!("Atomic Number: {}\n", element.atomic_number));
                out.push_str(&format!("Atomic Mass: {:.3} u\n", element.atomic_mass));
                out.push_str(&format!("Category: {}\n", element.category));
                if !element.description.is_empty() {
                    out.push_str(&format!("Description: {}\n", element.description));
                }
                out.push_str(&rule);
                out
            }
            ChemistryQuery::AtomicNumber(element) => format!(
                "The atomic number of {} ({}) is {}.",
                element.name, element.symbol, element.atomic_number
            ),
            ChemistryQuery::MolarMass(mass) => {
                let mut out = format!("Molar Mass Calculation for {}\n{}\n", mass.formula, rule);
                for c in &mass.components {
                    out.push_str(&format!("{}: {} × {:.3} u\n", c.symbol, c.count, c.atomic_mass));
                }
                out.push_str(&rule);
                out.push_str(&format!("\nTotal Molar Mass: {:.3} g/mol", mass.total()));
                out
            }
            ChemistryQuery::InvalidFormula { formula, error } => {
                format!("I couldn't calculate the molar mass of {}: {}.", formula, error)
            }
        }
    }
}

fn capture<'i>(re: &Regex, input: &'i str) -> Option<&'i str> {
    re.captures(input).and_then(|c| c.get(1)).map(|m| m.as_str())
}

// ============================================================================
// QueryEngine
// ============================================================================

/// 질의 엔진
pub struct QueryEngine {
    store: KnowledgeStore,
    matcher: Matcher,
    table: PeriodicTable,
}

impl QueryEngine {
    /// 기본 가중치 매처로 생성
    pub fn new(store: KnowledgeStore) -> Self {
        Self::with_matcher(store, Matcher::default())
    }

    pub fn with_matcher(store: KnowledgeStore, matcher: Matcher) -> Self {
        Self {
            store,
            matcher,
            table: PeriodicTable::embedded(),
        }
    }

    /// 원소 표 교체
    pub fn with_table(mut self, table: PeriodicTable) -> Self {
        self.table = table;
        self
    }

    /// 자유 입력에 대한 응답
    pub fn answer(&self, input: &str) -> String {
        match Intent::detect(input) {
            Intent::Empty => EMPTY_INPUT_REPLY.to_string(),
            Intent::Greeting => GREETING_REPLY.to_string(),
            Intent::Thanks => THANKS_REPLY.to_string(),
            Intent::Question => {
                let question = input.trim();
                if let Some(query) = ChemistryQuery::detect(question, &self.table) {
                    tracing::debug!("Chemistry shortcut for {:?}", question);
                    return query.reply();
                }

                let best = self.matcher.rank(question, self.store.all_qa_pairs(), 1);

                match best.first() {
                    Some(m) => {
                        tracing::debug!("Matched pair #{} (score={:.1}) for {:?}", m.index, m.score, question);
                        m.pair.answer().to_string()
                    }
                    None => {
                        if self.store.is_empty() {
                            tracing::warn!("No knowledge loaded; cannot answer {:?}", question);
                        } else {
                            tracing::debug!("No match for {:?}", question);
                        }
                        self.no_match_response()
                    }
                }
            }
        }
    }

    /// 점수 포함 상위 매칭 결과
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredMatch<'_>> {
        self.matcher.rank(query, self.store.all_qa_pairs(), limit)
    }

    /// 전체 토픽 요약
    pub fn topics_summary(&self) -> String {
        let topics = self.store.all_topics();
        if topics.is_empty() {
            return "No topics are loaded.".to_string();
        }

        let mut out = String::new();
        out.push_str("Available Topics:\n");
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");

        for (i, topic) in topics.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, topic.name()));
            if !topic.description().is_empty() {
                out.push_str(&format!("   {}\n", topic.description()));
            }
            out.push_str(&format!("   ({} Q&A pairs)\n\n", topic.qa_pairs().len()));
        }

        out
    }

    /// 토픽 상세 (대표 질문 목록)
    ///
    /// 토픽이 없으면 `None`
    pub fn topic_detail(&self, name: &str) -> Option<String> {
        let topic = self.store.topic_by_name(name)?;

        let mut out = String::new();
        out.push_str(&format!("Topic: {}\n", topic.name()));
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push('\n');
        if !topic.description().is_empty() {
            out.push_str(topic.description());
            out.push('\n');
        }

        if !topic.qa_pairs().is_empty() {
            out.push_str("\nSample Questions:\n\n");
            for (i, pair) in topic.qa_pairs().iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, pair.primary_question()));
            }
        }

        Some(out)
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn table(&self) -> &PeriodicTable {
        &self.table
    }

    /// 매칭 실패 시 기본 응답
    ///
    /// 저장소가 비어 있어도 같은 형식 (토픽 항목만 없음)
    fn no_match_response(&self) -> String {
        let mut out = String::from(FALLBACK_PREFIX);
        for topic in self.store.all_topics() {
            if topic.description().is_empty() {
                out.push_str(&format!("  • {}\n", topic.name()));
            } else {
                out.push_str(&format!("  • {} ({})\n", topic.name(), topic.description()));
            }
        }
        if !self.table.is_empty() {
            out.push_str("  • An element (e.g. 'tell me about Oxygen')\n");
            out.push_str("  • Molar mass (e.g. 'molar mass of H2O')\n");
        }
        out.push_str("Type 'topics' to see all available topics.");
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
