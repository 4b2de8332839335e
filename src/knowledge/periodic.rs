//! Periodic Table - 원소 조회 + 화학식 몰질량 계산
//!
//! 내장 원소 표(`data/elements.json`)를 코퍼스와 같은 방식(버전이 있는 JSON → 검증)으로
//! 로드합니다. 화학식은 괄호와 개수를 지원합니다: `H2O`, `Ca(OH)2`, `Al2(SO4)3`.
//!
//! 대문자가 하나도 없는 입력(`nacl`, `h2o`)은 원소 표에 있는 두 글자 기호를 우선으로
//! 나눕니다 (`nacl` → `NaCl`, `co2` → `CO2`).

use serde::Deserialize;
use thiserror::Error;

use super::corpus::{CorpusError, SCHEMA_VERSION};

/// 내장 원소 표
const EMBEDDED_ELEMENTS: &str = include_str!("../../data/elements.json");

// ============================================================================
// Errors
// ============================================================================

/// 화학식 파싱 / 계산 실패
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("element '{0}' not found in database")]
    UnknownElement(String),

    #[error("invalid atom count '{0}'")]
    InvalidCount(String),

    #[error("atom count is too large")]
    CountOverflow,
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ElementTableDoc {
    #[serde(default = "default_version")]
    version: u32,
    elements: Vec<Element>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

/// 원소 정보
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub symbol: String,
    pub name: String,
    pub atomic_number: u32,
    /// 원자량 (u)
    pub atomic_mass: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// 몰질량 계산의 원소별 항목
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub symbol: String,
    pub count: u32,
    pub atomic_mass: f64,
}

impl Component {
    pub fn mass(&self) -> f64 {
        self.atomic_mass * f64::from(self.count)
    }
}

/// 몰질량 계산 결과
#[derive(Debug, Clone, PartialEq)]
pub struct MolarMass {
    /// 기호 대소문자를 바로잡은 화학식
    pub formula: String,
    /// 원소별 항목 (화학식에 처음 나온 순서)
    pub components: Vec<Component>,
}

impl MolarMass {
    /// 총 몰질량 (g/mol)
    pub fn total(&self) -> f64 {
        self.components.iter().map(Component::mass).sum()
    }
}

// ============================================================================
// PeriodicTable
// ============================================================================

/// 원소 표 (읽기 전용)
#[derive(Debug, Clone, Default)]
pub struct PeriodicTable {
    elements: Vec<Element>,
}

impl PeriodicTable {
    /// JSON 문서 파싱 + 검증 (기호 중복 금지)
    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let doc: ElementTableDoc = serde_json::from_str(json)?;

        if doc.version != SCHEMA_VERSION {
            return Err(CorpusError::UnsupportedVersion(doc.version));
        }

        for (i, element) in doc.elements.iter().enumerate() {
            if doc.elements[..i].iter().any(|prev| prev.symbol == element.symbol) {
                return Err(CorpusError::DuplicateElement(element.symbol.clone()));
            }
        }

        Ok(Self { elements: doc.elements })
    }

    /// 내장 원소 표 (실패 시 빈 표)
    pub fn embedded() -> Self {
        match Self::from_json(EMBEDDED_ELEMENTS) {
            Ok(table) => table,
            Err(e) => {
                tracing::error!("Error loading element table: {}", e);
                Self::default()
            }
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 기호로 조회 (대소문자 구분)
    pub fn by_symbol(&self, symbol: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.symbol == symbol)
    }

    /// 기호(대소문자 구분) 또는 이름(대소문자 무시)으로 조회
    ///
    /// 기호를 대소문자 구분으로 비교하므로 "i", "he" 같은 일반 단어는 원소로 보지 않습니다.
    pub fn find(&self, text: &str) -> Option<&Element> {
        let text = text.trim();
        self.by_symbol(text)
            .or_else(|| self.elements.iter().find(|e| e.name.eq_ignore_ascii_case(text)))
    }

    /// 화학식의 몰질량 계산
    pub fn molar_mass(&self, formula: &str) -> Result<MolarMass, FormulaError> {
        let (formula, counts) = FormulaParser::new(self, formula).parse()?;

        let mut components = Vec::with_capacity(counts.len());
        for (symbol, count) in counts {
            let element = self
                .by_symbol(&symbol)
                .ok_or_else(|| FormulaError::UnknownElement(symbol.clone()))?;
            components.push(Component {
                symbol,
                count,
                atomic_mass: element.atomic_mass,
            });
        }

        Ok(MolarMass { formula, components })
    }
}

// ============================================================================
// Formula Parser
// ============================================================================

/// 재귀 하강 화학식 파서
///
/// ```text
/// formula := part+
/// part    := symbol count? | '(' formula ')' count?
/// ```
struct FormulaParser<'a> {
    table: &'a PeriodicTable,
    chars: Vec<char>,
    pos: usize,
    /// 대문자 없는 입력: 원소 표 기준으로 기호 분리
    lowercase: bool,
    canonical: String,
}

impl<'a> FormulaParser<'a> {
    fn new(table: &'a PeriodicTable, text: &str) -> Self {
        let chars: Vec<char> = text.trim().chars().collect();
        let lowercase = !chars.iter().any(|c| c.is_ascii_uppercase());
        Self {
            table,
            chars,
            pos: 0,
            lowercase,
            canonical: String::new(),
        }
    }

    fn parse(mut self) -> Result<(String, Vec<(String, u32)>), FormulaError> {
        if self.chars.is_empty() {
            return Err(FormulaError::Empty);
        }

        let counts = self.parse_sequence()?;
        // 시퀀스는 ')' 에서만 멈춤
        if self.pos < self.chars.len() {
            return Err(FormulaError::UnbalancedParentheses);
        }
        if counts.is_empty() {
            return Err(FormulaError::Empty);
        }

        Ok((self.canonical, counts))
    }

    fn parse_sequence(&mut self) -> Result<Vec<(String, u32)>, FormulaError> {
        let mut counts = Vec::new();

        while let Some(&c) = self.chars.get(self.pos) {
            match c {
                '(' => {
                    self.pos += 1;
                    self.canonical.push('(');
                    let inner = self.parse_sequence()?;
                    if self.chars.get(self.pos) != Some(&')') {
                        return Err(FormulaError::UnbalancedParentheses);
                    }
                    self.pos += 1;
                    self.canonical.push(')');
                    if inner.is_empty() {
                        return Err(FormulaError::Empty);
                    }

                    let n = self.parse_count()?;
                    for (symbol, count) in inner {
                        let total = count.checked_mul(n).ok_or(FormulaError::CountOverflow)?;
                        add_count(&mut counts, symbol, total)?;
                    }
                }
                ')' => break,
                c if c.is_ascii_alphabetic() => {
                    let symbol = self.parse_symbol(c)?;
                    let n = self.parse_count()?;
                    add_count(&mut counts, symbol, n)?;
                }
                other => return Err(FormulaError::UnexpectedChar(other)),
            }
        }

        Ok(counts)
    }

    fn parse_symbol(&mut self, first: char) -> Result<String, FormulaError> {
        let symbol = if self.lowercase {
            // 두 글자 기호 우선
            let two_letter = self
                .chars
                .get(self.pos + 1)
                .filter(|c| c.is_ascii_lowercase())
                .map(|&second| format!("{}{}", first.to_ascii_uppercase(), second))
                .filter(|candidate| self.table.by_symbol(candidate).is_some());

            match two_letter {
                Some(symbol) => {
                    self.pos += 2;
                    symbol
                }
                None => {
                    self.pos += 1;
                    first.to_ascii_uppercase().to_string()
                }
            }
        } else {
            if !first.is_ascii_uppercase() {
                return Err(FormulaError::UnexpectedChar(first));
            }
            let mut symbol = first.to_string();
            self.pos += 1;
            if let Some(&next) = self.chars.get(self.pos) {
                if next.is_ascii_lowercase() {
                    symbol.push(next);
                    self.pos += 1;
                }
            }
            symbol
        };

        if self.table.by_symbol(&symbol).is_none() {
            return Err(FormulaError::UnknownElement(symbol));
        }

        self.canonical.push_str(&symbol);
        Ok(symbol)
    }

    /// 숫자가 없으면 1
    fn parse_count(&mut self) -> Result<u32, FormulaError> {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(1);
        }

        let digits: String = self.chars[start..self.pos].iter().collect();
        self.canonical.push_str(&digits);

        match digits.parse::<u32>() {
            Ok(0) | Err(_) => Err(FormulaError::InvalidCount(digits)),
            Ok(n) => Ok(n),
        }
    }
}

/// 같은 원소는 처음 나온 위치에 합산
fn add_count(counts: &mut Vec<(String, u32)>, symbol: String, n: u32) -> Result<(), FormulaError> {
    match counts.iter_mut().find(|(s, _)| *s == symbol) {
        Some((_, count)) => {
            *count = count.checked_add(n).ok_or(FormulaError::CountOverflow)?;
        }
        None => counts.push((symbol, n)),
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
