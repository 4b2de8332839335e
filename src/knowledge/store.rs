//! Knowledge Store - 불변 코퍼스 스냅샷 저장소
//!
//! 시작 시 한 번 코퍼스를 로드하고, 이후에는 읽기 전용 접근자만 제공합니다.
//! 로드에 실패하면 빈 코퍼스로 동작합니다 (에러는 로그로만 보고).
//!
//! 코퍼스 위치 우선순위:
//! 1. `--corpus` 인자
//! 2. `CHEMBOT_CORPUS` 환경 변수
//! 3. `~/.chembot/knowledge.json` (존재하는 경우)
//! 4. 바이너리에 내장된 기본 코퍼스

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::corpus::{Corpus, CorpusError, QaPair, Topic};

/// 코퍼스 경로 환경 변수
pub const CORPUS_ENV: &str = "CHEMBOT_CORPUS";

/// 데이터 디렉토리 안의 기본 코퍼스 파일명
const CORPUS_FILE_NAME: &str = "knowledge.json";

/// 내장 기본 코퍼스
const EMBEDDED_CORPUS: &str = include_str!("../../data/chemistry_knowledge.json");

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.chembot/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chembot")
}

// ============================================================================
// Corpus Source
// ============================================================================

/// 코퍼스 출처
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CorpusSource {
    /// JSON 파일
    File(PathBuf),
    /// 바이너리 내장 코퍼스
    Embedded,
    /// 코드에서 직접 구성한 코퍼스 (출처 표시용, 읽을 문서 없음)
    Memory,
}

impl CorpusSource {
    /// 인자 / 환경 변수 / 데이터 디렉토리 순으로 코퍼스 위치 결정
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let env_value = std::env::var(CORPUS_ENV).ok();
        resolve_with(explicit, env_value, &get_data_dir())
    }

    /// 원본 JSON 읽기
    fn read(&self) -> Result<String, CorpusError> {
        match self {
            CorpusSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
            CorpusSource::Embedded => Ok(EMBEDDED_CORPUS.to_string()),
            CorpusSource::Memory => Err(CorpusError::NoDocument),
        }
    }
}

impl fmt::Display for CorpusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusSource::File(path) => write!(f, "{}", path.display()),
            CorpusSource::Embedded => write!(f, "<embedded>"),
            CorpusSource::Memory => write!(f, "<memory>"),
        }
    }
}

fn resolve_with(explicit: Option<PathBuf>, env_value: Option<String>, data_dir: &Path) -> CorpusSource {
    if let Some(path) = explicit {
        return CorpusSource::File(path);
    }

    if let Some(value) = env_value {
        if !value.trim().is_empty() {
            tracing::debug!("Using corpus from {}", CORPUS_ENV);
            return CorpusSource::File(PathBuf::from(value.trim()));
        }
    }

    let default_path = data_dir.join(CORPUS_FILE_NAME);
    if default_path.is_file() {
        return CorpusSource::File(default_path);
    }

    CorpusSource::Embedded
}

// ============================================================================
// Types
// ============================================================================

/// 저장소 통계
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub topic_count: usize,
    pub qa_pair_count: usize,
    pub source: CorpusSource,
    pub loaded_at: DateTime<Utc>,
    /// 로드한 문서의 SHA-256 (빈 저장소면 None)
    pub digest: Option<String>,
}

// ============================================================================
// KnowledgeStore
// ============================================================================

/// Knowledge Store - 읽기 전용 코퍼스 저장소
///
/// 내부 상태를 변경하는 API가 없으므로 여러 스레드에서 락 없이 공유할 수 있습니다.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    corpus: Corpus,
    source: CorpusSource,
    digest: Option<String>,
    loaded_at: DateTime<Utc>,
}

impl KnowledgeStore {
    /// 코퍼스 로드 (실패 시 에러 반환)
    pub fn try_load(source: &CorpusSource) -> Result<Self, CorpusError> {
        let json = source.read()?;
        let corpus = Corpus::from_json(&json)?;
        let digest = format!("{:x}", Sha256::digest(json.as_bytes()));

        tracing::info!(
            "Loaded {} topics ({} Q&A pairs) from {}",
            corpus.topics().len(),
            corpus.qa_pair_count(),
            source
        );

        Ok(Self::with_source(corpus, source.clone(), Some(digest)))
    }

    /// 코퍼스 로드 (실패 시 빈 저장소)
    ///
    /// 로드 실패는 치명적이지 않습니다. 에러를 로그로 남기고 빈 코퍼스로 계속합니다.
    pub fn load(source: &CorpusSource) -> Self {
        match Self::try_load(source) {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("Error loading knowledge base: {}", e);
                Self::with_source(Corpus::empty(), source.clone(), None)
            }
        }
    }

    /// 빈 저장소
    pub fn empty() -> Self {
        Self::from_corpus(Corpus::empty())
    }

    /// 이미 구성된 코퍼스로 생성
    pub fn from_corpus(corpus: Corpus) -> Self {
        Self::with_source(corpus, CorpusSource::Memory, None)
    }

    fn with_source(corpus: Corpus, source: CorpusSource, digest: Option<String>) -> Self {
        Self {
            corpus,
            source,
            digest,
            loaded_at: Utc::now(),
        }
    }

    /// 전체 토픽 (코퍼스 순서)
    pub fn all_topics(&self) -> &[Topic] {
        self.corpus.topics()
    }

    /// 전체 Q&A 쌍 (토픽 순서 → 토픽 내 순서)
    pub fn all_qa_pairs(&self) -> Vec<&QaPair> {
        self.corpus.qa_pairs().collect()
    }

    /// 이름으로 토픽 조회 (대소문자 무시, 첫 번째 일치)
    pub fn topic_by_name(&self, name: &str) -> Option<&Topic> {
        let wanted = name.trim().to_lowercase();
        self.corpus
            .topics()
            .iter()
            .find(|t| t.name().to_lowercase() == wanted)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn source(&self) -> &CorpusSource {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// 저장소 통계
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            topic_count: self.corpus.topics().len(),
            qa_pair_count: self.corpus.qa_pair_count(),
            source: self.source.clone(),
            loaded_at: self.loaded_at,
            digest: self.digest.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_TOPICS: &str = r#"{
        "topics": [
            {
                "name": "States of Matter",
                "description": "Solids, liquids and gases",
                "qaPairs": [
                    {"questions": ["What are the states of matter?"], "answer": "Solid, liquid, gas, plasma."},
                    {"questions": ["What is sublimation?"], "answer": "Solid to gas directly."}
                ]
            },
            {
                "name": "Gas Laws",
                "description": "Boyle, Charles, ideal gas",
                "qaPairs": [
                    {"questions": ["What is Boyle's Law?"], "answer": "PV is constant at fixed T."}
                ]
            }
        ]
    }"#;

    fn write_corpus(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_from_file() {
        let (_dir, path) = write_corpus(TWO_TOPICS);

        let store = KnowledgeStore::try_load(&CorpusSource::File(path.clone())).unwrap();
        assert_eq!(store.all_topics().len(), 2);
        assert_eq!(store.all_qa_pairs().len(), 3);
        assert_eq!(store.source(), &CorpusSource::File(path));

        let stats = store.stats();
        assert_eq!(stats.topic_count, 2);
        assert_eq!(stats.qa_pair_count, 3);
        assert_eq!(stats.digest.as_ref().map(|d| d.len()), Some(64));
    }

    #[test]
    fn test_flatten_order() {
        let (_dir, path) = write_corpus(TWO_TOPICS);
        let store = KnowledgeStore::load(&CorpusSource::File(path));

        let answers: Vec<&str> = store.all_qa_pairs().iter().map(|p| p.answer()).collect();
        assert_eq!(
            answers,
            vec!["Solid, liquid, gas, plasma.", "Solid to gas directly.", "PV is constant at fixed T."]
        );
    }

    #[test]
    fn test_topic_by_name() {
        let (_dir, path) = write_corpus(TWO_TOPICS);
        let store = KnowledgeStore::load(&CorpusSource::File(path));

        let topic = store.topic_by_name("gas laws").unwrap();
        assert_eq!(topic.name(), "Gas Laws");

        assert!(store.topic_by_name("  STATES OF MATTER ").is_some());
        assert!(store.topic_by_name("Gas").is_none());
        assert!(store.topic_by_name("").is_none());
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let source = CorpusSource::File(dir.path().join("missing.json"));

        assert!(matches!(KnowledgeStore::try_load(&source), Err(CorpusError::Io { .. })));

        let store = KnowledgeStore::load(&source);
        assert!(store.is_empty());
        assert!(store.all_qa_pairs().is_empty());
        assert!(store.topic_by_name("Gas Laws").is_none());
        assert!(store.stats().digest.is_none());
    }

    #[test]
    fn test_malformed_file_degrades_to_empty() {
        let (_dir, path) = write_corpus(r#"{"topics": [{"name": "Broken"}"#);
        let source = CorpusSource::File(path);

        assert!(matches!(KnowledgeStore::try_load(&source), Err(CorpusError::Parse(_))));
        assert!(KnowledgeStore::load(&source).is_empty());
    }

    #[test]
    fn test_embedded_corpus() {
        let store = KnowledgeStore::try_load(&CorpusSource::Embedded).unwrap();
        assert!(!store.is_empty());
        assert!(store.stats().qa_pair_count > 0);
        assert!(store.topic_by_name("Atomic Structure").is_some());
    }

    #[test]
    fn test_from_corpus() {
        let corpus = Corpus::from_json(TWO_TOPICS).unwrap();
        let store = KnowledgeStore::from_corpus(corpus);

        assert_eq!(store.source(), &CorpusSource::Memory);
        assert_eq!(store.corpus().qa_pair_count(), 3);
    }

    #[test]
    fn test_empty_store() {
        let store = KnowledgeStore::empty();

        assert!(store.is_empty());
        assert!(store.all_topics().is_empty());
        assert!(store.all_qa_pairs().is_empty());
        assert_eq!(store.source(), &CorpusSource::Memory);
        assert!(store.stats().digest.is_none());
    }

    #[test]
    fn test_memory_source_not_loadable() {
        assert!(matches!(
            KnowledgeStore::try_load(&CorpusSource::Memory),
            Err(CorpusError::NoDocument)
        ));
        assert!(KnowledgeStore::load(&CorpusSource::Memory).is_empty());
    }

    #[test]
    fn test_resolve_precedence() {
        let dir = TempDir::new().unwrap();
        let explicit = PathBuf::from("/tmp/explicit.json");

        // 1. 인자 우선
        let source = resolve_with(Some(explicit.clone()), Some("/tmp/env.json".into()), dir.path());
        assert_eq!(source, CorpusSource::File(explicit));

        // 2. 환경 변수
        let source = resolve_with(None, Some("/tmp/env.json".into()), dir.path());
        assert_eq!(source, CorpusSource::File(PathBuf::from("/tmp/env.json")));

        // 빈 환경 변수는 무시 → 데이터 디렉토리에 파일 없음 → 내장
        let source = resolve_with(None, Some("  ".into()), dir.path());
        assert_eq!(source, CorpusSource::Embedded);

        // 3. 데이터 디렉토리
        let default_path = dir.path().join(CORPUS_FILE_NAME);
        std::fs::write(&default_path, TWO_TOPICS).unwrap();
        let source = resolve_with(None, None, dir.path());
        assert_eq!(source, CorpusSource::File(default_path));
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CorpusSource::Embedded.to_string(), "<embedded>");
        assert_eq!(CorpusSource::Memory.to_string(), "<memory>");
        assert_eq!(CorpusSource::File(PathBuf::from("a.json")).to_string(), "a.json");
    }
}
