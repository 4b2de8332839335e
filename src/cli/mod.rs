//! CLI 모듈
//!
//! chembot CLI 명령어 정의 및 구현

mod shell;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::knowledge::{get_data_dir, CorpusSource, KnowledgeStore, QueryEngine};

pub use shell::Shell;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "chembot")]
#[command(version, about = "토픽별 Q&A 코퍼스 기반 챗봇", long_about = None)]
pub struct Cli {
    /// 코퍼스 JSON 경로 (기본: $CHEMBOT_CORPUS → ~/.chembot/knowledge.json → 내장 코퍼스)
    #[arg(long, global = true)]
    pub corpus: Option<PathBuf>,

    /// 생략하면 대화형 모드
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 대화형 모드
    Chat,

    /// 질문 하나에 답변
    Ask {
        /// 질문
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// 토픽 목록
    Topics,

    /// 토픽의 예시 질문 보기
    Browse {
        /// 토픽 이름 (대소문자 무시)
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// 점수 포함 매칭 결과
    Search {
        /// 검색 쿼리
        query: String,

        /// 결과 개수 제한
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// 상태 확인
    Status {
        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub fn run(cli: Cli) -> Result<()> {
    let engine = open_engine(cli.corpus);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => cmd_chat(&engine),
        Commands::Ask { question } => cmd_ask(&engine, &question.join(" ")),
        Commands::Topics => cmd_topics(&engine),
        Commands::Browse { name } => cmd_browse(&engine, &name.join(" ")),
        Commands::Search { query, limit } => cmd_search(&engine, &query, limit),
        Commands::Status { json } => cmd_status(&engine, json),
    }
}

/// 코퍼스 로드 + 엔진 생성
///
/// 로드 실패는 치명적이지 않습니다 (빈 코퍼스로 계속).
fn open_engine(corpus: Option<PathBuf>) -> QueryEngine {
    let source = CorpusSource::resolve(corpus);
    QueryEngine::new(KnowledgeStore::load(&source))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 대화형 모드 (chat)
fn cmd_chat(engine: &QueryEngine) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    Shell::new(engine)
        .run(stdin.lock(), stdout.lock())
        .context("대화형 모드 실행 실패")
}

/// 단일 질문 (ask)
fn cmd_ask(engine: &QueryEngine, question: &str) -> Result<()> {
    println!("{}", engine.answer(question));
    Ok(())
}

/// 토픽 목록 (topics)
fn cmd_topics(engine: &QueryEngine) -> Result<()> {
    println!("{}", engine.topics_summary());
    Ok(())
}

/// 토픽 상세 (browse)
fn cmd_browse(engine: &QueryEngine, name: &str) -> Result<()> {
    match engine.topic_detail(name) {
        Some(detail) => {
            println!("{}", detail);
            Ok(())
        }
        None => bail!("Topic not found: {}\nType 'topics' to see available topics.", name),
    }
}

/// 검색 명령어 (search)
///
/// 답변 하나가 아니라 점수와 함께 상위 결과를 보여줍니다.
fn cmd_search(engine: &QueryEngine, query: &str, limit: usize) -> Result<()> {
    println!("[*] 검색 중: \"{}\"", query);

    let results = engine.search(query, limit);

    if results.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [점수: {:.1}] #{} {}",
            i + 1,
            result.score,
            result.index,
            result.pair.primary_question()
        );
        println!("   답변: {}", truncate_text(result.pair.answer(), 200));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(engine: &QueryEngine, json: bool) -> Result<()> {
    let stats = engine.store().stats();

    if json {
        let out = serde_json::to_string_pretty(&stats).context("상태 직렬화 실패")?;
        println!("{}", out);
        return Ok(());
    }

    println!("chembot v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", get_data_dir().display());
    println!("[*] 코퍼스: {}", stats.source);

    if stats.topic_count == 0 {
        println!("[!] 로드된 토픽이 없습니다.");
        return Ok(());
    }

    println!(
        "[OK] 토픽: {} 개, Q&A: {} 건",
        stats.topic_count, stats.qa_pair_count
    );
    println!("     로드 시각: {}", stats.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(ref digest) = stats.digest {
        println!("     SHA-256: {}", digest);
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_parse_default_command() {
        let cli = Cli::try_parse_from(["chembot"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.corpus.is_none());
    }

    #[test]
    fn test_parse_ask_and_corpus() {
        let cli = Cli::try_parse_from(["chembot", "ask", "What", "is", "pH?", "--corpus", "kb.json"]).unwrap();

        assert_eq!(cli.corpus, Some(PathBuf::from("kb.json")));
        match cli.command {
            Some(Commands::Ask { question }) => assert_eq!(question.join(" "), "What is pH?"),
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn test_parse_search_limit() {
        let cli = Cli::try_parse_from(["chembot", "search", "atom", "-l", "3"]).unwrap();

        match cli.command {
            Some(Commands::Search { query, limit }) => {
                assert_eq!(query, "atom");
                assert_eq!(limit, 3);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_browse_requires_name() {
        assert!(Cli::try_parse_from(["chembot", "browse"]).is_err());
    }

    #[test]
    fn test_browse_not_found() {
        let engine = QueryEngine::new(KnowledgeStore::load(&CorpusSource::Embedded));

        assert!(cmd_browse(&engine, "Atomic Structure").is_ok());
        let err = cmd_browse(&engine, "Alchemy").unwrap_err();
        assert!(err.to_string().starts_with("Topic not found: Alchemy"));
    }
}
