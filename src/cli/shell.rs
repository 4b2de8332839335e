//! 대화형 셸
//!
//! 한 줄씩 읽어 `help` / `topics` / `browse <토픽>` / `quit` 명령을 처리하고,
//! 나머지 입력은 질문으로 엔진에 넘깁니다. 입력 끝(EOF)은 `quit`과 같습니다.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::knowledge::QueryEngine;

const RULE_WIDTH: usize = 70;

/// 셸 명령
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Quit,
    Help,
    Topics,
    Browse(&'a str),
    /// 토픽 이름 없는 `browse`
    BrowseUsage,
    Ask(&'a str),
    /// 빈 줄
    Skip,
}

fn parse_command(line: &str) -> Command<'_> {
    let input = line.trim();
    if input.is_empty() {
        return Command::Skip;
    }

    let lower = input.to_lowercase();
    match lower.as_str() {
        "quit" | "exit" => return Command::Quit,
        "help" => return Command::Help,
        "topics" => return Command::Topics,
        "browse" => return Command::BrowseUsage,
        _ => {}
    }

    // "browse" 는 ASCII 이므로 lower와 input의 접두사 길이가 같음
    if lower.starts_with("browse ") && input.is_char_boundary(7) {
        return Command::Browse(input[7..].trim());
    }

    Command::Ask(input)
}

/// 대화형 셸
pub struct Shell<'a> {
    engine: &'a QueryEngine,
}

impl<'a> Shell<'a> {
    pub fn new(engine: &'a QueryEngine) -> Self {
        Self { engine }
    }

    /// 입력이 끝나거나 `quit` / `exit` 까지 반복
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut out: W) -> Result<()> {
        self.write_welcome(&mut out)?;

        loop {
            write!(out, "\nYou: ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }

            match parse_command(&line) {
                Command::Quit => break,
                Command::Skip => continue,
                Command::Help => self.write_help(&mut out)?,
                Command::Topics => writeln!(out, "\n{}", self.engine.topics_summary())?,
                Command::Browse(name) => match self.engine.topic_detail(name) {
                    Some(detail) => writeln!(out, "\n{}", detail)?,
                    None => writeln!(
                        out,
                        "Topic not found: {}\nType 'topics' to see available topics.",
                        name
                    )?,
                },
                Command::BrowseUsage => {
                    writeln!(out, "Usage: browse <topic name>   (e.g. browse Atomic Structure)")?
                }
                Command::Ask(question) => {
                    writeln!(out, "\nBot: {}", self.engine.answer(question))?;
                }
            }
        }

        writeln!(out, "\nThanks for using chembot! Happy learning!")?;
        out.flush()?;
        Ok(())
    }

    fn write_welcome<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "WELCOME TO CHEMBOT")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        let topics = self.engine.store().all_topics();
        if topics.is_empty() {
            writeln!(out, "\nNo knowledge base is loaded.")?;
        } else {
            writeln!(out, "\nI can help you with:")?;
            for topic in topics {
                writeln!(out, "  • {}", topic.name())?;
            }
        }

        if !self.engine.table().is_empty() {
            writeln!(out, "\nChemistry tools:")?;
            writeln!(out, "  • Element lookup (e.g. 'tell me about Oxygen', 'Fe')")?;
            writeln!(out, "  • Molar mass     (e.g. 'molar mass of H2O', 'mass of NaCl')")?;
        }

        writeln!(out, "\nCommands:")?;
        writeln!(out, "  help            - Show this help message")?;
        writeln!(out, "  topics          - List all available topics")?;
        writeln!(out, "  browse <topic>  - View questions for a specific topic")?;
        writeln!(out, "  quit/exit       - Exit the chatbot")?;
        writeln!(out, "\n{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "Ask me anything!")?;
        Ok(())
    }

    fn write_help<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "\n{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "HELP - Available Commands")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "\nCommands:")?;
        writeln!(out, "  help              - Display this help message")?;
        writeln!(out, "  topics            - List all available topics")?;
        writeln!(out, "  browse <topic>    - View sample questions for a specific topic")?;
        writeln!(out, "                      Example: browse Atomic Structure")?;
        writeln!(out, "  quit or exit      - Exit the chatbot")?;

        // 각 토픽의 첫 질문을 예시로
        let examples: Vec<&str> = self
            .engine
            .store()
            .all_topics()
            .iter()
            .filter_map(|t| t.qa_pairs().first())
            .map(|p| p.primary_question())
            .take(8)
            .collect();

        let has_table = !self.engine.table().is_empty();
        if !examples.is_empty() || has_table {
            writeln!(out, "\nExample Questions:")?;
            for example in examples {
                writeln!(out, "  • {}", example)?;
            }
            if has_table {
                writeln!(out, "  • What is the atomic number of iron?")?;
                writeln!(out, "  • Molar mass of Ca(OH)2")?;
            }
        }

        writeln!(out, "\nTips:")?;
        writeln!(out, "  • Be specific in your questions")?;
        writeln!(out, "  • Use subject terminology when possible")?;
        writeln!(out, "  • Try different phrasings if you don't get the answer you need")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::knowledge::{CorpusSource, KnowledgeStore, FALLBACK_PREFIX, GREETING_REPLY};

    fn run_session(engine: &QueryEngine, input: &str) -> String {
        let mut out = Vec::new();
        Shell::new(engine).run(Cursor::new(input), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn embedded_engine() -> QueryEngine {
        QueryEngine::new(KnowledgeStore::load(&CorpusSource::Embedded))
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("QUIT"), Command::Quit);
        assert_eq!(parse_command(" exit \n"), Command::Quit);
        assert_eq!(parse_command("Help"), Command::Help);
        assert_eq!(parse_command("topics"), Command::Topics);
        assert_eq!(parse_command("BROWSE Gas Laws "), Command::Browse("Gas Laws"));
        assert_eq!(parse_command("browse"), Command::BrowseUsage);
        assert_eq!(parse_command("   "), Command::Skip);
        assert_eq!(parse_command("What is pH?"), Command::Ask("What is pH?"));
        assert_eq!(parse_command("browser history"), Command::Ask("browser history"));
    }

    #[test]
    fn test_session_answers_and_quits() {
        let engine = embedded_engine();
        let output = run_session(&engine, "What is an atom?\n\nhello\nquit\nWhat is pH?\n");

        assert!(output.starts_with(&"=".repeat(RULE_WIDTH)));
        assert!(output.contains("Bot: An atom is the smallest unit of an element"));
        assert!(output.contains(&format!("Bot: {}", GREETING_REPLY)));
        // quit 이후 입력은 처리하지 않음
        assert!(!output.contains("Bot: pH is"));
        assert!(output.trim_end().ends_with("Happy learning!"));
    }

    #[test]
    fn test_session_commands() {
        let engine = embedded_engine();
        let output = run_session(&engine, "help\ntopics\nbrowse atomic structure\nbrowse Alchemy\nbrowse\n");

        assert!(output.contains("HELP - Available Commands"));
        assert!(output.contains("  • Molar mass of Ca(OH)2"));
        assert!(output.contains("Available Topics:"));
        assert!(output.contains("Topic: Atomic Structure"));
        assert!(output.contains("Topic not found: Alchemy"));
        assert!(output.contains("Usage: browse <topic name>"));
    }

    #[test]
    fn test_session_eof_exits() {
        let engine = embedded_engine();
        let output = run_session(&engine, "");
        assert!(output.contains("Happy learning!"));
    }

    #[test]
    fn test_session_empty_store() {
        let engine = QueryEngine::new(KnowledgeStore::empty());
        let output = run_session(&engine, "xyzxyz\nmolar mass of NaCl\nexit\n");

        assert!(output.contains("No knowledge base is loaded."));
        assert!(output.contains("Chemistry tools:"));
        assert!(output.contains(&format!("Bot: {}", FALLBACK_PREFIX)));
        assert!(output.contains("Total Molar Mass: 58.440 g/mol"));
    }
}
