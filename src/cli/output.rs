use crate::Match;
use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// A match resolved to a position a human can find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Located {
    pub line: usize,
    pub column: usize,
    pub word: String,
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonMatch {
    file: String,
    line: usize,
    column: usize,
    offset: usize,
    length: usize,
    word: String,
    message: String,
    rule: String,
    suggestions: Vec<String>,
    context: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonOutput {
    files_checked: usize,
    total_matches: usize,
    matches: Vec<JsonMatch>,
}

/// 1-indexed line and char column of a match, plus its surrounding text.
pub fn locate(text: &str, m: &Match) -> Located {
    let mut line = 1;
    let mut line_start = 0;
    for (index, c) in text.chars().enumerate().take(m.offset) {
        if c == '\n' {
            line += 1;
            line_start = index + 1;
        }
    }

    let line_text: String = text
        .chars()
        .skip(line_start)
        .take_while(|&c| c != '\n')
        .collect();
    let column = m.offset - line_start;
    let word: String = text.chars().skip(m.offset).take(m.length).collect();

    Located {
        line,
        column: column + 1,
        context: get_context(&line_text, column, m.length),
        word,
    }
}

fn get_context(line: &str, offset: usize, word_len: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    let start = offset.saturating_sub(20);
    let end = (offset + word_len + 20).min(chars.len());
    let context: String = chars[start.min(end)..end].iter().collect();

    if start > 0 && end < chars.len() {
        format!("...{}...", context)
    } else if start > 0 {
        format!("...{}", context)
    } else if end < chars.len() {
        format!("{}...", context)
    } else {
        context
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// Print the matches of one file. Coloring follows `colored::control`.
pub fn print_matches(file_path: &Path, text: &str, matches: &[Match], format: OutputFormat) {
    match format {
        OutputFormat::Text => print_text_matches(file_path, text, matches),
        OutputFormat::Json => print_json_matches(file_path, text, matches),
    }
}

fn print_text_matches(file_path: &Path, text: &str, matches: &[Match]) {
    if matches.is_empty() {
        return;
    }

    println!("\n{}", file_path.display().to_string().bold().underline());
    for m in matches {
        let located = locate(text, m);
        println!(
            "  {} {} {}",
            format!("{}:{}", located.line, located.column).blue().bold(),
            located.word.red().bold(),
            m.message.dimmed()
        );
        println!("    {}", highlight(&located.context, &located.word));

        if !m.replacements.is_empty() {
            let separator = ", ".dimmed().to_string();
            let suggestions: Vec<String> = m
                .replacements
                .iter()
                .take(5)
                .map(|s| s.green().to_string())
                .collect();
            println!("    {} {}", "→".dimmed(), suggestions.join(&separator));
        }
    }
}

fn print_json_matches(file_path: &Path, text: &str, matches: &[Match]) {
    let file = file_path.display().to_string();
    let output = JsonOutput {
        files_checked: 1,
        total_matches: matches.len(),
        matches: matches
            .iter()
            .map(|m| {
                let located = locate(text, m);
                JsonMatch {
                    file: file.clone(),
                    line: located.line,
                    column: located.column,
                    offset: m.offset,
                    length: m.length,
                    word: located.word,
                    message: m.message.clone(),
                    rule: m.rule.id.clone(),
                    suggestions: m.replacements.clone(),
                    context: located.context,
                }
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!(error = %e, "failed to serialize matches"),
    }
}

fn highlight(context: &str, word: &str) -> String {
    if word.is_empty() {
        return context.to_string();
    }
    context.replacen(word, &word.red().bold().to_string(), 1)
}

pub fn print_check_summary(total_matches: usize, file_count: usize) {
    println!();
    if total_matches == 0 {
        println!("{}", "✓ No issues found!".green().bold());
        return;
    }
    println!(
        "{} {} {} found in {} {}",
        "✗".red().bold(),
        total_matches.to_string().red().bold(),
        plural(total_matches, "issue", "issues"),
        file_count,
        plural(file_count, "file", "files")
    );
}

pub fn print_fix_summary(total_fixed: usize, file_count: usize) {
    println!();
    if total_fixed == 0 {
        println!("{}", "No corrections needed!".green().bold());
        return;
    }
    println!(
        "{} {} {} applied to {} {}",
        "✓".green().bold(),
        total_fixed.to_string().green().bold(),
        plural(total_fixed, "correction", "corrections"),
        file_count,
        plural(file_count, "file", "files")
    );
}

/// The user's answer for one match in interactive mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptChoice {
    Replace(usize),
    Skip,
    Quit,
}

/// Ask which suggestion to apply. `choices` are the popup's candidates.
pub fn prompt_choice(text: &str, m: &Match, choices: &[String]) -> anyhow::Result<PromptChoice> {
    let located = locate(text, m);
    println!(
        "\n{} {}:{} {}",
        "Issue found:".yellow().bold(),
        located.line.to_string().blue(),
        located.column.to_string().blue(),
        m.short_message.bold()
    );
    println!("  {}", highlight(&located.context, &located.word));
    println!("  {}", m.message.dimmed());

    let mut items: Vec<String> = choices.to_vec();
    items.push("Skip".to_string());
    items.push("Quit".to_string());

    let selection = dialoguer::Select::with_theme(&dialoguer::theme::ColorfulTheme::default())
        .with_prompt("Replace with")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match selection {
        i if i < choices.len() => PromptChoice::Replace(i),
        i if i == choices.len() => PromptChoice::Skip,
        _ => PromptChoice::Quit,
    })
}
