//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the pokedex CLI,
//! including research report rendering.

use crate::research::synthesis::{display_subject, display_value};
use crate::research::SourceOutcome;
use crate::types::{ResearchReport, SectionKind};
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket a confidence score for display
pub fn confidence_label(score: f64) -> &'static str {
    if score >= 0.8 {
        "high"
    } else if score >= 0.5 {
        "medium"
    } else {
        "low"
    }
}

/// Ten-cell bar, e.g. `[#######---]`
pub fn confidence_bar(score: f64) -> String {
    let filled = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "Pokedex Research".bright_red().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed(),
                "Multi-source answers for Pokemon questions".bright_white()
            );
        } else {
            println!(
                "\n   Pokedex Research v{}\n   Multi-source answers for Pokemon questions\n",
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a step message (for multi-step operations)
    pub fn step(&self, step_num: usize, total: usize, message: &str) {
        if self.colored {
            println!(
                "  {} {}",
                format!("[{}/{}]", step_num, total).dimmed(),
                message.bright_white()
            );
        } else {
            println!("  [{}/{}] {}", step_num, total, message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a subheader
    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a paragraph of free text, indented
    pub fn paragraph(&self, text: &str) {
        for line in text.lines() {
            println!("    {}", line);
        }
    }

    /// Print the interactive prompt and read one line.
    ///
    /// Returns `None` on end of input.
    pub fn prompt(&self, message: &str) -> Option<String> {
        if self.colored {
            print!("\n  {} ", message.bright_cyan().bold());
        } else {
            print!("\n  {} ", message);
        }
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim().to_string()),
        }
    }

    fn confidence(&self, label: &str, score: f64) {
        let text = format!(
            "{} {:.0}% ({})",
            confidence_bar(score),
            score * 100.0,
            confidence_label(score)
        );
        if self.colored {
            let colored = match confidence_label(score) {
                "high" => text.green().to_string(),
                "medium" => text.yellow().to_string(),
                _ => text.red().to_string(),
            };
            println!("    {}: {}", label.dimmed(), colored);
        } else {
            println!("    {}: {}", label, text);
        }
    }

    /// Render a research report
    pub fn report(&self, report: &ResearchReport, verbose: bool) {
        self.header("Research Report");
        self.kv("Query", &report.query);
        self.kv("Mode", &format!("{:?}", report.query_class));
        self.confidence("Confidence", report.confidence.overall);

        self.subheader("Summary");
        self.paragraph(&report.summary);

        for section in &report.narrative {
            if section.kind == SectionKind::Findings && !verbose {
                continue;
            }
            self.subheader(&section.title);
            if let Some(facet) = section.facet {
                self.confidence("Confidence", report.confidence.facet(facet));
            }
            for entry in &section.entries {
                self.list_item(entry);
            }
        }

        if !verbose {
            self.key_facts(report);
        }

        if let Some(elaboration) = &report.elaboration {
            self.subheader("Analysis");
            self.paragraph(elaboration);
        }

        if !report.limitations.is_empty() {
            self.subheader("Limitations");
            for limitation in &report.limitations {
                self.list_item(limitation);
            }
        }

        self.subheader("Sources");
        for source in &report.citations {
            self.list_item(source);
        }

        if report.degraded {
            self.hint("Reasoning was unavailable; this report contains source data only.");
        }
    }

    /// One line per subject with the facts that have consensus
    fn key_facts(&self, report: &ResearchReport) {
        let subjects: Vec<_> = report.contexts.iter().filter(|c| !c.is_empty()).collect();
        if subjects.is_empty() {
            return;
        }

        self.subheader("Key Facts");
        for context in subjects {
            let facts: Vec<String> = context
                .iter()
                .filter(|(_, _, fact)| !fact.is_disputed())
                .take(4)
                .map(|(_, field, fact)| format!("{} {}", field, display_value(&fact.value)))
                .collect();
            self.kv(&display_subject(context.subject()), &facts.join("; "));
        }
    }

    /// Per-fetch diagnostics table
    pub fn outcomes(&self, outcomes: &[SourceOutcome]) {
        self.subheader("Source Fetches");
        for outcome in outcomes {
            let status = match outcome.failure() {
                None => "ok".to_string(),
                Some(failure) => failure.reason.to_string(),
            };
            let line = format!(
                "{:<14} {:<22} {:<15} {:<12} {} attempt(s), {} ms",
                outcome.source_id,
                outcome.subject,
                outcome.facet.as_str(),
                status,
                outcome.attempts,
                outcome.latency.as_millis()
            );
            if self.colored && !outcome.is_success() {
                println!("    {}", line.yellow());
            } else {
                println!("    {}", line);
            }
        }
    }

    /// Show a plain chat-model answer next to the researched one
    pub fn comparison(&self, report: &ResearchReport, model: &str, answer: &str) {
        self.header("Comparison");
        self.subheader(&format!("Plain answer ({})", model));
        self.paragraph(answer);
        self.subheader("Researched answer");
        self.paragraph(&report.summary);
        self.kv("Sources consulted", &report.citations.len().to_string());
        self.kv(
            "Confidence",
            &format!("{:.0}%", report.confidence.overall * 100.0),
        );
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfidenceScore, QueryClass, ReportSection, ResearchIntent, Facet};
    use std::collections::{BTreeMap, BTreeSet};

    fn sample_report() -> ResearchReport {
        ResearchReport {
            query: "What type is Scizor?".to_string(),
            query_class: QueryClass::General,
            intents: vec![ResearchIntent::new("scizor", [Facet::Typing])],
            contexts: Vec::new(),
            confidence: ConfidenceScore {
                overall: 0.66,
                per_facet: BTreeMap::from([(Facet::Typing, 0.66)]),
            },
            summary: "Scizor is bug, steel.".to_string(),
            narrative: vec![ReportSection {
                kind: SectionKind::Findings,
                title: "Typing".to_string(),
                facet: Some(Facet::Typing),
                entries: vec!["Scizor: types = bug, steel [pokeapi; agreement 100%]".to_string()],
            }],
            citations: BTreeSet::from(["pokeapi".to_string()]),
            team: Vec::new(),
            limitations: vec!["Scizor types is single-sourced".to_string()],
            elaboration: None,
            degraded: true,
        }
    }

    #[test]
    fn test_output_new() {
        let output = Output::new();
        assert!(output.colored);
    }

    #[test]
    fn test_output_no_color() {
        let output = Output::no_color();
        assert!(!output.colored);
    }

    #[test]
    fn test_confidence_label_buckets() {
        assert_eq!(confidence_label(0.95), "high");
        assert_eq!(confidence_label(0.8), "high");
        assert_eq!(confidence_label(0.6), "medium");
        assert_eq!(confidence_label(0.2), "low");
    }

    #[test]
    fn test_confidence_bar() {
        assert_eq!(confidence_bar(0.0), "[----------]");
        assert_eq!(confidence_bar(0.66), "[#######---]");
        assert_eq!(confidence_bar(1.5), "[##########]");
    }

    #[test]
    fn test_report_rendering_no_panic() {
        let report = sample_report();
        Output::no_color().report(&report, false);
        Output::no_color().report(&report, true);
        Output::new().report(&report, true);
        Output::new().comparison(&report, "gpt-4-turbo-preview", "Scizor is Bug/Steel.");
    }

    #[test]
    fn test_output_methods_no_panic() {
        let output = Output::no_color();

        output.banner();
        output.success("test success");
        output.info("test info");
        output.warning("test warning");
        output.error("test error");
        output.step(1, 4, "step message");
        output.header("Test Header");
        output.subheader("Test Subheader");
        output.kv("key", "value");
        output.list_item("item");
        output.hint("hint message");
        output.paragraph("line one\nline two");
        output.outcomes(&[]);
        output.newline();
    }
}
