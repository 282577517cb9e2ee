//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the Kaachan CLI.

use crate::analysis::{AnalysisResult, EmotionalContext};
use owo_colors::OwoColorize;

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
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "Kaachan".bright_magenta().bold(),
                version.dimmed(),
                "persona-driven conversation server".bright_white()
            );
        } else {
            println!("\n   Kaachan {}\n   persona-driven conversation server\n", version);
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

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a file creation message
    pub fn created(&self, kind: &str, path: &str) {
        if self.colored {
            println!("  {} {} {}", "✓".green().bold(), kind.dimmed(), path.bright_white());
        } else {
            println!("  [CREATED] {} {}", kind, path);
        }
    }

    pub fn skipped(&self, path: &str, reason: &str) {
        if self.colored {
            println!("  {} {} {}", "○".yellow(), path.dimmed(), format!("({})", reason).yellow());
        } else {
            println!("  [SKIPPED] {} ({})", path, reason);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
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

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    /// Print the result of analyzing one piece of text
    pub fn analysis(&self, result: &AnalysisResult) {
        self.header("Analysis");
        self.kv("keywords", &join_or_dash(&result.keywords));
        self.kv("topics", &join_or_dash(&result.topics));

        let score = format!("{:+.3}", result.sentiment);
        let label = result.emotional_context.as_str();
        if self.colored {
            let painted = match result.emotional_context {
                EmotionalContext::VeryPositive | EmotionalContext::Positive => {
                    label.green().bold().to_string()
                }
                EmotionalContext::Neutral => label.bright_white().to_string(),
                EmotionalContext::Negative | EmotionalContext::VeryNegative => {
                    label.red().bold().to_string()
                }
            };
            println!("    {}: {} {}", "sentiment".dimmed(), score.bright_white(), painted);
        } else {
            println!("    sentiment: {} {}", score, label);
        }
    }

    pub fn newline(&self) {
        println!();
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_modes() {
        assert!(Output::new().colored);
        assert!(Output::default().colored);
        assert!(!Output::no_color().colored);
    }

    #[test]
    fn test_join_or_dash() {
        assert_eq!(join_or_dash(&[]), "-");
        assert_eq!(
            join_or_dash(&["料理".to_string(), "掃除".to_string()]),
            "料理, 掃除"
        );
    }
}
