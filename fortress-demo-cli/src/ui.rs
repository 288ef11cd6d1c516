//! Small terminal output helpers.

use colored::Colorize;

pub fn banner(text: &str) {
    println!();
    println!("{}", text.bold().underline());
}

pub fn step(text: &str) {
    println!("{} {}", "→".cyan(), text);
}

pub fn ok(text: &str) {
    println!("{} {}", "✓".green(), text);
}

pub fn warn(text: &str) {
    println!("{} {}", "!".yellow(), text.yellow());
}

pub fn kv(label: &str, value: impl std::fmt::Display) {
    println!("  {:<18} {}", format!("{}:", label).dimmed(), value);
}
