//! Terminal output helpers
//!
//! Colors are handled by `console`, which disables styling automatically
//! when stdout is not a terminal.

use console::style;
use std::io::IsTerminal;

/// Whether output goes to an interactive terminal
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    interactive: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        let interactive = std::io::stdout().is_terminal() && std::env::var_os("CI").is_none();
        Self { interactive }
    }

    /// Plain output regardless of the terminal
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Display a title line
pub fn intro(ctx: &UiContext, title: &str) {
    println!("{}", style(title).cyan().bold());
    if !ctx.is_interactive() {
        println!();
    }
}

/// Display a section header
pub fn section(_ctx: &UiContext, title: &str) {
    println!();
    println!("{}", style(title).bold());
}

/// Display a success step
pub fn step_ok(_ctx: &UiContext, message: &str) {
    println!("  {} {}", style("[OK]").green(), message);
}

/// Display a success step with detail
pub fn step_ok_detail(_ctx: &UiContext, message: &str, detail: &str) {
    println!("  {} {} ({})", style("[OK]").green(), message, style(detail).dim());
}

/// Display a warning step with hint
pub fn step_warn_hint(_ctx: &UiContext, message: &str, hint: &str) {
    println!("  {} {} - {}", style("[WARN]").yellow(), message, style(hint).dim());
}

/// Display an error step with detail
pub fn step_error_detail(_ctx: &UiContext, message: &str, detail: &str) {
    println!("  {} {}: {}", style("[FAIL]").red(), message, style(detail).red());
}

/// Display an info step
pub fn step_info(_ctx: &UiContext, message: &str) {
    println!("  {} {}", style("[INFO]").cyan(), message);
}

/// Display a remark/hint
pub fn remark(_ctx: &UiContext, message: &str) {
    println!("  {}", style(message).dim());
}

/// Print a dimmed key with its value
pub fn key_value(_ctx: &UiContext, key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
    }

    #[test]
    fn output_non_interactive() {
        let ctx = UiContext::non_interactive();
        // These should not panic
        intro(&ctx, "Test");
        section(&ctx, "Section");
        step_ok(&ctx, "Step completed");
        step_info(&ctx, "Info");
        step_error_detail(&ctx, "Error", "detail");
        key_value(&ctx, "key", "value");
    }
}
