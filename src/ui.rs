use colored::{ColoredString, Colorize};
use declarative::{ApplyResult, ProgressCallback};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{}/{}]", num, total).blue().bold(), msg);
}

/// Colored label for a stage result
pub fn result_label(result: &ApplyResult) -> ColoredString {
    match result {
        ApplyResult::NoChange => result.label().dimmed(),
        ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => {
            result.label().green()
        }
        ApplyResult::Skipped { .. } => "would change".yellow(),
        ApplyResult::Failed { .. } => result.label().red(),
    }
}

/// Prints one line per stage as the chain converges
pub struct StageReporter {
    total: usize,
    current: usize,
    quiet: bool,
}

impl StageReporter {
    pub fn new(total: usize, quiet: bool) -> Self {
        Self {
            total,
            current: 0,
            quiet,
        }
    }
}

impl ProgressCallback for StageReporter {
    fn on_resource_start(&mut self, _id: &str, description: &str) {
        self.current += 1;
        if !self.quiet {
            step(self.current, self.total, description);
        }
    }

    fn on_resource_complete(&mut self, _id: &str, result: &ApplyResult) {
        if !self.quiet {
            println!("      {}", result_label(result));
        }
    }

    fn on_resource_failed(&mut self, id: &str, err: &anyhow::Error) {
        error(&format!("{id}: {err:#}"));
    }
}
