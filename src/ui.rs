use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
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

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print one menu entry
pub fn item(id: &str, label: &str) {
    println!("  {} {}", format!("[{id}]").blue().bold(), label);
}

/// Print one settings entry with its status symbol
pub fn status_item(id: &str, symbol: &str, label: &str) {
    let symbol = match symbol {
        "O" => symbol.green(),
        "X" => symbol.yellow(),
        "N" => symbol.red(),
        _ => symbol.dimmed(),
    };
    println!("  {} ({}) {}", format!("[{id}]").blue().bold(), symbol, label);
}

/// Split a menu answer into ids: comma separated, trimmed, empties dropped
pub fn parse_selection(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
