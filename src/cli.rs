use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ergomux")]
#[command(about = "Layer and tap/hold key processing core for split keyboards", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log every transition and decision
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate configuration file for errors
    Validate {
        /// Path to config file (default: ~/.config/ergomux/config.ron)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Feed a JSON-lines file of key transitions through the keymap
    Replay {
        /// Path to config file (default: ~/.config/ergomux/config.ron)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to state file (default: ~/.config/ergomux/state.json)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// One `{"row":0,"col":1,"pressed":true,"timestamp":0}` per line
        script: PathBuf,
    },

    /// Read `press ROW COL` / `release ROW COL` lines from stdin in real time
    Listen {
        /// Path to config file (default: ~/.config/ergomux/config.ron)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to state file (default: ~/.config/ergomux/state.json)
        #[arg(short, long)]
        state: Option<PathBuf>,
    },

    /// Show or set the persisted default layer
    DefaultLayer {
        /// Path to config file (default: ~/.config/ergomux/config.ron)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to state file (default: ~/.config/ergomux/state.json)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Layer name to persist
        layer: Option<String>,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

pub fn print_help() {
    use colored::Colorize;

    println!("{}", "ergomux".bright_cyan().bold());
    println!("{}", "Layer and tap/hold key processing for split keyboards".dimmed());
    println!();
    println!("{}", "USAGE:".bright_yellow().bold());
    println!("  {} {}", "ergomux".bright_white(), "[COMMAND]".dimmed());
    println!();
    println!("{}", "COMMANDS:".bright_yellow().bold());
    println!(
        "  {}       {}",
        "validate".bright_green().bold(),
        "Validate configuration file".dimmed()
    );
    println!(
        "  {}         {}",
        "replay".bright_green().bold(),
        "Replay recorded key transitions".dimmed()
    );
    println!(
        "  {}         {}",
        "listen".bright_green().bold(),
        "Process key transitions typed on stdin".dimmed()
    );
    println!(
        "  {}  {}",
        "default-layer".bright_green().bold(),
        "Show or set the persisted default layer".dimmed()
    );
    println!(
        "  {}     {}",
        "completion".bright_green().bold(),
        "Generate shell completions".dimmed()
    );
    println!();
    println!("{}", "EXAMPLES:".bright_yellow().bold());
    println!(
        "  {}  {}",
        "ergomux validate -c keymaps/demo.ron".bright_white(),
        "Check a keymap".dimmed()
    );
    println!(
        "  {}  {}",
        "ergomux default-layer win".bright_white(),
        "Persist the win layer as default".dimmed()
    );
    println!();
}

pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

/// Parse a `press ROW COL` / `release ROW COL` line
pub fn parse_listen_line(line: &str) -> Option<(bool, u8, u8)> {
    let mut parts = line.split_whitespace();
    let pressed = match parts.next()? {
        "press" | "p" => true,
        "release" | "r" => false,
        _ => return None,
    };
    let row = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((pressed, row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_line() {
        assert_eq!(parse_listen_line("press 1 4"), Some((true, 1, 4)));
        assert_eq!(parse_listen_line("  r 0 0 "), Some((false, 0, 0)));
        assert_eq!(parse_listen_line("press 1"), None);
        assert_eq!(parse_listen_line("tap 1 2"), None);
        assert_eq!(parse_listen_line("press 1 2 3"), None);
        assert_eq!(parse_listen_line("press 300 2"), None);
    }

    #[test]
    fn test_cli_parses_replay() {
        let cli = Cli::try_parse_from(["ergomux", "replay", "-c", "demo.ron", "script.jsonl"])
            .unwrap();
        match cli.command {
            Some(Commands::Replay { config, state, script }) => {
                assert_eq!(config, Some(PathBuf::from("demo.ron")));
                assert_eq!(state, None);
                assert_eq!(script, PathBuf::from("script.jsonl"));
            }
            _ => panic!("expected replay"),
        }
    }
}
