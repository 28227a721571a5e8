mod cli;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use crossbeam_channel::unbounded;
use ergomux::config::{report_validation, Config, ConfigError};
use ergomux::event_processor::layer_stack::LayerSnapshot;
use ergomux::event_processor::resolver::Keymap;
use ergomux::event_processor::{
    start_event_processor, ActionEmitter, Emit, KeyTransition, KeymapProcessor,
    DEFAULT_TICK_INTERVAL,
};
use ergomux::persist::{DefaultLayerStore, JsonFileStore};
use ergomux::timer::{Clock, SystemClock, Timestamp};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Validate { config }) => report_validation(config.as_deref()),
        Some(Commands::Replay {
            config,
            state,
            script,
        }) => replay(config, state, &script),
        Some(Commands::Listen { config, state }) => listen(config, state),
        Some(Commands::DefaultLayer {
            config,
            state,
            layer,
        }) => default_layer(config, state, layer.as_deref()),
        Some(Commands::Completion { shell }) => {
            cli::generate_completion(shell);
            Ok(())
        }
        None => {
            cli::print_help();
            Ok(())
        }
    }
}

fn load_keymap(config_path: Option<PathBuf>) -> Result<Keymap> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    match Keymap::from_config(&config) {
        Ok(keymap) => {
            info!(
                "Loaded {} layer(s), {}x{} matrix, tapping term {}ms",
                keymap.layer_count(),
                keymap.rows(),
                keymap.cols(),
                keymap.tapping_term_ms()
            );
            Ok(keymap)
        }
        Err(ConfigError::Invalid(errors)) => {
            let details: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
            Err(anyhow!(
                "Config {} is invalid:\n{}\nRun 'ergomux validate' for a full report",
                path.display(),
                details.join("\n")
            ))
        }
        Err(e) => Err(e.into()),
    }
}

fn open_store(state_path: Option<PathBuf>) -> Result<JsonFileStore> {
    let path = match state_path {
        Some(path) => path,
        None => JsonFileStore::default_path().context("Failed to get config directory")?,
    };
    Ok(JsonFileStore::new(path))
}

fn replay(config: Option<PathBuf>, state: Option<PathBuf>, script: &Path) -> Result<()> {
    let keymap = load_keymap(config)?;
    let store = open_store(state)?;
    let mut printer = EmitPrinter::new(keymap.clone());
    let mut processor = KeymapProcessor::new(keymap, Box::new(store));

    let file = std::fs::File::open(script)
        .with_context(|| format!("Failed to open script {}", script.display()))?;

    let mut last = Timestamp::default();
    for (line_no, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", script.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let transition: KeyTransition = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: bad transition", script.display(), line_no + 1))?;

        processor.tick(transition.timestamp);
        printer.at = transition.timestamp;
        println!("{}", transition.to_string().bright_white());
        for emit in processor.process_key(transition) {
            printer.emit(emit);
        }
        last = transition.timestamp;
    }

    let leftover = processor.release_all();
    if !leftover.is_empty() {
        println!("{}", "end of script".dimmed());
        printer.at = last;
        for emit in leftover {
            printer.emit(emit);
        }
    }
    Ok(())
}

fn listen(config: Option<PathBuf>, state: Option<PathBuf>) -> Result<()> {
    let keymap = load_keymap(config)?;
    let store = open_store(state)?;
    let clock = SystemClock::new();
    let mut printer = EmitPrinter::new(keymap.clone());
    printer.clock = Some(clock);
    let processor = KeymapProcessor::new(keymap, Box::new(store));

    let (events_tx, events_rx) = unbounded();
    let (shutdown_tx, shutdown_rx) = unbounded();

    let handle = start_event_processor(
        processor,
        events_rx,
        shutdown_rx,
        printer,
        clock,
        DEFAULT_TICK_INTERVAL,
    );

    println!(
        "{}",
        "Type 'press ROW COL' or 'release ROW COL', Ctrl-D to quit".dimmed()
    );

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((pressed, row, col)) = cli::parse_listen_line(&line) else {
            warn!("Unrecognized input: {}", line.trim());
            continue;
        };
        let transition = KeyTransition {
            row,
            col,
            pressed,
            timestamp: clock.now(),
        };
        if events_tx.send(transition).is_err() {
            break;
        }
    }

    let _ = shutdown_tx.send(());
    drop(events_tx);
    handle
        .join()
        .map_err(|_| anyhow!("Event processor thread panicked"))?;
    Ok(())
}

fn default_layer(
    config: Option<PathBuf>,
    state: Option<PathBuf>,
    layer: Option<&str>,
) -> Result<()> {
    let keymap = load_keymap(config)?;
    let mut store = open_store(state)?;

    if let Some(name) = layer {
        let id = keymap
            .layer_id(name)
            .with_context(|| format!("No layer named '{name}' in the config"))?;
        store
            .save(id)
            .with_context(|| format!("Failed to write {}", store.path().display()))?;
        println!(
            "{} Default layer set to {}",
            "✓".bright_green().bold(),
            name.bright_cyan()
        );
        return Ok(());
    }

    let stored = store
        .load()
        .with_context(|| format!("Failed to read {}", store.path().display()))?;
    let config_default = layer_label(&keymap, keymap.default_layer().0);
    match stored {
        Some(id) if id.index() < keymap.layer_count() => {
            println!(
                "{} {}",
                "Default layer:".bright_yellow().bold(),
                layer_label(&keymap, id.0).bright_cyan()
            );
        }
        Some(id) => {
            println!(
                "{} stored layer {} no longer exists, using {}",
                "⚠".bright_yellow(),
                id,
                config_default.bright_cyan()
            );
        }
        None => {
            println!(
                "{} {} {}",
                "Default layer:".bright_yellow().bold(),
                config_default.bright_cyan(),
                "(from config)".dimmed()
            );
        }
    }
    Ok(())
}

fn layer_label(keymap: &Keymap, id: u8) -> String {
    keymap
        .layer_name(ergomux::config::LayerId(id))
        .map_or_else(|| format!("#{id}"), ToString::to_string)
}

/// Prints emitted actions with layer names instead of ids
struct EmitPrinter {
    keymap: Keymap,
    at: Timestamp,
    clock: Option<SystemClock>,
}

impl EmitPrinter {
    fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            at: Timestamp::default(),
            clock: None,
        }
    }

    fn describe(&self, snapshot: &LayerSnapshot) -> String {
        let active: Vec<String> = snapshot
            .active
            .iter()
            .map(|layer| layer_label(&self.keymap, layer.0))
            .collect();
        format!(
            "default={} active=[{}]",
            layer_label(&self.keymap, snapshot.default_layer.0),
            active.join(", ")
        )
    }
}

impl ActionEmitter for EmitPrinter {
    fn emit(&mut self, emit: Emit) {
        let at = self.clock.as_ref().map_or(self.at, Clock::now);
        let text = match &emit {
            Emit::KeyDown(_) => emit.to_string().bright_green(),
            Emit::KeyUp(_) => emit.to_string().green(),
            Emit::TypeSequence(_) => emit.to_string().bright_magenta().bold(),
            Emit::LayerChanged(snapshot) => {
                format!("layers {}", self.describe(snapshot)).bright_cyan()
            }
        };
        println!("  {:>8} {}", at.to_string().dimmed(), text);
    }
}
