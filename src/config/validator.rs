use crate::config::{Config, HoldAction, KeyAction, Layer, ValidationError};
use anyhow::Result;
use std::collections::HashSet;

/// Check a config for everything that would make it unloadable
///
/// Returns every problem found, in file order. An empty result means
/// [`Keymap::from_config`](crate::event_processor::resolver::Keymap::from_config)
/// will accept it.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.tapping_term_ms == 0 || config.tapping_term_ms > 1000 {
        errors.push(ValidationError::TappingTermOutOfRange(
            config.tapping_term_ms,
        ));
    }

    if config.rows == 0 || config.cols == 0 {
        errors.push(ValidationError::EmptyMatrix {
            rows: config.rows,
            cols: config.cols,
        });
    }

    if config.layers.is_empty() {
        errors.push(ValidationError::NoLayers);
    } else if config.layers.len() > 256 {
        errors.push(ValidationError::TooManyLayers(config.layers.len()));
    }

    let mut names: HashSet<&Layer> = HashSet::new();
    for layer_config in &config.layers {
        if !names.insert(&layer_config.name) {
            errors.push(ValidationError::DuplicateLayer(layer_config.name.clone()));
        }
    }

    let check_ref = |layer: &Layer, referenced_from: String, errors: &mut Vec<ValidationError>| {
        if !names.contains(layer) {
            errors.push(ValidationError::UnknownLayer {
                layer: layer.clone(),
                referenced_from,
            });
        }
    };

    check_ref(&config.default_layer, "default_layer".to_string(), &mut errors);
    if let Some(startup) = &config.startup_layer {
        check_ref(startup, "startup_layer".to_string(), &mut errors);
    }

    let rows = usize::from(config.rows);
    let cols = usize::from(config.cols);

    for layer_config in &config.layers {
        let layer = &layer_config.name;

        if layer_config.keys.len() != rows {
            errors.push(ValidationError::RowCount {
                layer: layer.clone(),
                expected: rows,
                found: layer_config.keys.len(),
            });
        }

        for (row, keys) in layer_config.keys.iter().enumerate() {
            if keys.len() != cols {
                errors.push(ValidationError::ColumnCount {
                    layer: layer.clone(),
                    row,
                    expected: cols,
                    found: keys.len(),
                });
            }

            for (col, action) in keys.iter().enumerate() {
                if let Some(target) = action.layer_ref() {
                    check_ref(
                        target,
                        format!("layer \"{layer}\" ({row}, {col})"),
                        &mut errors,
                    );
                }

                match action {
                    KeyAction::Modifier(code)
                    | KeyAction::DualTapHold {
                        hold: HoldAction::Modifier(code),
                        ..
                    } if !code.is_modifier() => {
                        errors.push(ValidationError::NotAModifier {
                            layer: layer.clone(),
                            row,
                            col,
                            code: *code,
                        });
                    }
                    _ => {}
                }

                if let KeyAction::Chord { mods, .. } = action {
                    for code in mods.iter().filter(|code| !code.is_modifier()) {
                        errors.push(ValidationError::NotAModifier {
                            layer: layer.clone(),
                            row,
                            col,
                            code: *code,
                        });
                    }
                }

                if let KeyAction::DualTapHold { tap, .. } = action {
                    if tap.is_empty() {
                        errors.push(ValidationError::EmptyTapSequence {
                            layer: layer.clone(),
                            row,
                            col,
                        });
                    }
                }
            }
        }
    }

    errors
}

/// Load a config file and print a validation report
pub fn report_validation(config_path: Option<&std::path::Path>) -> Result<()> {
    use colored::Colorize;

    println!();
    println!(
        "{}",
        "═══════════════════════════════════════".bright_cyan()
    );
    println!("  {}", "Config Validation".bright_cyan().bold());
    println!(
        "{}",
        "═══════════════════════════════════════".bright_cyan()
    );
    println!();

    let config_path = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        Config::default_path()?
    };

    println!(
        "  {} {}",
        "Config file:".bright_yellow(),
        config_path.display().to_string().dimmed()
    );
    println!();

    print!("  {} Loading config... ", "→".bright_blue());
    let config = match Config::load(&config_path) {
        Ok(cfg) => {
            println!("{}", "✓".bright_green().bold());
            cfg
        }
        Err(e) => {
            println!("{}", "✗".bright_red().bold());
            println!();
            println!("  {} {}", "Error:".bright_red().bold(), e);
            println!();
            return Err(e.into());
        }
    };

    print!("  {} Checking layers... ", "→".bright_blue());
    let errors = validate_config(&config);
    if errors.is_empty() {
        println!(
            "{} {} layers, {}x{} matrix",
            "✓".bright_green().bold(),
            config.layers.len(),
            config.rows,
            config.cols
        );
    } else {
        println!("{}", "✗".bright_red().bold());
    }

    println!();
    println!(
        "{}",
        "═══════════════════════════════════════".bright_cyan()
    );

    if errors.is_empty() {
        println!(
            "  {} {}",
            "✓".bright_green().bold(),
            "Config is valid!".bright_green()
        );
    } else {
        println!(
            "  {} {}",
            "✗".bright_red().bold(),
            format!("{} error(s)", errors.len()).bright_red()
        );
        for error in &errors {
            println!("    {} {}", "•".bright_red(), error);
        }
    }

    println!(
        "{}",
        "═══════════════════════════════════════".bright_cyan()
    );
    println!();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Config validation failed with {} error(s)",
            errors.len()
        ))
    }
}
