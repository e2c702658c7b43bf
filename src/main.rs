// Hide console window on Windows for release builds (GUI app).
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::process::ExitCode;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use clap::{Parser, Subcommand};
use colored::Colorize;

use tabletop_dice::dice3d::{
    ArenaWorld, DiceError, DiceRollPlugin, DiceTable, DiceType, EngineSettings, NullRenderer,
    RollOutcome,
};

/// Tabletop Dice - physics-driven dice table
#[derive(Parser)]
#[command(name = "tabletop-dice")]
#[command(author, version, about = "Physics-driven dice roller with a 3D table")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Dice thrown when the table opens (e.g. "d20", "2d6"). Repeatable.
    #[arg(short, long, value_parser = parse_dice_arg)]
    dice: Vec<(usize, DiceType)>,

    /// Fixed random seed for reproducible throws
    #[arg(long)]
    seed: Option<u64>,

    /// Engine settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll dice on a headless table and print the results
    Roll {
        /// Dice to roll (e.g. "d20", "2d6")
        #[arg(required = true, value_parser = parse_dice_arg)]
        dice: Vec<(usize, DiceType)>,

        /// Fixed random seed for reproducible throws
        #[arg(long)]
        seed: Option<u64>,

        /// Number of times to throw the whole set
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Engine settings JSON file
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Log engine activity to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_dice_arg(s: &str) -> Result<(usize, DiceType), String> {
    let s = s.to_lowercase();

    let (count_str, die_str) = if s.starts_with('d') {
        ("1", s.as_str())
    } else if let Some(pos) = s.find('d') {
        (&s[..pos], &s[pos..])
    } else {
        return Err(format!(
            "Invalid dice format: {}. Use format like '2d6' or 'd20'",
            s
        ));
    };

    let count: usize = count_str
        .parse()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| format!("Invalid count: {}", count_str))?;
    let die_type = DiceType::parse(die_str).ok_or_else(|| {
        format!(
            "Unknown die type: {}. Valid: d4, d6, d8, d10, d12, d20, d100",
            die_str
        )
    })?;

    Ok((count, die_type))
}

fn expand_dice(dice: &[(usize, DiceType)]) -> Vec<DiceType> {
    dice.iter()
        .flat_map(|(count, kind)| std::iter::repeat_n(*kind, *count))
        .collect()
}

fn load_settings(path: Option<&PathBuf>, seed: Option<u64>) -> Result<EngineSettings, DiceError> {
    let mut settings = match path {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::default(),
    };
    if seed.is_some() {
        settings.seed = seed;
    }
    Ok(settings)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Roll {
            dice,
            seed,
            count,
            settings,
            verbose,
        }) => {
            if verbose {
                bevy::log::tracing_subscriber::fmt()
                    .with_max_level(bevy::log::Level::DEBUG)
                    .with_writer(std::io::stderr)
                    .init();
            }
            match run_headless(&expand_dice(&dice), seed, count, settings.as_ref()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    ExitCode::FAILURE
                }
            }
        }
        None => {
            let settings = match load_settings(cli.settings.as_ref(), cli.seed) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    return ExitCode::FAILURE;
                }
            };
            run_3d_mode(settings, expand_dice(&cli.dice));
            ExitCode::SUCCESS
        }
    }
}

// ============================================================================
// 3D Mode
// ============================================================================

fn run_3d_mode(settings: EngineSettings, initial_dice: Vec<DiceType>) {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Tabletop Dice".to_string(),
                        resolution: (1280u32, 720u32).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(bevy::log::LogPlugin {
                    level: bevy::log::Level::INFO,
                    filter: "info,wgpu=error".to_string(),
                    ..default()
                }),
        )
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(DiceRollPlugin {
            settings,
            initial_dice,
        })
        .run();
}

// ============================================================================
// Headless Mode
// ============================================================================

fn run_headless(
    dice: &[DiceType],
    seed: Option<u64>,
    count: usize,
    settings_path: Option<&PathBuf>,
) -> Result<(), DiceError> {
    let settings = load_settings(settings_path, seed)?;
    let max_frames = settings.settle.max_roll_ticks as usize + 1;

    let mut table = DiceTable::create(settings, ArenaWorld::new(), NullRenderer::new())?;
    table.start();

    for round in 0..count.max(1) {
        let mut tickets = Vec::with_capacity(dice.len());
        for kind in dice {
            tickets.push(table.request_kind(*kind)?);
        }
        table.run_until_idle(max_frames);

        let outcomes: Vec<RollOutcome> = tickets
            .iter_mut()
            .filter_map(|ticket| ticket.try_outcome())
            .collect();
        if count > 1 {
            println!("\n{} {}", "Round".bold().white(), (round + 1).to_string().cyan());
        }
        print_roll(&outcomes);
    }

    table.destroy();
    Ok(())
}

fn print_roll(outcomes: &[RollOutcome]) {
    let rule = "═".repeat(39);
    println!("\n{}", rule.cyan());

    let dice_str: Vec<String> = outcomes.iter().map(|o| o.die_type.name().to_string()).collect();
    println!(
        "{} {}",
        "Rolling:".bold().white(),
        dice_str.join(", ").yellow().bold()
    );

    let rolls_str: Vec<String> = outcomes
        .iter()
        .map(|o| {
            let roll = format!("[{}]", o.value);
            let roll_color = match (o.die_type, o.value) {
                (DiceType::D20, 20) => roll.bright_green().bold().to_string(),
                (DiceType::D20, 1) => roll.bright_red().bold().to_string(),
                _ => roll.bright_white().bold().to_string(),
            };
            let forced = if o.forced { " (forced)".dimmed().to_string() } else { String::new() };
            format!("{}: {}{}", o.die_type.name(), roll_color, forced)
        })
        .collect();
    println!("{} {}", "Dice:".bold().white(), rolls_str.join(", "));

    let total: u32 = outcomes.iter().map(|o| o.value).sum();
    let d20_roll = match outcomes {
        [only] if only.die_type == DiceType::D20 => Some(only.value),
        _ => None,
    };

    let total_color = match d20_roll {
        Some(20) => format!("{}", total).bright_green().bold(),
        Some(1) => format!("{}", total).bright_red().bold(),
        _ => format!("{}", total).white().bold(),
    };
    println!("{} {}", "Total:".bold().white(), total_color);

    if let Some(20) = d20_roll {
        println!("{}", "NATURAL 20! CRITICAL SUCCESS!".bright_green().bold());
    } else if let Some(1) = d20_roll {
        println!("{}", "NATURAL 1! CRITICAL FAILURE!".bright_red().bold());
    }

    println!("{}", rule.cyan());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dice_arg() {
        assert_eq!(parse_dice_arg("d20"), Ok((1, DiceType::D20)));
        assert_eq!(parse_dice_arg("3D6"), Ok((3, DiceType::D6)));
        assert_eq!(parse_dice_arg("d100"), Ok((1, DiceType::D100)));
        assert!(parse_dice_arg("20").is_err());
        assert!(parse_dice_arg("xd6").is_err());
        assert!(parse_dice_arg("d7").is_err());
        assert_eq!(
            parse_dice_arg("0d6"),
            Err("Invalid count: 0".to_string())
        );
    }

    #[test]
    fn test_expand_dice() {
        let dice = expand_dice(&[(2, DiceType::D6), (1, DiceType::D20)]);
        assert_eq!(dice, vec![DiceType::D6, DiceType::D6, DiceType::D20]);
    }
}
