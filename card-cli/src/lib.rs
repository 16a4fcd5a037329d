//! # Map Card CLI
//!
//! Command-line host for the map card layout engine. Every subcommand
//! opens a document file, applies one edit through an editing session, and
//! saves it back.
//!
//! ## Usage
//!
//! ```bash
//! mapcard new card.json --name "Ranked Card"
//! mapcard card card.json --width 600 --corner-radius 12
//! mapcard add card.json rating --x 30 --y 210
//! mapcard set card.json comp1 cornerRadius 12
//! mapcard resolve card.json --data beatmap.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Editing configuration and data directory
//! - `run` - Executes one [`Command`] against a document file

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod commands;

pub use commands::{run, CliError};

use std::path::PathBuf;

use card_core::{ComponentTag, EditorConfig, GridPolicy, SnapPolicy};
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for mapcard.
#[derive(Debug, Clone, Parser)]
#[command(name = "mapcard")]
#[command(about = "Compose map card layouts from the command line")]
#[command(version)]
pub struct CliArgs {
    /// Directory for exported documents
    #[arg(long, global = true, env = "MAPCARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fixed grid step in pixels (default: a tenth of the card's shorter edge)
    #[arg(long, global = true, env = "MAPCARD_GRID_STEP")]
    pub grid_step: Option<f64>,

    /// When drag positions snap to the grid
    #[arg(long, global = true, value_enum, env = "MAPCARD_SNAP", default_value = "on-release")]
    pub snap: SnapArg,

    /// Smallest width or height a resize can produce
    #[arg(long, global = true, default_value = "20")]
    pub min_size: f64,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Snapping policy as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapArg {
    /// Snap once when the pointer is released.
    OnRelease,
    /// Snap on every pointer move.
    Continuous,
}

impl From<SnapArg> for SnapPolicy {
    fn from(arg: SnapArg) -> Self {
        match arg {
            SnapArg::OnRelease => Self::OnRelease,
            SnapArg::Continuous => Self::Continuous,
        }
    }
}

/// Background kind for the `background` subcommand.
#[derive(Debug, Clone, Subcommand)]
pub enum BackgroundArg {
    /// Solid color
    Color {
        /// CSS color
        color: String,
    },
    /// Blurred cover image
    Cover {
        /// Literal path or a single {token}
        #[arg(default_value = "{versions.0.coverURL}")]
        path: String,
        /// Blur radius in pixels
        #[arg(long, default_value = "10")]
        blur: f64,
    },
}

/// Subcommands. Positions are one-based, as printed by `show`.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write a new empty document
    New {
        /// Document file
        path: PathBuf,
        /// Document name, used for the export file name
        #[arg(long, default_value = "MyCardConfig")]
        name: String,
        /// Card width in pixels
        #[arg(long, default_value = "900")]
        width: f64,
        /// Card height in pixels
        #[arg(long, default_value = "300")]
        height: f64,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Change the card's name, size or corner radius
    Card {
        /// Document file
        path: PathBuf,
        /// New document name
        #[arg(long)]
        name: Option<String>,
        /// New card width in pixels
        #[arg(long)]
        width: Option<f64>,
        /// New card height in pixels
        #[arg(long)]
        height: Option<f64>,
        /// New corner radius of the card in pixels
        #[arg(long)]
        corner_radius: Option<f64>,
    },
    /// Print the components in paint order
    Show {
        /// Document file
        path: PathBuf,
    },
    /// Add a default component at a snapped position
    Add {
        /// Document file
        path: PathBuf,
        /// Component type: rect, text, image or rating
        kind: ComponentTag,
        /// Drop position, horizontal
        #[arg(long, default_value = "0")]
        x: f64,
        /// Drop position, vertical
        #[arg(long, default_value = "0")]
        y: f64,
        /// For text: bind to a map field (mapname, author, mapper, ...)
        #[arg(long)]
        field: Option<String>,
    },
    /// Remove a component
    Remove {
        /// Document file
        path: PathBuf,
        /// Component id
        id: String,
    },
    /// Move a component to another position in paint order
    Reorder {
        /// Document file
        path: PathBuf,
        /// Current position
        from: usize,
        /// New position
        to: usize,
    },
    /// Set one field of a component (`type` changes its variant)
    Set {
        /// Document file
        path: PathBuf,
        /// Component id
        id: String,
        /// Field name, e.g. cornerRadius or shadow.offsetX
        key: String,
        /// JSON value; anything that is not JSON is taken as a string
        value: String,
    },
    /// Replace the card background
    Background {
        /// Document file
        path: PathBuf,
        /// New background
        #[command(subcommand)]
        kind: BackgroundArg,
    },
    /// Print the resolved card view as JSON
    Resolve {
        /// Document file
        path: PathBuf,
        /// Map metadata JSON file
        #[arg(long)]
        data: PathBuf,
    },
    /// List token paths available in map metadata
    Tokens {
        /// Map metadata JSON file
        #[arg(long)]
        data: PathBuf,
        /// Path to list the children of
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Write the document text under its export file name
    Export {
        /// Document file
        path: PathBuf,
        /// Output directory (default: the data directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Editing configuration.
    pub editor: EditorConfig,
    /// Directory for exported documents.
    pub data_dir: Option<PathBuf>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        let grid = args
            .grid_step
            .map_or(GridPolicy::Proportional, |step| GridPolicy::Fixed { step });
        Self {
            editor: EditorConfig {
                grid,
                snap: args.snap.into(),
                min_size: args.min_size,
            },
            data_dir: args.data_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_alias() {
        let args = CliArgs::try_parse_from(["mapcard", "add", "card.json", "rating", "--x", "30"])
            .expect("parse");
        let Command::Add { kind, x, .. } = args.command else {
            panic!("Expected add");
        };
        assert_eq!(kind, ComponentTag::RatingBar);
        assert!((x - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_from_args() {
        let args = CliArgs::try_parse_from([
            "mapcard",
            "--grid-step",
            "10",
            "--snap",
            "continuous",
            "show",
            "card.json",
        ])
        .expect("parse");
        let config = CliConfig::from(&args);
        assert_eq!(config.editor.grid, GridPolicy::Fixed { step: 10.0 });
        assert_eq!(config.editor.snap, SnapPolicy::Continuous);
    }

    #[test]
    fn test_default_config_is_proportional() {
        let args = CliArgs::try_parse_from(["mapcard", "show", "card.json"]).expect("parse");
        let config = CliConfig::from(&args);
        assert_eq!(config.editor.grid, GridPolicy::Proportional);
        assert!((config.editor.min_size - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_card_settings() {
        let args = CliArgs::try_parse_from([
            "mapcard",
            "card",
            "card.json",
            "--name",
            "Ranked Card",
            "--corner-radius",
            "12",
        ])
        .expect("parse");
        let Command::Card {
            name,
            width,
            corner_radius,
            ..
        } = args.command
        else {
            panic!("Expected card");
        };
        assert_eq!(name.as_deref(), Some("Ranked Card"));
        assert!(width.is_none());
        assert!(corner_radius.is_some_and(|radius| (radius - 12.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(CliArgs::try_parse_from(["mapcard", "add", "card.json", "circle"]).is_err());
    }
}
