use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::export::{DEFAULT_PNG_NAME, DEFAULT_SVG_NAME};
use crate::qrcode::QrCodeEcc;
use crate::render::Color;

#[derive(Parser, Debug)]
#[command(name = "smartqr")]
#[command(about = "Turn text into QR codes, recognising phone numbers, e-mail, URLs, SMS, WiFi and coordinates", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SMARTQR_CONFIG")]
    pub config: Option<PathBuf>,

    /// History file, overriding the configured one
    #[arg(long = "history-file", global = true, env = "SMARTQR_HISTORY")]
    pub history_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how text would be classified and encoded
    Classify {
        /// Text to classify
        #[arg(required_unless_present = "samples")]
        text: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Classify the built-in sample inputs
        #[arg(long, conflicts_with = "text")]
        samples: bool,
    },

    /// Classify text, encode it and export the QR code
    Generate(GenerateArgs),

    /// Inspect and edit the history of generated codes
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Text to encode
    pub text: String,

    /// Write a PNG image (qrcode.png when no path is given)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_PNG_NAME)]
    pub png: Option<PathBuf>,

    /// Write an SVG image (qrcode.svg when no path is given)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_SVG_NAME)]
    pub svg: Option<PathBuf>,

    /// Copy the image to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Copy the encoded payload text to the clipboard
    #[arg(long = "copy-text", conflicts_with = "copy")]
    pub copy_text: bool,

    /// Do not record this code in the history
    #[arg(long = "no-history")]
    pub no_history: bool,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Quiet zone in modules
    #[arg(long)]
    pub margin: Option<u32>,

    /// Module colour (#RGB, #RRGGBB or #RRGGBBAA)
    #[arg(long)]
    pub dark: Option<Color>,

    /// Background colour (#RGB, #RRGGBB or #RRGGBBAA)
    #[arg(long)]
    pub light: Option<Color>,

    /// Minimum error correction level
    #[arg(long, value_enum)]
    pub ecc: Option<EccLevel>,

    /// Do not print the code to the terminal
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List entries, newest first
    List {
        /// Only favorites
        #[arg(long, conflicts_with = "recent")]
        favorites: bool,

        /// Only the most recent entries
        #[arg(long)]
        recent: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one entry
    Show { id: String },
    /// Mark or unmark an entry as favorite
    Favorite { id: String },
    /// Delete an entry
    Remove { id: String },
    /// Delete every entry
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EccLevel {
    /// ~7% recovery
    #[value(alias = "l")]
    Low,
    /// ~15% recovery
    #[value(alias = "m")]
    Medium,
    /// ~25% recovery
    #[value(alias = "q")]
    Quartile,
    /// ~30% recovery
    #[value(alias = "h")]
    High,
}

impl From<EccLevel> for QrCodeEcc {
    fn from(level: EccLevel) -> Self {
        match level {
            EccLevel::Low => QrCodeEcc::Low,
            EccLevel::Medium => QrCodeEcc::Medium,
            EccLevel::Quartile => QrCodeEcc::Quartile,
            EccLevel::High => QrCodeEcc::High,
        }
    }
}
