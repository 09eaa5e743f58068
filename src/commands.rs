//! Command handlers behind the `smartqr` binary.
//!
//! Handlers write their user-facing output to the supplied writer so they can be driven from
//! tests; diagnostics go through `tracing`.
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::Utc;

use crate::classify::{classify, Classification, SAMPLE_INPUTS};
use crate::cli::{Cli, Commands, GenerateArgs, HistoryCommand};
use crate::clipboard::{copy_image, copy_text, SystemClipboard};
use crate::config::Config;
use crate::export::{save_png, save_svg};
use crate::history::{format_age, History, HistoryItem, JsonFileStore};
use crate::render::{render, to_terminal_string, RenderOptions};

/// Resolved settings shared by every command.
#[derive(Clone, Debug)]
pub struct AppContext {
    pub config: Config,
    pub history_path: PathBuf,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
        let history_path = cli
            .history_file
            .clone()
            .unwrap_or_else(|| config.history_path());
        Ok(Self {
            config,
            history_path,
        })
    }

    fn open_history(&self) -> Result<History<JsonFileStore>> {
        History::open(
            JsonFileStore::new(&self.history_path),
            self.config.history.limit,
        )
        .with_context(|| format!("failed to open history {}", self.history_path.display()))
    }
}

/// Runs the parsed command line.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let ctx = AppContext::from_cli(&cli)?;
    match cli.command {
        Commands::Classify {
            text,
            json,
            samples,
        } => {
            let inputs: Vec<String> = if samples {
                SAMPLE_INPUTS.iter().map(|s| s.to_string()).collect()
            } else {
                text.into_iter().collect()
            };
            handle_classify(&inputs, json, out)
        }
        Commands::Generate(args) => handle_generate(&ctx, &args, out),
        Commands::History { action } => handle_history(&ctx, action, out),
    }
}

pub fn handle_classify(inputs: &[String], json: bool, out: &mut dyn Write) -> Result<()> {
    let results: Vec<Classification> = inputs.iter().map(|s| classify(s)).collect();
    if json {
        if let [single] = results.as_slice() {
            serde_json::to_writer_pretty(&mut *out, single)?;
        } else {
            serde_json::to_writer_pretty(&mut *out, &results)?;
        }
        writeln!(out)?;
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "input:       {}", result.original)?;
        writeln!(out, "kind:        {}", result.kind)?;
        writeln!(out, "payload:     {}", result.formatted)?;
        writeln!(out, "description: {}", result.description)?;
    }
    Ok(())
}

/// Render options from config, with command-line overrides applied.
fn render_options(config: &Config, args: &GenerateArgs) -> RenderOptions {
    let mut options = config.render.clone();
    if let Some(width) = args.width {
        options.width = width;
    }
    if let Some(margin) = args.margin {
        options.margin = margin;
    }
    if let Some(dark) = args.dark {
        options.dark = dark;
    }
    if let Some(light) = args.light {
        options.light = light;
    }
    if let Some(ecc) = args.ecc {
        options.ecc = ecc.into();
    }
    options
}

pub fn handle_generate(ctx: &AppContext, args: &GenerateArgs, out: &mut dyn Write) -> Result<()> {
    let classification = classify(&args.text);
    let options = render_options(&ctx.config, args);
    let rendered = render(&classification.formatted, &options)
        .with_context(|| format!("failed to encode `{}`", classification.formatted))?;

    if !args.quiet {
        writeln!(out, "{}", classification.description)?;
        writeln!(out, "payload: {}", classification.formatted)?;
        write!(out, "{}", to_terminal_string(&rendered.qr, 2))?;
    }

    if let Some(path) = &args.png {
        save_png(&rendered.raster, path)?;
        writeln!(out, "saved {}", path.display())?;
    }
    if let Some(path) = &args.svg {
        save_svg(&rendered.svg, path)?;
        writeln!(out, "saved {}", path.display())?;
    }

    if args.copy || args.copy_text {
        let mut clipboard = SystemClipboard::new()?;
        if args.copy {
            copy_image(&mut clipboard, &rendered.raster)?;
            writeln!(out, "copied image to clipboard")?;
        } else {
            copy_text(&mut clipboard, &classification.formatted)?;
            writeln!(out, "copied payload to clipboard")?;
        }
    }

    if !args.no_history {
        let mut history = ctx.open_history()?;
        let id = history.add(&classification)?;
        tracing::debug!(%id, "recorded in history");
    }
    Ok(())
}

pub fn handle_history(ctx: &AppContext, action: HistoryCommand, out: &mut dyn Write) -> Result<()> {
    let mut history = ctx.open_history()?;
    match action {
        HistoryCommand::List {
            favorites,
            recent,
            json,
        } => {
            let items: Vec<&HistoryItem> = if favorites {
                history.favorites()
            } else if recent {
                history.recent().iter().collect()
            } else {
                history.items().iter().collect()
            };
            if json {
                serde_json::to_writer_pretty(&mut *out, &items)?;
                writeln!(out)?;
            } else if items.is_empty() {
                writeln!(out, "history is empty")?;
            } else {
                let now = Utc::now().timestamp_millis();
                for item in items {
                    writeln!(
                        out,
                        "{} {} {:<5} {:<10} {}",
                        item.id,
                        if item.is_favorite { '*' } else { ' ' },
                        item.kind,
                        format_age(item.timestamp, now),
                        item.formatted
                    )?;
                }
            }
        }
        HistoryCommand::Show { id } => {
            let item = history
                .get(&id)
                .with_context(|| format!("no history entry with id {id}"))?;
            serde_json::to_writer_pretty(&mut *out, item)?;
            writeln!(out)?;
        }
        HistoryCommand::Favorite { id } => {
            let favorite = history.toggle_favorite(&id)?;
            let state = if favorite { "added to" } else { "removed from" };
            writeln!(out, "{id} {state} favorites")?;
        }
        HistoryCommand::Remove { id } => {
            history.remove(&id)?;
            writeln!(out, "removed {id}")?;
        }
        HistoryCommand::Clear => {
            history.clear()?;
            writeln!(out, "history cleared")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dir: &tempfile::TempDir) -> AppContext {
        AppContext {
            config: Config::default(),
            history_path: dir.path().join("history.json"),
        }
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_classify_table() {
        let text = output(|out| handle_classify(&["naver.com".to_string()], false, out));
        assert!(text.contains("kind:        url"));
        assert!(text.contains("payload:     https://naver.com"));
    }

    #[test]
    fn test_classify_json_single_and_many() {
        let one = output(|out| handle_classify(&["a@b.com".to_string()], true, out));
        let value: serde_json::Value = serde_json::from_str(&one).unwrap();
        assert_eq!(value["kind"], "email");

        let inputs: Vec<String> = SAMPLE_INPUTS.iter().map(|s| s.to_string()).collect();
        let many = output(|out| handle_classify(&inputs, true, out));
        let value: serde_json::Value = serde_json::from_str(&many).unwrap();
        assert_eq!(value.as_array().unwrap().len(), SAMPLE_INPUTS.len());
    }

    #[test]
    fn test_generate_exports_and_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let args = GenerateArgs {
            text: "010-1234-5678".into(),
            png: Some(dir.path().join("qr.png")),
            svg: Some(dir.path().join("qr.svg")),
            quiet: true,
            ..GenerateArgs::default()
        };

        let text = output(|out| handle_generate(&ctx, &args, out));

        assert!(text.contains("saved"));
        assert!(dir.path().join("qr.png").exists());
        assert!(dir.path().join("qr.svg").exists());
        let history = ctx.open_history().unwrap();
        assert_eq!(history.items()[0].formatted, "tel:01012345678");
    }

    #[test]
    fn test_generate_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let args = GenerateArgs {
            text: "hello".into(),
            width: Some(1),
            margin: Some(0),
            svg: Some(dir.path().join("small.svg")),
            no_history: true,
            quiet: true,
            ..GenerateArgs::default()
        };

        output(|out| handle_generate(&ctx, &args, out));

        let svg = std::fs::read_to_string(dir.path().join("small.svg")).unwrap();
        assert!(svg.contains("viewBox=\"0 0 21 21\""));
        assert!(!ctx.history_path.exists());
    }

    #[test]
    fn test_generate_blank_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let args = GenerateArgs {
            text: "   ".into(),
            quiet: true,
            ..GenerateArgs::default()
        };
        let mut buf = Vec::new();
        assert!(handle_generate(&ctx, &args, &mut buf).is_err());
    }

    #[test]
    fn test_history_commands() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let id = {
            let mut history = ctx.open_history().unwrap();
            history.add(&classify("WiFi:Home:pw")).unwrap()
        };

        let listed = output(|out| {
            handle_history(
                &ctx,
                HistoryCommand::List {
                    favorites: false,
                    recent: false,
                    json: false,
                },
                out,
            )
        });
        assert!(listed.contains(&id));
        assert!(listed.contains("WIFI:T:WPA;S:Home;P:pw;;"));

        let fav = output(|out| handle_history(&ctx, HistoryCommand::Favorite { id: id.clone() }, out));
        assert!(fav.contains("added to favorites"));

        let favorites = output(|out| {
            handle_history(
                &ctx,
                HistoryCommand::List {
                    favorites: true,
                    recent: false,
                    json: true,
                },
                out,
            )
        });
        let value: serde_json::Value = serde_json::from_str(&favorites).unwrap();
        assert_eq!(value[0]["id"], id.as_str());

        output(|out| handle_history(&ctx, HistoryCommand::Remove { id: id.clone() }, out));
        let empty = output(|out| {
            handle_history(
                &ctx,
                HistoryCommand::List {
                    favorites: false,
                    recent: true,
                    json: false,
                },
                out,
            )
        });
        assert!(empty.contains("history is empty"));
    }

    #[test]
    fn test_history_show_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let mut buf = Vec::new();
        let result = handle_history(&ctx, HistoryCommand::Show { id: "nope".into() }, &mut buf);
        assert!(result.is_err());
    }
}
