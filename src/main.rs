//! # Cardstock CLI
//!
//! Command-line interface for the ID-card template engine.
//!
//! ## Usage
//!
//! ```bash
//! # Serve the editor API
//! cardstock serve --listen 0.0.0.0:8080 --font DejaVuSans.ttf
//!
//! # Render print sheets from a template and a record list
//! cardstock render --template card.json --records students.json \
//!     --font DejaVuSans.ttf --out sheets/
//!
//! # Write the clean downloadable template (all fields)
//! cardstock export --template card.json --out clean.json
//!
//! # Bundle per-card PNGs and a records CSV into a zip
//! cardstock bundle --template card.json --records students.json \
//!     --font DejaVuSans.ttf --out cards.zip
//! ```

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::collections::BTreeSet;
use std::path::PathBuf;

use cardstock::bundle::write_bundle;
use cardstock::error::CardstockError;
use cardstock::render::raster::{Rasterizer, encode_png};
use cardstock::render::resolve::ImageResolver;
use cardstock::render::{CARDS_PER_SHEET, Record, paginate, render_deck};
use cardstock::server::{ServerConfig, serve};
use cardstock::template::export::export_template;
use cardstock::template::{Face, FieldId, FieldIdGen, Template};

/// Cardstock - ID-card template engine and print compositor
#[derive(Parser, Debug)]
#[command(name = "cardstock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the template editor API over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// TTF font for sheet previews
        #[arg(long)]
        font: Option<PathBuf>,

        /// Snapshot directory (defaults to the platform data dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Render print sheets from a template and a record list
    Render {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Record list JSON file (array of flat objects)
        #[arg(long)]
        records: PathBuf,

        /// TTF font for card text
        #[arg(long)]
        font: PathBuf,

        /// Output directory for sheet PNGs
        #[arg(long, default_value = "sheets")]
        out: PathBuf,
    },

    /// Write the clean downloadable template (all fields included)
    Export {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Sides to include, comma-separated
        #[arg(long, default_value = "front,back")]
        sides: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Bundle per-card PNGs and a records CSV into a zip archive
    Bundle {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Record list JSON file (array of flat objects)
        #[arg(long)]
        records: PathBuf,

        /// TTF font for card text
        #[arg(long)]
        font: PathBuf,

        /// Output archive (defaults to cards-<date>.zip)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CardstockError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            font,
            data_dir,
        } => {
            serve(ServerConfig {
                listen_addr: listen,
                font_path: font,
                data_dir,
            })
            .await
        }

        Commands::Render {
            template,
            records,
            font,
            out,
        } => {
            let template = load_template(&template)?;
            let records = load_records(&records)?;
            let rasterizer = Rasterizer::from_font_file(&font)?;

            let deck = render_deck(&template, &records)?;
            let mut resolver = ImageResolver::new()?;
            let images = resolver.resolve_deck(&deck).await;
            let sheets = paginate(deck.cards, CARDS_PER_SHEET);

            std::fs::create_dir_all(&out)?;
            for (index, sheet) in sheets.iter().enumerate() {
                let canvas = rasterizer.rasterize_sheet(sheet, &images);
                let path = out.join(format!("sheet-{:02}.png", index + 1));
                std::fs::write(&path, encode_png(&canvas)?)?;
                println!("Wrote {}", path.display());
            }
            println!(
                "Rendered {} cards onto {} sheets",
                records.len(),
                sheets.len()
            );
            Ok(())
        }

        Commands::Export {
            template,
            sides,
            out,
        } => {
            let template = load_template(&template)?;
            let sides = parse_sides(&sides)?;

            // A file export has no editor selection; everything is in.
            let front: BTreeSet<FieldId> = template.front.items.iter().map(|f| f.id).collect();
            let back: BTreeSet<FieldId> = template
                .back
                .as_ref()
                .map(|s| s.items.iter().map(|f| f.id).collect())
                .unwrap_or_default();
            let clean = export_template(&template, &front, &back, &sides)?;
            let json = serde_json::to_string_pretty(&clean)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }

        Commands::Bundle {
            template,
            records,
            font,
            out,
        } => {
            let template = load_template(&template)?;
            let records = load_records(&records)?;
            let rasterizer = Rasterizer::from_font_file(&font)?;

            let deck = render_deck(&template, &records)?;
            let mut resolver = ImageResolver::new()?;
            let images = resolver.resolve_deck(&deck).await;

            let per_record = if template.is_two_sided() { 2 } else { 1 };
            let mut cards = Vec::with_capacity(deck.cards.len());
            for (index, card) in deck.cards.iter().enumerate() {
                let canvas = rasterizer.rasterize_card(card, &images);
                let name = format!("card-{:04}-{}.png", index / per_record + 1, card.face);
                cards.push((name, encode_png(&canvas)?));
            }

            let out = out.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "cards-{}.zip",
                    chrono::Local::now().format("%Y-%m-%d")
                ))
            });
            let summary = write_bundle(&out, &records, &cards)?;
            println!(
                "Wrote {} ({} entries)",
                out.display(),
                summary.entry_count
            );
            Ok(())
        }
    }
}

fn load_template(path: &PathBuf) -> Result<Template, CardstockError> {
    let json = std::fs::read_to_string(path)?;
    let mut ids = FieldIdGen::new();
    Template::from_json(&json, &mut ids)
}

fn load_records(path: &PathBuf) -> Result<Vec<Record>, CardstockError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn parse_sides(raw: &str) -> Result<Vec<Face>, CardstockError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "front" => Ok(Face::Front),
            "back" => Ok(Face::Back),
            other => Err(CardstockError::Export(format!("unknown side: {other}"))),
        })
        .collect()
}
