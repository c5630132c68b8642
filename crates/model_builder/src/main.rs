//! Model Builder CLI
//!
//! Corpus CSV → RE288 table / forest artifacts, plus a recommend command
//! for poking trained models from the shell.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use pitch_core::{find_similar, pitch_type_name, ArtifactCache, Recommender, Situation};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "model_builder")]
#[command(about = "Train and query pitch recommendation models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Build the RE288 run-expectancy table from a corpus CSV
    BuildRe {
        /// Input corpus CSV path (one row per pitch)
        #[arg(long)]
        corpus: PathBuf,

        /// Output table CSV path
        #[arg(long)]
        out: PathBuf,
    },

    /// Train the pitch-type classifier and location model
    Train {
        /// Input corpus CSV path (one row per pitch)
        #[arg(long)]
        corpus: PathBuf,

        /// Output directory for model artifacts
        #[arg(long)]
        out_dir: PathBuf,

        /// Run-expectancy table CSV (rebuilt from the corpus when omitted)
        #[arg(long)]
        re_table: Option<PathBuf>,

        /// Keep only better-than-median pitches before fitting
        #[arg(long, default_value = "false")]
        filter: bool,

        /// Forest seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Trees per forest
        #[arg(long, default_value = "100")]
        trees: usize,

        /// Output metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Recommend pitches for a game situation
    Recommend {
        /// Model directory holding trained artifacts
        #[arg(long)]
        model_dir: PathBuf,

        /// Balls in the count (0-3)
        #[arg(long, default_value = "0")]
        balls: u8,

        /// Strikes in the count (0-2)
        #[arg(long, default_value = "0")]
        strikes: u8,

        /// Outs in the half-inning (0-2)
        #[arg(long, default_value = "0")]
        outs: u8,

        #[arg(long, default_value = "1")]
        inning: u8,

        /// Runner on first base
        #[arg(long, default_value = "false")]
        on_1b: bool,

        /// Runner on second base
        #[arg(long, default_value = "false")]
        on_2b: bool,

        /// Runner on third base
        #[arg(long, default_value = "false")]
        on_3b: bool,

        /// Fielding-side score minus batting-side score
        #[arg(long, default_value = "0")]
        score_diff: i32,

        /// Batter hits left-handed
        #[arg(long, default_value = "false")]
        batter_lefty: bool,

        /// Pitcher throws left-handed
        #[arg(long, default_value = "false")]
        pitcher_lefty: bool,

        /// Previous-pitch feature code from the training encoding
        #[arg(long, default_value = "0")]
        prev_pitch_code: u32,

        /// How many pitch types to recommend
        #[arg(long, default_value = "3")]
        top_k: usize,

        /// Pitch history CSV for precedent lookup
        #[arg(long)]
        history: Option<PathBuf>,

        /// Max precedents to show for the top recommendation
        #[arg(long, default_value = "3")]
        precedents: usize,
    },

    /// Verify an artifact file against an expected checksum
    Verify {
        /// Artifact file to check
        #[arg(long)]
        artifact: PathBuf,

        /// Expected SHA256 checksum (hex)
        #[arg(long)]
        checksum: String,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildRe { corpus, out } => {
            println!("🔨 Building run-expectancy table...");
            println!("   Corpus: {}", corpus.display());
            println!("   Output: {}", out.display());

            let (table, stats) = model_builder::build_re_table(&corpus, &out)?;

            println!("\n✅ Table built successfully!");
            println!(
                "   Corpus rows: {} parsed, {} failed",
                stats.parsed, stats.failed
            );
            println!("   States:      {} of 288 observed", table.len());
        }

        Commands::Train {
            corpus,
            out_dir,
            re_table,
            filter,
            seed,
            trees,
            metadata,
        } => {
            println!("🔨 Training pitch models...");
            println!("   Corpus: {}", corpus.display());
            println!("   Output: {}", out_dir.display());
            println!("   Trees:  {} (seed {})", trees, seed);
            if filter {
                println!("   Filter: behavioral cloning on");
            }

            let options = model_builder::TrainOptions {
                filter,
                seed,
                trees,
                re_table,
            };
            let outcome = model_builder::train_models(&corpus, &out_dir, &options)?;

            println!("\n✅ Models trained successfully!");
            println!(
                "   Corpus rows:   {} parsed, {} failed",
                outcome.parse_stats.parsed, outcome.parse_stats.failed
            );
            println!("   Training rows: {}", outcome.engineered_rows);
            if let Some(report) = &outcome.filter_report {
                println!(
                    "   Filter:        {} -> {} rows (threshold {:.4})",
                    report.input_rows, report.retained_rows, report.threshold
                );
            }
            println!("\n{}", outcome.classification);
            println!("{}", outcome.regression);

            print_artifact(&outcome.classifier_path, &outcome.classifier_metadata);
            print_artifact(&outcome.location_path, &outcome.location_metadata);

            if let Some(metadata_path) = metadata {
                save_metadata(&metadata_path, &outcome)?;
            }
        }

        Commands::Recommend {
            model_dir,
            balls,
            strikes,
            outs,
            inning,
            on_1b,
            on_2b,
            on_3b,
            score_diff,
            batter_lefty,
            pitcher_lefty,
            prev_pitch_code,
            top_k,
            history,
            precedents,
        } => {
            let situation = Situation {
                inning,
                balls,
                strikes,
                outs_when_up: outs,
                score_diff,
                on_1b: on_1b as u8,
                on_2b: on_2b as u8,
                on_3b: on_3b as u8,
                is_batter_lefty: batter_lefty as u8,
                pitcher_throws_left: pitcher_lefty as u8,
                prev_pitch_type_code: prev_pitch_code,
            };

            let recommender = Recommender::new(
                Arc::new(ArtifactCache::new()),
                model_builder::resolve_classifier_path(&model_dir),
                model_dir.join(model_builder::LOCATION_FILE),
            );
            let recommendations = recommender.recommend(&situation, top_k)?;

            if recommendations.is_empty() {
                println!("No recommendation available.");
                return Ok(());
            }

            println!(
                "🎯 Recommended pitches ({}-{} count, {} out(s), inning {}):",
                balls, strikes, outs, inning
            );
            for rec in &recommendations {
                println!(
                    "  [{}] {} ({:.1}%)  target x={:+.2} ft, z={:.2} ft",
                    rec.rank,
                    pitch_type_name(&rec.pitch_type),
                    rec.probability * 100.0,
                    rec.target_location.0,
                    rec.target_location.1
                );
            }

            if let Some(history_path) = history {
                let (rows, _) = model_builder::parse_history_csv(&history_path)?;
                let top = &recommendations[0];
                let matches = find_similar(&rows, &situation, &top.pitch_type, precedents);

                if matches.is_empty() {
                    println!("\nNo similar pitches found in history.");
                } else {
                    println!("\n📼 Similar {} pitches:", pitch_type_name(&top.pitch_type));
                    for precedent in &matches {
                        let count = match (precedent.balls, precedent.strikes) {
                            (Some(b), Some(s)) => format!("{b}-{s}"),
                            _ => "?-?".to_string(),
                        };
                        let tracking = precedent
                            .detection_rate
                            .map(|r| format!("{:.0}%", r * 100.0))
                            .unwrap_or_else(|| "n/a".to_string());
                        println!(
                            "  {} | count {} | tracking {}",
                            precedent.game_date.as_deref().unwrap_or("unknown date"),
                            count,
                            tracking
                        );
                        if let Some(path) = &precedent.video_path {
                            println!("      {}", path);
                        }
                    }
                }
            }
        }

        Commands::Verify {
            artifact,
            checksum,
        } => {
            println!("🔍 Verifying artifact integrity...");
            let actual = pitch_core::artifact::file_checksum(&artifact)?;

            if actual == checksum {
                println!("✅ Artifact verification passed");
            } else {
                anyhow::bail!(
                    "❌ Artifact verification failed - checksum mismatch!\n   expected: {}\n   actual:   {}",
                    checksum,
                    actual
                );
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_artifact(path: &std::path::Path, meta: &pitch_core::ArtifactMetadata) {
    println!("\n📦 {}", path.display());
    println!(
        "   Original size:   {} bytes ({:.2} KB)",
        meta.original_size,
        meta.original_size as f64 / 1024.0
    );
    println!(
        "   Compressed size: {} bytes ({:.2} KB)",
        meta.compressed_size,
        meta.compressed_size as f64 / 1024.0
    );
    println!("   Compression:     {:.1}%", meta.compression_ratio * 100.0);
    println!("   Checksum:        {}", meta.checksum);
    println!("   Created:         {}", meta.created_at);
}

#[cfg(feature = "cli")]
fn save_metadata(path: &PathBuf, outcome: &model_builder::TrainOutcome) -> Result<()> {
    let metadata_json = serde_json::to_string_pretty(&serde_json::json!({
        "classifier": outcome.classifier_metadata,
        "location": outcome.location_metadata,
    }))?;
    std::fs::write(path, metadata_json)?;
    println!("\n📄 Metadata saved to: {}", path.display());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("model_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
