//! Scores text from the command line, optionally with a rewrite suggestion.

use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::io::Read;

use sentiment_analysis_tool::{config::Config, rewrite::RewriteEngine, sentiment};

/// Score a comment and optionally suggest a gentler rewrite
#[derive(Parser, Debug)]
#[command(name = "score_text")]
#[command(about = "Sentiment scoring and tone rewrites from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Also print a rewrite suggestion (uses OPENAI_* settings when present)
    #[arg(short, long)]
    rewrite: bool,

    /// Text to score; read from stdin when omitted
    text: Vec<String>,
}

impl Cli {
    fn input(&self) -> Result<String> {
        if !self.text.is_empty() {
            return Ok(self.text.join(" "));
        }
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let input = cli.input()?;
    let text = input.trim();
    if text.is_empty() {
        bail!("no text to score");
    }

    let analysis = sentiment::score(text);
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    if cli.rewrite {
        let config = Config::from_env();
        let engine = RewriteEngine::from_config(&config)?;
        let improvement = engine.improve(text).await;
        println!("{}", serde_json::to_string_pretty(&improvement)?);
    }

    Ok(())
}
