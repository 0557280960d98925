use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "cardcade", version, about = "Cardcade spaced-repetition CLI")]
pub struct Cli {
    /// JSON store file (defaults to the app data dir)
    #[arg(long, global = true)]
    pub store_file: Option<PathBuf>,

    /// Scheduler parameters as JSON (defaults to <config dir>/params.json when present)
    #[arg(long, global = true)]
    pub params: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// List due cards in presentation order
    Due(DueCmd),
    /// List due cards with the most failed reviews
    Boss(BossCmd),
    /// Rate one card
    Review(ReviewCmd),
    /// Interactive review loop over the due queue
    Session(SessionCmd),
    /// Show what each rating would schedule
    Preview { card: String },
    /// Print the effective scheduler parameters
    Params,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List,
    Rm { card: String },
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub front: String,
    #[arg(long)]
    pub back: String,
}

#[derive(Debug, Args, Clone)]
pub struct DueCmd {
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct BossCmd {
    #[arg(long, default_value_t = cardcade_core::BOSS_CANDIDATE_LIMIT)]
    pub limit: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewCmd {
    /// Card id or unique id prefix
    pub card: String,
    /// again|hard|good|easy or 1-4
    pub rating: String,
}

#[derive(Debug, Args, Clone)]
pub struct SessionCmd {
    #[arg(long, default_value_t = 50)]
    pub max: usize,
}
