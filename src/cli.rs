use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Look up a food's nutrients and estimate related meals", long_about = None)]
pub struct Cli {
    /// Food to look up, also used as the meal search query
    pub food: String,

    /// Quantity of the food in grams
    #[arg(short, long, default_value_t = 100.0)]
    pub grams: f64,

    /// Maximum number of suggested meals to estimate
    #[arg(short, long, default_value_t = 5)]
    pub meals: usize,

    /// Skip the meal suggestions
    #[arg(long)]
    pub no_meals: bool,

    /// Ingredient lookups in flight per meal (overrides MAX_CONCURRENT_LOOKUPS)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds (overrides REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// `--meals 0` means the same as `--no-meals`.
    pub fn wants_meals(&self) -> bool {
        !self.no_meals && self.meals > 0
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
