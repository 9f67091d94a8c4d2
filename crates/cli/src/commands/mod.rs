use clap::Subcommand;

mod cache;
mod gather;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gather stages: projects, publications, citations, repos
    Gather {
        /// File listing funding-opportunity numbers to seed the pipeline
        #[arg(long)]
        opportunities: Option<std::path::PathBuf>,
    },
    /// Manage the on-disk cache
    Cache {
        #[command(subcommand)]
        action: cache::CacheAction,
    },
}

impl Commands {
    pub async fn execute(self) -> eyre::Result<()> {
        match self {
            Commands::Gather { opportunities } => gather::run(opportunities).await,
            Commands::Cache { action } => action.execute(),
        }
    }
}
