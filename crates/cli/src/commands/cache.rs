use clap::Subcommand;
use eyre::WrapErr;
use gleaner_config::Settings;

#[derive(Subcommand)]
pub enum CacheAction {
    /// Delete the cache store and every snapshot
    Clear,
}

impl CacheAction {
    pub fn execute(self) -> eyre::Result<()> {
        match self {
            CacheAction::Clear => clear(),
        }
    }
}

fn clear() -> eyre::Result<()> {
    let settings = Settings::from_env();
    match std::fs::remove_dir_all(&settings.raw_dir) {
        Ok(()) => {
            tracing::info!(dir = %settings.raw_dir.display(), "cache cleared");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("cache already empty");
            Ok(())
        }
        Err(e) => Err(e).wrap_err("failed to clear cache directory"),
    }
}
