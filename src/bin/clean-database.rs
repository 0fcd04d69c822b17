use tune_scraper::cleaner::run_cleanup;
use tune_scraper::config::StoreConfig;
use tune_scraper::logging;
use tune_scraper::storage::SqliteTuneStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init_logging("cleaner.log");

    let config = StoreConfig::from_env()?;
    let store = SqliteTuneStore::connect(&config)?;

    println!("🧹 Cleaning tune collection '{}'...", config.collection);
    let summary = run_cleanup(&store).await?;
    store.close()?;

    println!("   Scanned: {}", summary.invalid.scanned);
    println!("   Invalid deleted: {}", summary.invalid.deleted);
    for group in &summary.duplicates.groups {
        println!(
            "   Removed {} duplicates of {} [{}]: {}...",
            group.removed, group.kept, group.fingerprint, group.preview
        );
    }
    println!("   Duplicates deleted: {}", summary.duplicates.total_removed);
    println!("✅ Cleanup complete");
    Ok(())
}
