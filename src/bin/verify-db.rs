use tune_scraper::config::StoreConfig;
use tune_scraper::storage::{SqliteTuneStore, TuneStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StoreConfig::from_env()?;
    let store = SqliteTuneStore::connect(&config)?;

    match store.find_public().await? {
        Some(tune) => {
            let doc = &tune.document;
            println!("Found document with visibility='public' (ID: {})", tune.id);
            println!("Title: {}", doc.title_or_unknown());
            println!("isPublic: {}", doc.is_public.map_or("missing".to_string(), |v| v.to_string()));
            println!("visibility: {}", doc.visibility.as_deref().unwrap_or("missing"));
        }
        None => println!("No document found with visibility='public'"),
    }
    println!("Total documents: {}", store.count().await?);

    store.close()?;
    Ok(())
}
