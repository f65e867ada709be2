use std::time::Duration;

use loading_cache::LoadingCache;

const LOAD_DELAY_MS: u64 = 100;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loading_cache=debug".into()),
        )
        .init();

    let cache = LoadingCache::builder()
        .capacity(2)
        .expire_after_write(Duration::from_secs(5))
        .refresh_after_write(Duration::from_secs(2))
        .loader(|key: i32| async move {
            tokio::time::sleep(Duration::from_millis(LOAD_DELAY_MS)).await;
            Ok(format!("Value for key: {}", key))
        })
        .build()?;

    println!("Loading value for key 1...");
    let value1 = cache.get(&1).await?;
    println!("Got: {}", value1);

    println!("Loading value for key 1 again (served from cache)...");
    let value2 = cache.get(&1).await?;
    println!("Got: {}", value2);

    println!("Overwriting key 1...");
    cache.put(1, "pinned value".to_string());
    println!("Got: {}", cache.get(&1).await?);

    println!("Filling past capacity:");
    let _val_a = cache.get(&10).await?;
    let _val_b = cache.get(&20).await?;
    println!("Cache size after capacity evictions: {}", cache.len());

    println!("Entries in recency order:");
    cache.for_each_entry(|key, value| println!("  {} => {}", key, value));

    let stats = cache.stats();
    println!("Stats: {}", stats);
    println!("Stats as JSON: {}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
