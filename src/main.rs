use anyhow::Context;
use rental_scout::search::ALL_CATEGORIES;
use rental_scout::store::StaticAuth;
use rental_scout::{
    geo, init_logging, AppConfig, ListingRepository, MemoryStore, SearchAggregator,
    SearchCriteria, SearchOutcome,
};
use std::sync::Arc;
use tracing::{info, warn, Level};

const USAGE: &str = "usage: rental-scout [store.json] [user-id] [text] [category] [radius-km]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(Level::INFO)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return Ok(());
    }
    let store_path = args.first().map(String::as_str).unwrap_or("data/store.json");
    let user_id = args.get(1).map(String::as_str).unwrap_or("u1");
    let text = args.get(2).cloned().unwrap_or_default();
    let category = args.get(3).map(String::as_str).unwrap_or(ALL_CATEGORIES);

    let config = AppConfig::from_env()?;
    let radius_km = match args.get(4) {
        Some(raw) => raw
            .replace(',', ".")
            .parse::<f64>()
            .with_context(|| format!("Invalid radius `{}`", raw))?,
        None => config.radius.default_m / 1_000.0,
    };

    info!("🔎 Rental Scout - proximity search");
    info!("==================================");

    let store = Arc::new(MemoryStore::load(store_path).await?);
    let repo = ListingRepository::new(store, &config);
    let aggregator = SearchAggregator::new(repo, Arc::new(StaticAuth::signed_in(user_id)), config);

    let origin = aggregator
        .resolve_origin()
        .await
        .context("Cannot determine search origin")?;
    info!(
        "Searching around ({:.5}, {:.5}) for user {}",
        origin.latitude, origin.longitude, user_id
    );

    let criteria = SearchCriteria::default()
        .text(text)
        .category_name(category)
        .radius_km(radius_km);

    let results = match aggregator.search(origin, criteria.clone()).await? {
        SearchOutcome::Published(set) => set,
        SearchOutcome::Stale { generation } => {
            warn!("Search generation {} was superseded", generation);
            return Ok(());
        }
    };

    info!("\n✅ Found {} listings within {:.1} km\n", results.len(), radius_km);

    for (i, entry) in results.entries.iter().enumerate() {
        println!("{}. {} (€{:.2}/day)", i + 1, entry.listing.name, entry.listing.daily_rate);
        println!("   Owner: {}", entry.owner_name);
        println!("   Category: {}", entry.listing.category);
        if let Some(d) = entry.distance_m {
            println!("   Distance: {:.0} m", d);
        }
        if !entry.listing.available {
            println!("   (currently unavailable)");
        }
        println!("   ID: {}", entry.listing.id);
        println!();
    }

    let circle = geo::circle_polygon(origin, aggregator.effective_radius(&criteria));
    info!("Search circle has {} vertices", circle.len());

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "origin": origin,
        "criteria": criteria,
        "results": results,
        "circle": circle,
    }))?;
    tokio::fs::write("search_results.json", json).await?;
    info!("💾 Saved results to search_results.json");

    match aggregator.dashboard().await {
        Ok(dashboard) => info!(
            "📋 Renting {} items, renting out {} items",
            dashboard.renting.len(),
            dashboard.renting_out.len()
        ),
        Err(e) => warn!("Could not load dashboard: {}", e),
    }

    Ok(())
}
