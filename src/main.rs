use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use listing_scout::models::{City, PropertyType, RoomChoice};
use listing_scout::session::page_from_query;
use listing_scout::{
    AccountClient, ApiClient, Config, FilterState, ListingState, ListingStore, LoadStatus,
    LocalStorage, SearchClient, SearchSession,
};

#[derive(Debug, Parser)]
#[command(name = "listing-scout")]
#[command(about = "Search rental listings from the aggregator API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a search
    Search {
        #[command(flatten)]
        filters: FilterArgs,
        /// Page URL query to start from, e.g. "city=milano&rooms=2"
        #[arg(long)]
        url: Option<String>,
        /// Page to load; defaults to the `--url` page, else 1
        #[arg(long)]
        page: Option<u32>,
        /// Also keep these filters under a name
        #[arg(long)]
        save_as: Option<String>,
        /// Write the listings to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Named filters kept in local storage
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
    /// Store or forget the API token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionsAction,
    },
    /// Show notification preferences
    Notifications,
}

#[derive(Debug, Subcommand)]
enum SavedAction {
    List,
    Run {
        name: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Delete {
        name: String,
    },
}

#[derive(Debug, Subcommand)]
enum TokenAction {
    Set { token: String },
    Clear,
}

#[derive(Debug, Subcommand)]
enum FavoritesAction {
    List,
    Add { listing_id: String },
    Remove { listing_id: String },
}

#[derive(Debug, Subcommand)]
enum SubscriptionsAction {
    List,
    /// Subscribe to a saved filter
    Create { name: String },
    Delete { id: String },
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long)]
    city: Option<String>,
    #[arg(long = "type", value_parser = parse_property_type)]
    property_type: Option<PropertyType>,
    /// Comma-separated: studio,1,2,3,4,5plus
    #[arg(long, value_delimiter = ',', value_parser = parse_room)]
    rooms: Vec<RoomChoice>,
    #[arg(long)]
    min_price: Option<u64>,
    #[arg(long)]
    max_price: Option<u64>,
    #[arg(long)]
    min_area: Option<u32>,
    #[arg(long)]
    max_area: Option<u32>,
    #[arg(long)]
    no_commission: bool,
    #[arg(long)]
    pets: bool,
    #[arg(long)]
    furnished: bool,
}

impl FilterArgs {
    /// Overlay the flags that were given on top of `base`
    fn apply_to(self, mut base: FilterState) -> FilterState {
        if let Some(city) = self.city {
            base.set_city(City::from_id(&city));
        }
        if let Some(t) = self.property_type {
            base.set_property_type(t);
        }
        if !self.rooms.is_empty() {
            base.set_rooms(self.rooms);
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            base.set_price_range(self.min_price, self.max_price);
        }
        if self.min_area.is_some() || self.max_area.is_some() {
            base.set_area_range(self.min_area, self.max_area);
        }
        base.no_commission |= self.no_commission;
        base.pets_allowed |= self.pets;
        base.furnished |= self.furnished;
        base
    }
}

fn parse_room(s: &str) -> Result<RoomChoice, String> {
    RoomChoice::from_code(s.trim()).ok_or_else(|| format!("unknown room choice \"{s}\""))
}

fn parse_property_type(s: &str) -> Result<PropertyType, String> {
    PropertyType::from_code(s.trim()).ok_or_else(|| format!("unknown property type \"{s}\""))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let mut storage = LocalStorage::load(&config.storage_path).await?;
    let api = ApiClient::new(&config.api_url, config.timeout_secs)?
        .with_token(storage.token().map(str::to_string));

    match cli.command {
        Commands::Search {
            filters,
            url,
            page,
            save_as,
            output,
        } => {
            let mut base = FilterState::from_query_string(url.as_deref().unwrap_or_default());
            if url.is_none() {
                base.set_city(City::from_id(&config.default_city));
            }
            let filters = filters.apply_to(base);
            let page = start_page(page, url.as_deref());

            if let Some(name) = save_as {
                storage.save_filter(&name, filters.clone())?;
                storage.save().await?;
            }

            let state = run_search(&api, filters, page).await?;
            print_results(&state);

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&state.as_page())?;
                tokio::fs::write(&path, json).await?;
                info!("💾 Saved {} listings to {}", state.listings.len(), path.display());
            }
        }
        Commands::Saved { action } => match action {
            SavedAction::List => {
                for name in storage.saved_filter_names() {
                    let query = storage
                        .saved_filter(name)
                        .map(FilterState::to_query_string)
                        .unwrap_or_default();
                    println!("{name}\t{query}");
                }
            }
            SavedAction::Run { name, page } => {
                let filters = storage
                    .saved_filter(&name)
                    .cloned()
                    .with_context(|| format!("No saved filter named \"{name}\""))?;
                let state = run_search(&api, filters, page).await?;
                print_results(&state);
            }
            SavedAction::Delete { name } => {
                if !storage.delete_filter(&name) {
                    bail!("No saved filter named \"{name}\"");
                }
                storage.save().await?;
                info!("Deleted saved filter \"{}\"", name);
            }
        },
        Commands::Token { action } => {
            match action {
                TokenAction::Set { token } => storage.set_token(token),
                TokenAction::Clear => storage.clear_token(),
            }
            storage.save().await?;
        }
        Commands::Favorites { action } => {
            let account = AccountClient::new(api);
            match action {
                FavoritesAction::List => {
                    for favorite in account.list_favorites().await? {
                        println!(
                            "{} | {} ({} {})",
                            favorite.listing_id,
                            favorite.listing.title,
                            favorite.listing.price,
                            favorite.listing.currency
                        );
                    }
                }
                FavoritesAction::Add { listing_id } => account.add_favorite(&listing_id).await?,
                FavoritesAction::Remove { listing_id } => {
                    account.remove_favorite(&listing_id).await?
                }
            }
        }
        Commands::Subscriptions { action } => {
            let account = AccountClient::new(api);
            match action {
                SubscriptionsAction::List => {
                    for sub in account.list_subscriptions().await? {
                        let state = if sub.is_active { "active" } else { "paused" };
                        println!("{} | {} ({})", sub.id, sub.name, state);
                    }
                }
                SubscriptionsAction::Create { name } => {
                    let filters = storage
                        .saved_filter(&name)
                        .with_context(|| format!("No saved filter named \"{name}\""))?;
                    account.create_subscription(&name, filters).await?;
                }
                SubscriptionsAction::Delete { id } => account.delete_subscription(&id).await?,
            }
        }
        Commands::Notifications => {
            let prefs = AccountClient::new(api).notification_preferences().await?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
    }

    Ok(())
}

/// `--page` if given, otherwise the page carried by `--url`
fn start_page(flag: Option<u32>, url: Option<&str>) -> u32 {
    flag.unwrap_or_else(|| url.map_or(1, page_from_query))
}

/// Search one page and return the store's final state
async fn run_search(api: &ApiClient, filters: FilterState, page: u32) -> Result<ListingState> {
    let source = Arc::new(SearchClient::new(api.clone()));
    let session = SearchSession::new(ListingStore::new(source));

    // Go through the page URL form so the run can be shared as-is
    let mut query = filters.to_query_string();
    if page > 1 {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!("page={page}"));
    }

    if let LoadStatus::Errored(message) = session.restore_from_url(&query).await {
        bail!("Search failed: {message}");
    }
    info!("🔗 Share this search with ?{}", session.url_query().await);
    Ok(session.results().await)
}

fn print_results(state: &ListingState) {
    if state.is_empty_result() {
        println!("No listings match these filters. Try widening the search.");
        return;
    }

    println!(
        "\n{} listings, page {}/{}\n",
        state.total,
        state.page,
        state.total_pages()
    );
    for (i, listing) in state.listings.iter().enumerate() {
        let n = (state.page as usize - 1) * state.page_size as usize + i + 1;
        println!("{}. {} ({} {})", n, listing.title, listing.price, listing.currency);
        println!("   {} rooms, {} m², {}", listing.rooms, listing.area, listing.property_type);
        if !listing.address.is_empty() {
            println!("   Address: {}", listing.address);
        }
        println!("   ID: {} ({})", listing.id, listing.source);
        if !listing.features.is_empty() {
            println!("   Features: {}", listing.features.join(", "));
        }
        println!("   URL: {}", listing.url);
        println!();
    }
}
