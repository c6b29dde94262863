use anyhow::{anyhow, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use skysearch_client::app_config::AutocompleteConfig;
use skysearch_client::{BackendClient, Config};
use skysearch_core::{FilterCriteria, HistogramBucket, SearchCriteria, StopBucket};
use skysearch_session::{
    LocationResolver, MemoryNavigation, ResolverSettings, ResolverSnapshot, ResolverStatus, SearchSession,
    SessionError,
};
use skysearch_shared::FlightOffer;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "skysearch", about = "Search flights and refine the results")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search flights, apply filters and print the price distribution
    Search(SearchArgs),
    /// Resolve a city or airport name to IATA codes
    Locations { keyword: String },
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub origin: String,
    #[arg(long)]
    pub destination: String,
    /// YYYY-MM-DD
    #[arg(long)]
    pub departure: NaiveDate,
    /// YYYY-MM-DD, for round trips
    #[arg(long = "return")]
    pub return_date: Option<NaiveDate>,
    #[arg(long, default_value_t = 1)]
    pub adults: u32,
    /// Comma-separated stop buckets: 0, 1, 2+
    #[arg(long, value_delimiter = ',')]
    pub stops: Vec<StopBucket>,
    #[arg(long)]
    pub min_price: Option<f64>,
    #[arg(long)]
    pub max_price: Option<f64>,
    /// Primary carrier code, repeatable
    #[arg(long = "carrier")]
    pub carriers: Vec<String>,
}

impl SearchArgs {
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            origin: self.origin.to_uppercase(),
            destination: self.destination.to_uppercase(),
            departure_date: Some(self.departure),
            return_date: self.return_date,
            adults: self.adults,
        }
    }

    pub fn filters(&self) -> FilterCriteria {
        let mut filters = FilterCriteria::new();
        for bucket in &self.stops {
            filters.set_stop(*bucket, true);
        }
        for carrier in &self.carriers {
            filters.set_carrier(&carrier.to_uppercase(), true);
        }
        filters.set_price_range(self.min_price, self.max_price);
        filters
    }
}

pub fn resolver_settings(config: &AutocompleteConfig) -> ResolverSettings {
    ResolverSettings {
        debounce: config.debounce(),
        min_query_len: config.min_query_len,
    }
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let backend = Arc::new(BackendClient::new(&config.backend)?);
    tracing::debug!("Using backend at {}", backend.base_url());

    match cli.command {
        Command::Search(args) => search(args, backend, &config).await,
        Command::Locations { keyword } => locations(&keyword, backend, &config).await,
    }
}

async fn search(args: SearchArgs, backend: Arc<BackendClient>, config: &Config) -> anyhow::Result<()> {
    let mut session = SearchSession::new(backend, Box::new(MemoryNavigation::new()))
        .with_bucket_count(config.histogram.bucket_count);
    session.set_filters(args.filters());

    let today = Local::now().date_naive();
    match session.submit(args.criteria(), today).await {
        Ok(()) => {}
        Err(SessionError::Validation(errors)) => {
            for error in errors.errors() {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("search was not submitted");
        }
        Err(e) => return Err(e.into()),
    }

    let view = session.view();
    println!("{} of {} offers match", view.offers.len(), session.offers().len());
    if !view.carriers.is_empty() {
        println!("Airlines: {}", view.carriers.join(", "));
    }
    println!();
    print!("{}", render_offers(&view.offers));
    println!();
    print!("{}", render_histogram(&view.histogram));
    Ok(())
}

async fn locations(keyword: &str, backend: Arc<BackendClient>, config: &Config) -> anyhow::Result<()> {
    let resolver = LocationResolver::new(backend, resolver_settings(&config.autocomplete));
    resolver.set_query(keyword).await;

    let deadline = config.autocomplete.debounce() + config.backend.request_timeout() + Duration::from_secs(1);
    let snapshot = tokio::time::timeout(deadline, settled(&resolver)).await?;

    match snapshot.status {
        ResolverStatus::Failed => Err(anyhow!(snapshot.error.unwrap_or_default())),
        ResolverStatus::Idle => bail!(
            "query must be at least {} characters",
            config.autocomplete.min_query_len
        ),
        _ => {
            print!("{}", render_locations(&snapshot));
            Ok(())
        }
    }
}

async fn settled(resolver: &LocationResolver) -> ResolverSnapshot {
    loop {
        let snapshot = resolver.snapshot().await;
        if !matches!(snapshot.status, ResolverStatus::Debouncing | ResolverStatus::Loading) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

pub fn render_offers(offers: &[FlightOffer]) -> String {
    if offers.is_empty() {
        return "No flights found. Try adjusting your filters or search criteria.\n".to_string();
    }

    let mut out = String::new();
    for offer in offers {
        let departure = offer
            .departure()
            .map(|d| d.format("%a, %b %-d %H:%M").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{:>10} {:<3}  {:<3} {} -> {:<3}  {:<16}  {:>7}  {}\n",
            offer.price,
            offer.currency,
            offer.primary_carrier().unwrap_or("?"),
            offer.origin().unwrap_or("?"),
            offer.destination().unwrap_or("?"),
            departure,
            offer.duration_label(),
            offer.stop_label(),
        ));
    }
    out
}

pub fn render_histogram(buckets: &[HistogramBucket]) -> String {
    let width = buckets.iter().map(|b| b.label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for bucket in buckets {
        out.push_str(&format!(
            "{:<width$} | {} {}\n",
            bucket.label,
            "#".repeat(bucket.count),
            bucket.count,
            width = width
        ));
    }
    out
}

pub fn render_locations(snapshot: &ResolverSnapshot) -> String {
    if snapshot.results.is_empty() {
        return "No locations found.\n".to_string();
    }
    snapshot
        .results
        .iter()
        .map(|l| format!("{}  {}, {}\n", l.label(), l.name, l.country_name))
        .collect()
}
