use std::{num::NonZeroUsize, sync::Arc};

use album_core::{load_settings, AlbumLoader, AlbumViewModel, HttpFetcher, SearchField, Thumbnail};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures::StreamExt;
use url::Url;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Sequential,
    Concurrent,
}

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the configured catalog URL.
    #[arg(long)]
    catalog_url: Option<Url>,
    #[arg(long)]
    mode: Option<Mode>,
    /// Concurrent mode only; 0 is unbounded.
    #[arg(long)]
    max_in_flight: Option<usize>,
    #[arg(long)]
    batch_limit: Option<usize>,
    /// Filters the printed albums by title.
    #[arg(long)]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(url) = args.catalog_url {
        settings.catalog_url = url;
    }
    if let Some(limit) = args.batch_limit {
        settings.batch_limit = limit;
    }
    if let Some(mode) = args.mode {
        settings.concurrent = matches!(mode, Mode::Concurrent);
    }
    if let Some(limit) = args.max_in_flight {
        settings.max_in_flight = NonZeroUsize::new(limit);
    }
    let mode = settings.fetch_mode();
    tracing::info!(
        catalog = %settings.catalog_url,
        ?mode,
        limit = settings.batch_limit,
        "loading albums"
    );

    let fetcher =
        HttpFetcher::new(settings.request_timeout).context("failed to build http client")?;
    let loader = AlbumLoader::new(Arc::new(fetcher), settings.catalog_url.clone())
        .with_batch_limit(settings.batch_limit)
        .with_mode(mode);

    let view_model = AlbumViewModel::new();
    view_model
        .load(&loader)
        .await
        .context("failed to load albums")?;

    // Unchanged text fires no event, so an empty query is skipped.
    if let Some(query) = args.search.filter(|query| !query.is_empty()) {
        let field = SearchField::new();
        let mut changes = field.text_changes();
        field.set_text(query);
        if let Some(text) = changes.next().await {
            view_model.set_search_text(&text);
        }
    }

    let visible = view_model.visible_albums();
    println!(
        "{} of {} albums ({:?})",
        visible.len(),
        view_model.album_count(),
        view_model.search_mode()
    );
    for album in visible {
        match &album.thumbnail {
            Thumbnail::Decoded(image) => {
                println!("{:>4}x{:<4} {}", image.width, image.height, album.title)
            }
            Thumbnail::Placeholder => println!("{:>9} {}", "--", album.title),
        }
    }

    Ok(())
}
