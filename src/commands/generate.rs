//! Generate static pages from the content backend

use anyhow::Result;

use crate::cache::RouteCache;
use crate::config::SiteConfig;
use crate::content::{Document, NavDoc, RawDocument};
use crate::generator::Generator;
use crate::prismic::{self, ApiError, Client, Paginator, QueryOptions, QueryResponse};
use crate::App;

/// Generate the static site
pub async fn run(app: &App) -> Result<()> {
    let client = app.client()?;
    run_with_client(app, &client).await
}

/// Generate with an externally constructed client
pub async fn run_with_client(app: &App, client: &Client) -> Result<()> {
    let start = std::time::Instant::now();
    let generator = Generator::new(&app.config, &app.public_dir)?;
    generator.write_assets()?;

    let mut cache = RouteCache::load(&app.base_dir);

    // Listing: the first page is the initial render, its cursor feeds the
    // client-side load-more
    let first = query_posts_page(client, &app.config, None).await?;
    let documents = normalize_all(&first.results)?;
    generator.write_listing(&documents, first.next_page.as_ref())?;
    cache.mark("/");
    tracing::info!("Generated listing with {} post(s)", documents.len());

    // Path enumeration: walk the rest of the query for article uids
    let paginator = Paginator::new(first.next_page.clone());
    let mut all = documents;
    all.extend(paginator.drain(client).await?);

    for doc in &all {
        // same fetch-by-slug path the on-demand fallback build takes
        if generate_post(&generator, client, &app.config, &doc.uid, None).await? {
            cache.mark(&format!("/post/{}", doc.uid));
        }
    }

    cache.save(&app.base_dir)?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} post page(s) in {:.2}s",
        all.len(),
        duration.as_secs_f64()
    );

    Ok(())
}

/// Query one page of posts, newest first by last publication date
pub async fn query_posts_page(
    client: &Client,
    config: &SiteConfig,
    reference: Option<&str>,
) -> Result<QueryResponse, ApiError> {
    client
        .query(
            &prismic::at("document.type", &config.document_type),
            &QueryOptions {
                orderings: Some(format!(
                    "[{}.last_publication_date desc]",
                    config.document_type
                )),
                page_size: Some(config.page_size),
                reference: reference.map(str::to_string),
                ..Default::default()
            },
        )
        .await
}

/// Normalize a page of raw results, preserving backend order
pub fn normalize_all(raw: &[RawDocument]) -> Result<Vec<Document>> {
    raw.iter()
        .map(|r| Document::from_raw(r).map_err(Into::into))
        .collect()
}

/// Build one article page.
///
/// Returns `false` when the repository has no document with this uid.
pub async fn generate_post(
    generator: &Generator,
    client: &Client,
    config: &SiteConfig,
    uid: &str,
    reference: Option<&str>,
) -> Result<bool> {
    let Some(raw) = client.get_by_uid(&config.document_type, uid, reference).await? else {
        return Ok(false);
    };
    let doc = Document::from_raw(&raw)?;
    let (prev, next) = resolve_neighbors(client, config, &raw.id, reference).await?;
    generator.write_post(&doc, prev.as_ref(), next.as_ref())?;
    Ok(true)
}

/// Resolve previous/next navigation for an article.
///
/// Two independent queries positioned after the current document, one per
/// direction. The ordering fields differ between the two on purpose; see
/// the open questions in DESIGN.md before changing either.
pub async fn resolve_neighbors(
    client: &Client,
    config: &SiteConfig,
    document_id: &str,
    reference: Option<&str>,
) -> Result<(Option<NavDoc>, Option<NavDoc>), ApiError> {
    let predicate = prismic::at("document.type", &config.document_type);
    let base = QueryOptions {
        page_size: Some(1),
        after: Some(document_id.to_string()),
        reference: reference.map(str::to_string),
        ..Default::default()
    };

    let prev = client
        .query(
            &predicate,
            &QueryOptions {
                orderings: Some("[document.first_publication_date]".to_string()),
                ..base.clone()
            },
        )
        .await?;

    let next = client
        .query(
            &predicate,
            &QueryOptions {
                orderings: Some("[document.last_publication_date desc]".to_string()),
                ..base
            },
        )
        .await?;

    Ok((
        prev.results.first().and_then(NavDoc::from_raw),
        next.results.first().and_then(NavDoc::from_raw),
    ))
}
