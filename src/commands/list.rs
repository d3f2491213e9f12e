//! List published posts

use anyhow::Result;

use crate::commands::generate::{normalize_all, query_posts_page};
use crate::helpers;
use crate::prismic::Paginator;
use crate::App;

/// List every published post, newest first
pub async fn run(app: &App) -> Result<()> {
    let client = app.client()?;

    let first = query_posts_page(&client, &app.config, None).await?;
    let mut posts = normalize_all(&first.results)?;

    let paginator = Paginator::new(first.next_page.clone());
    posts.extend(paginator.drain(&client).await?);

    println!("Posts ({}):", posts.len());
    for post in posts {
        println!(
            "  {} - {} [{}]",
            helpers::format_date(&post.first_publication_date),
            post.data.title,
            post.uid
        );
    }

    Ok(())
}
