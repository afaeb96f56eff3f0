//! `blogai classify`: deterministic categorization by keyword taxonomy.

use anyhow::{bail, Result};

use blog_augment_core::store::ArticleStore;
use blog_augment_core::taxonomy::{classify, Classification};

use crate::config::Config;
use crate::runtime::Runtime;

/// Classify the article `slug` by title and stored summary, persisting the
/// category when `save` is set.
pub async fn classify_article<S>(store: &S, slug: &str, save: bool) -> Result<Classification>
where
    S: ArticleStore + ?Sized,
{
    let article = match store.get_article_by_slug(slug).await? {
        Some(a) => a,
        None => bail!("Article not found: {}", slug),
    };

    let result = classify(&article.title, article.summary.as_deref());
    if save && result.category != article.category {
        store.set_category(&article.id, result.category).await?;
    }
    Ok(result)
}

pub async fn run_classify(config: &Config, slug: &str, save: bool) -> Result<()> {
    let rt = Runtime::open(config).await?;
    let result = classify_article(&rt.store, slug, save).await?;

    println!("{}: {} ({})", slug, result.category, result.label);
    if save {
        println!("Category saved.");
    }

    rt.close().await;
    Ok(())
}
