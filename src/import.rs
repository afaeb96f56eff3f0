//! `blogai import`: load Markdown articles from a directory tree.
//!
//! Each `*.md` file becomes one published article:
//!
//! | Field | Source |
//! |-------|--------|
//! | slug | file stem |
//! | title | first `# ` heading, else the file stem |
//! | body | file content without that heading line |
//! | created_at | file modification time |
//!
//! Re-importing updates the title and body of the article with the same
//! slug and keeps its id and AI-derived fields.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use blog_augment_core::models::Article;
use blog_augment_core::store::ArticleStore;

use crate::config::Config;
use crate::runtime::Runtime;

/// A Markdown file parsed into article fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownArticle {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

/// Split Markdown into `(title, body)`. The first `# ` heading is the title.
pub fn parse_markdown(stem: &str, content: &str) -> (String, String) {
    let mut title = None;
    let mut body_lines = Vec::new();
    for line in content.lines() {
        if title.is_none() {
            if let Some(heading) = line.trim_start().strip_prefix("# ") {
                let heading = heading.trim();
                if !heading.is_empty() {
                    title = Some(heading.to_string());
                    continue;
                }
            }
        }
        body_lines.push(line);
    }
    let body = body_lines.join("\n").trim().to_string();
    (title.unwrap_or_else(|| stem.to_string()), body)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Collect every Markdown file under `root`, sorted by path.
pub fn scan_markdown(root: &Path) -> Result<Vec<MarkdownArticle>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        paths.push(entry.into_path());
    }
    // Sort for deterministic ordering
    paths.sort();

    let mut articles = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => continue,
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let modified_secs = std::fs::metadata(&path)?
            .modified()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        let (title, body) = parse_markdown(&stem, &content);
        articles.push(MarkdownArticle {
            slug: stem,
            title,
            body,
            modified: Utc
                .timestamp_opt(modified_secs, 0)
                .single()
                .unwrap_or_else(Utc::now),
        });
    }
    Ok(articles)
}

/// Upsert every scanned article. A slug seen twice keeps the first file.
pub async fn import_articles<S>(store: &S, articles: &[MarkdownArticle]) -> Result<ImportStats>
where
    S: ArticleStore + ?Sized,
{
    let mut stats = ImportStats::default();
    let mut seen = HashSet::new();

    for md in articles {
        if !seen.insert(md.slug.clone()) {
            tracing::warn!(slug = %md.slug, "duplicate slug, skipping");
            stats.skipped += 1;
            continue;
        }
        let article = Article::new(&md.slug, &md.title, &md.body, md.modified);
        store.upsert_article(&article).await?;
        stats.imported += 1;
    }
    Ok(stats)
}

pub async fn run_import(config: &Config, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let articles = scan_markdown(dir)?;
    let rt = Runtime::open(config).await?;

    let stats = import_articles(&rt.store, &articles).await?;
    println!(
        "Imported {} articles from {} ({} skipped)",
        stats.imported,
        dir.display(),
        stats.skipped
    );

    rt.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_augment_core::store::memory::InMemoryStore;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_markdown_title_and_body() {
        let (title, body) = parse_markdown("vue", "# Vue3 响应式原理详解\n\n正文第一段。\n");
        assert_eq!(title, "Vue3 响应式原理详解");
        assert_eq!(body, "正文第一段。");

        let (title, body) = parse_markdown("notes", "no heading here\n## sub");
        assert_eq!(title, "notes");
        assert_eq!(body, "no heading here\n## sub");
    }

    #[tokio::test]
    async fn test_scan_and_import() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("2024")).unwrap();
        fs::create_dir_all(tmp.path().join(".drafts")).unwrap();
        fs::write(tmp.path().join("alpha.md"), "# Alpha\n\nRust notes.").unwrap();
        fs::write(tmp.path().join("2024/beta.md"), "# Beta\n\n周末爬山。").unwrap();
        fs::write(tmp.path().join("2024/readme.txt"), "ignored").unwrap();
        fs::write(tmp.path().join(".drafts/secret.md"), "# Secret").unwrap();

        let scanned = scan_markdown(tmp.path()).unwrap();
        let slugs: Vec<&str> = scanned.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["beta", "alpha"]);

        let store = InMemoryStore::new();
        let stats = import_articles(&store, &scanned).await.unwrap();
        assert_eq!(stats.imported, 2);
        let beta = store.get_article_by_slug("beta").await.unwrap().unwrap();
        assert_eq!(beta.title, "Beta");
        assert_eq!(beta.body, "周末爬山。");

        // re-import keeps the id
        let id = beta.id.clone();
        import_articles(&store, &scanned).await.unwrap();
        assert_eq!(store.get_article_by_slug("beta").await.unwrap().unwrap().id, id);
    }
}
