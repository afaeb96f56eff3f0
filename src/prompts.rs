//! Prompt assembly for the generative operations.
//!
//! Every prompt is bounded: article bodies and retrieval excerpts are cut
//! to a configured number of characters before they reach a provider.

use blog_augment_core::models::SourceDocument;

pub const SUMMARY_SYSTEM: &str = "你是一个博客编辑助手。阅读文章后，用文章的语言写一段 2-3 句的摘要，\
并给出 3-8 个最能代表文章主题的关键词。";

pub const MODERATION_SYSTEM: &str = "你是一个博客评论审核助手。为评论打分：spam_score 表示广告或垃圾信息的可能性，\
toxicity_score 表示辱骂、攻击或不友善内容的程度，两者都在 0 到 1 之间。\
如果评论正常，可以给出一句简短友好的建议回复，否则 suggested_reply 为 null。";

pub const ANSWER_SYSTEM: &str = "你是博客的问答助手。只根据提供的文章内容回答读者的问题；\
如果文章中没有相关信息，请如实说明。回答使用提问者的语言。";

/// First `max_chars` characters of `text`, with a marker when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub fn summary_prompt(title: &str, body: &str, max_chars: usize) -> String {
    format!(
        "标题：{}\n\n正文：\n{}",
        title,
        truncate_chars(body, max_chars)
    )
}

pub fn moderation_prompt(article_title: Option<&str>, author: &str, content: &str, max_chars: usize) -> String {
    let mut prompt = String::new();
    if let Some(title) = article_title {
        prompt.push_str(&format!("文章标题：{}\n", title));
    }
    prompt.push_str(&format!(
        "评论作者：{}\n评论内容：\n{}",
        author,
        truncate_chars(content, max_chars)
    ));
    prompt
}

/// Question plus numbered source excerpts.
pub fn answer_prompt(question: &str, documents: &[SourceDocument], context_chars: usize) -> String {
    let mut prompt = String::from("参考文章：\n");
    for (i, doc) in documents.iter().enumerate() {
        prompt.push_str(&format!(
            "\n[{}] {} (/{})\n{}\n",
            i + 1,
            doc.title,
            doc.slug,
            truncate_chars(&doc.body, context_chars)
        ));
    }
    prompt.push_str(&format!("\n问题：{}", question));
    prompt
}
