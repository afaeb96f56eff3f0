//! Keyword taxonomy classifier.
//!
//! Maps an article's title (and optional summary) to a [`Category`] using
//! three ordered keyword sets. Matching is case-insensitive substring
//! containment over `title + " " + summary`.
//!
//! # Priority
//!
//! 1. Any core-tech or other-tech keyword → [`Category::Tech`].
//! 2. Otherwise any life keyword → [`Category::Life`].
//! 3. Otherwise [`Category::Tech`] (the default).
//!
//! Tech always wins over life: framework names must never be filed as
//! lifestyle content just because a generic word like "学习" co-occurs.
//!
//! ```rust
//! use blog_augment_core::models::Category;
//! use blog_augment_core::taxonomy::classify;
//!
//! let c = classify("Vue3 组合式 API 踩坑", None);
//! assert_eq!(c.category, Category::Tech);
//! assert_eq!(c.label, "技术博客");
//! ```

use serde::Serialize;

use crate::models::Category;

/// Framework, language and platform names. All lowercase.
pub const CORE_TECH_KEYWORDS: &[&str] = &[
    "vue",
    "react",
    "angular",
    "svelte",
    "typescript",
    "javascript",
    "node.js",
    "nodejs",
    "next.js",
    "nextjs",
    "nuxt",
    "webpack",
    "vite",
    "docker",
    "kubernetes",
    "linux",
    "python",
    "golang",
    "java",
    "mysql",
    "postgres",
    "redis",
    "前端",
    "后端",
    "算法",
    "数据库",
    "编程",
    "源码",
    "框架",
];

/// Broader technical vocabulary.
pub const OTHER_TECH_KEYWORDS: &[&str] = &[
    "http",
    "css",
    "html",
    "github",
    "llm",
    "prompt",
    "embedding",
    "人工智能",
    "机器学习",
    "大模型",
    "服务器",
    "部署",
    "性能优化",
    "架构",
    "代码",
    "开发",
    "技术",
    "接口",
];

pub const LIFE_KEYWORDS: &[&str] = &[
    "生活",
    "旅行",
    "旅游",
    "美食",
    "读书",
    "电影",
    "健身",
    "跑步",
    "情感",
    "成长",
    "沟通",
    "表达",
    "职场",
    "心得",
    "随笔",
    "感悟",
    "学习",
    "travel",
    "reading",
    "learning",
];

/// Result of classifying one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: Category,
    pub label: &'static str,
}

impl From<Category> for Classification {
    fn from(category: Category) -> Self {
        Classification {
            category,
            label: category.label(),
        }
    }
}

/// Classify an article by title and optional summary.
///
/// Never fails: empty input classifies as the default, [`Category::Tech`].
pub fn classify(title: &str, summary: Option<&str>) -> Classification {
    let haystack = format!("{} {}", title, summary.unwrap_or("")).to_lowercase();

    let matches_any = |set: &[&str]| set.iter().any(|kw| haystack.contains(kw));

    if matches_any(CORE_TECH_KEYWORDS) || matches_any(OTHER_TECH_KEYWORDS) {
        return Category::Tech.into();
    }
    if matches_any(LIFE_KEYWORDS) {
        return Category::Life.into();
    }
    Category::default().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vue_article_is_tech() {
        let c = classify("Vue3 组合式 API 踩坑", None);
        assert_eq!(c.category, Category::Tech);
        assert_eq!(c.label, "技术博客");
    }

    #[test]
    fn test_communication_article_is_life() {
        let c = classify("如何提升沟通表达能力", None);
        assert_eq!(c.category, Category::Life);
        assert_eq!(c.label, "生活记录");
    }

    #[test]
    fn test_empty_defaults_to_tech() {
        assert_eq!(classify("", None).category, Category::Tech);
        assert_eq!(classify("", Some("")).category, Category::Tech);
    }

    #[test]
    fn test_no_keywords_defaults_to_tech() {
        assert_eq!(classify("周末随手拍", Some("一些照片")).category, Category::Tech);
    }

    #[test]
    fn test_tech_wins_over_life_for_every_pair() {
        for tech in CORE_TECH_KEYWORDS {
            for life in LIFE_KEYWORDS {
                let title = format!("{} {}", life, tech);
                assert_eq!(
                    classify(&title, None).category,
                    Category::Tech,
                    "{} + {} should be tech",
                    tech,
                    life
                );
            }
        }
    }

    #[test]
    fn test_summary_participates_in_matching() {
        let c = classify("周末小记", Some("一次难忘的旅行"));
        assert_eq!(c.category, Category::Life);

        let c = classify("周末小记", Some("用 React 重写了个人主页，顺便学习了很多"));
        assert_eq!(c.category, Category::Tech);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("REACT hooks", None).category, Category::Tech);
        assert_eq!(classify("My TRAVEL notes", None).category, Category::Life);
    }

    #[test]
    fn test_keyword_sets_are_lowercase() {
        for kw in CORE_TECH_KEYWORDS
            .iter()
            .chain(OTHER_TECH_KEYWORDS)
            .chain(LIFE_KEYWORDS)
        {
            assert_eq!(kw.to_lowercase(), *kw);
        }
    }
}
