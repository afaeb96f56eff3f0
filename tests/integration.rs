use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY_VAR: &str = "BLOGAI_IT_DEEPSEEK_KEY";

fn blogai_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("blogai");
    path
}

/// Temp dir with a `posts/` tree and a config pointing at `provider_url`.
fn setup_test_env(provider_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    let posts = root.join("posts");
    fs::create_dir_all(posts.join("2024")).unwrap();
    fs::write(
        posts.join("vue3-reactivity.md"),
        "# Vue3 响应式原理详解\n\nVue3 使用 Proxy 实现响应式。依赖收集发生在 getter 中。",
    )
    .unwrap();
    fs::write(
        posts.join("2024/communication.md"),
        "# 如何提升沟通表达能力\n\n多听少说。先想清楚再开口。",
    )
    .unwrap();
    fs::write(posts.join("2024/notes.txt"), "not an article").unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/blogai.sqlite"

[generation]
timeout_secs = 10

[[providers]]
name = "deepseek"
kind = "openai-compatible"
base_url = "{url}"
model = "deepseek-chat"
api_key_env = "{var}"
"#,
        root = root.display(),
        url = provider_url,
        var = KEY_VAR,
    );

    let config_path = config_dir.join("blogai.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_blogai(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = blogai_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env(KEY_VAR, "sk-integration")
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run blogai binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn imported_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let posts = tmp.path().join("posts");
    let (_, stderr, ok) = run_blogai(&config_path, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    let (stdout, stderr, ok) = run_blogai(&config_path, &["import", posts.to_str().unwrap()]);
    assert!(ok, "import failed: stdout={}, stderr={}", stdout, stderr);
    (tmp, config_path)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let (stdout, stderr, success) = run_blogai(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/blogai.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let (_, _, success1) = run_blogai(&config_path, &["init"]);
    assert!(success1, "First init failed");
    let (_, _, success2) = run_blogai(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_markdown_only() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    run_blogai(&config_path, &["init"]);

    let posts = tmp.path().join("posts");
    let (stdout, stderr, success) = run_blogai(&config_path, &["import", posts.to_str().unwrap()]);
    assert!(success, "import failed: {}", stderr);
    assert!(stdout.contains("Imported 2 articles"), "stdout: {}", stdout);

    // Re-import is an update, not a duplicate
    let (stdout, _, success) = run_blogai(&config_path, &["import", posts.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("Imported 2 articles"));
}

#[test]
fn test_classify_tech_and_life() {
    let (_tmp, config_path) = imported_env();

    let (stdout, stderr, success) = run_blogai(&config_path, &["classify", "vue3-reactivity"]);
    assert!(success, "classify failed: {}", stderr);
    assert!(stdout.contains("tech"), "stdout: {}", stdout);
    assert!(stdout.contains("技术博客"));

    let (stdout, _, success) = run_blogai(&config_path, &["classify", "communication", "--save"]);
    assert!(success);
    assert!(stdout.contains("life"));
    assert!(stdout.contains("生活记录"));
    assert!(stdout.contains("Category saved."));
}

#[test]
fn test_classify_unknown_slug_fails() {
    let (_tmp, config_path) = imported_env();

    let (_, stderr, success) = run_blogai(&config_path, &["classify", "no-such-post"]);
    assert!(!success);
    assert!(stderr.contains("Article not found"));
}

#[test]
fn test_providers_lists_without_credentials() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let (stdout, stderr, success) = run_blogai(&config_path, &["providers"]);
    assert!(success, "providers failed: {}", stderr);
    assert!(stdout.contains("deepseek"));
    assert!(stdout.contains("openai-compatible"));
    assert!(stdout.contains("Embedding: disabled"));
    assert!(!stdout.contains("sk-integration"));
}

#[test]
fn test_missing_credential_is_config_error() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let output = Command::new(blogai_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("providers")
        .env_remove(KEY_VAR)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(KEY_VAR), "stderr: {}", stderr);
}

#[test]
fn test_vectorize_requires_embeddings() {
    let (_tmp, config_path) = imported_env();

    let (_, stderr, success) = run_blogai(&config_path, &["vectorize", "--all"]);
    assert!(!success);
    assert!(stderr.contains("disabled"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_summarize_caches_between_runs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content":
                "```json\n{\"summary\": \"介绍 Vue3 基于 Proxy 的响应式实现。\", \"keywords\": [\"Vue3\", \"Proxy\"]}\n```"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (tmp, config_path) = setup_test_env(&server.uri());
    let posts = tmp.path().join("posts");

    let output = tokio::task::spawn_blocking(move || {
        run_blogai(&config_path, &["init"]);
        run_blogai(&config_path, &["import", posts.to_str().unwrap()]);
        let first = run_blogai(&config_path, &["summarize", "vue3-reactivity", "--provider", "deepseek"]);
        let second = run_blogai(&config_path, &["summarize", "vue3-reactivity", "--provider", "deepseek"]);
        (first, second)
    })
    .await
    .unwrap();

    let ((first, first_err, ok1), (second, second_err, ok2)) = output;
    assert!(ok1, "first summarize failed: {}", first_err);
    assert!(first.contains("(generated)"));
    assert!(first.contains("Vue3, Proxy"));
    assert!(ok2, "second summarize failed: {}", second_err);
    assert!(second.contains("(cached)"));
    assert!(second.contains("介绍 Vue3 基于 Proxy 的响应式实现。"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_failure_shows_sanitized_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key sk-integration"))
        .mount(&server)
        .await;

    let (tmp, config_path) = setup_test_env(&server.uri());
    let posts = tmp.path().join("posts");

    let (_, stderr, success) = tokio::task::spawn_blocking(move || {
        run_blogai(&config_path, &["init"]);
        run_blogai(&config_path, &["import", posts.to_str().unwrap()]);
        run_blogai(&config_path, &["ask", "Vue 的响应式原理是什么", "--provider", "deepseek"])
    })
    .await
    .unwrap();

    assert!(!success);
    assert!(stderr.contains("AI 服务认证失败"), "stderr: {}", stderr);
}
