pub mod doctor;
pub mod export;
pub mod import;
pub mod inspect;
pub mod list;
pub mod log;
pub mod maintenance;
pub mod re_embed;
pub mod search;
pub mod stats;

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;

use liftlog::activity::types::Activity;
use liftlog::config::{EmbeddingConfig, LiftlogConfig};
use liftlog::db::migrations;
use liftlog::embedding::{self, TextEmbedder};
use liftlog::service::ActivityService;

const MODEL_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Build the configured embedder.
pub fn load_embedder(config: &LiftlogConfig) -> Result<Arc<dyn TextEmbedder>> {
    let embedder = embedding::create_embedder(&config.embedding)
        .context("failed to create embedder")?;
    Ok(Arc::from(embedder))
}

/// Open the database and wire up the async service.
pub fn open_service(config: &LiftlogConfig) -> Result<ActivityService> {
    let conn = liftlog::db::open_database(config.resolved_db_path())?;
    let embedder = load_embedder(config)?;
    if let Some(stored) = migrations::embedding_model_mismatch(&conn, embedder.model_id())? {
        tracing::warn!(
            stored = %stored,
            configured = %embedder.model_id(),
            "embedding model changed; run `liftlog re-embed` to update all vectors"
        );
    }
    Ok(ActivityService::new(
        Arc::new(Mutex::new(conn)),
        embedder,
        Arc::new(config.clone()),
    ))
}

pub fn bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

/// One-line summary used by `list` and `search`.
pub fn describe(activity: &Activity) -> String {
    let mut parts = vec![activity.exercise.clone()];
    match (activity.sets, activity.reps) {
        (Some(s), Some(r)) => parts.push(format!("{s}x{r}")),
        (Some(s), None) => parts.push(format!("{s} sets")),
        (None, Some(r)) => parts.push(format!("{r} reps")),
        (None, None) => {}
    }
    if let Some(w) = activity.weight {
        let unit = activity.unit.map(|u| u.as_str()).unwrap_or("lbs");
        parts.push(format!("@ {w} {unit}"));
    }
    if let Some(m) = activity.duration_minutes {
        parts.push(format!("{m} min"));
    }
    let mut line = format!("{} [{}]", parts.join(" "), activity.category);
    if let Some(notes) = &activity.notes {
        line.push_str(&format!(" - {notes}"));
    }
    line
}

/// Download the ONNX embedding model and tokenizer to the cache directory.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let (model_path, tokenizer_path) = embedding::local::model_files(config);
    if let Some(cache_dir) = model_path.parent() {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;
    }

    if model_path.exists() {
        println!("Model already exists at {}", model_path.display());
    } else {
        println!("Downloading model.onnx (~90MB)...");
        download_file(MODEL_URL, &model_path).await?;
        println!("Model saved to {}", model_path.display());
    }

    if tokenizer_path.exists() {
        println!("Tokenizer already exists at {}", tokenizer_path.display());
    } else {
        println!("Downloading tokenizer.json...");
        download_file(TOKENIZER_URL, &tokenizer_path).await?;
        println!("Tokenizer saved to {}", tokenizer_path.display());
    }

    println!("Model download complete.");
    Ok(())
}

/// Download a file with a progress bar. Writes to a temp file, then renames.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk)
            .await
            .context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog::activity::types::{Category, WeightUnit};

    #[test]
    fn describe_formats_metrics() {
        let activity = Activity {
            id: "a".into(),
            owner_id: "u".into(),
            exercise: "squat".into(),
            category: Category::Legs,
            sets: Some(4),
            reps: Some(8),
            weight: Some(225.0),
            unit: Some(WeightUnit::Lbs),
            duration_minutes: None,
            notes: Some("belt on".into()),
            performed_on: "2026-01-14".parse().unwrap(),
            created_at: chrono::Utc::now(),
            embedding_ref: None,
        };
        assert_eq!(describe(&activity), "squat 4x8 @ 225 lbs [legs] - belt on");
    }
}
