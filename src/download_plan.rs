use crate::catalog::Downloader;
use crate::error::Error;
use crate::scene::{DownloadHandle, SceneRecord};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DownloadTask {
    title: String,
    url: String,
    output_dir: PathBuf,
    handle: DownloadHandle,
}

impl DownloadTask {
    pub fn new(scene: &SceneRecord, output_dir: &Path) -> Self {
        DownloadTask {
            title: scene.title.clone(),
            url: scene.url.clone(),
            output_dir: output_dir.to_path_buf(),
            handle: scene.handle.clone(),
        }
    }

    pub fn output(self: &Self) -> PathBuf {
        self.output_dir.join(self.handle.file_name())
    }
}

/// An ordered list of scenes to fetch. Execution is sequential and a failed task never stops
/// the ones after it.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct DownloadPlan {
    tasks: Vec<DownloadTask>,
}

impl DownloadPlan {
    pub fn new(tasks: Vec<DownloadTask>) -> Self {
        Self { tasks }
    }

    /// One task per scene, in input order, keeping at most `max_products` of them.
    pub fn from_scenes(
        scenes: &[SceneRecord],
        output_dir: &Path,
        max_products: Option<usize>,
    ) -> Self {
        let limit = max_products.unwrap_or(scenes.len());
        let tasks = scenes
            .iter()
            .take(limit)
            .map(|scene| DownloadTask::new(scene, output_dir))
            .collect();
        Self { tasks }
    }

    pub fn len(self: &Self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(self: &Self) -> bool {
        self.tasks.is_empty()
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&content)?;
        Ok(plan)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the local paths of the products that were fetched.
    pub async fn execute(self: &Self, downloader: &impl Downloader) -> Vec<PathBuf> {
        let total = self.tasks.len();
        let mut downloaded = vec![];

        for (i, task) in self.tasks.iter().enumerate() {
            log::info!("Downloading ({}/{}): {}", i + 1, total, task.title);

            match downloader.download(&task.handle, &task.output_dir).await {
                Ok(path) => {
                    log::info!("Download complete: {}", path.display());
                    downloaded.push(path);
                }
                Err(e) => {
                    let err = Error::Download {
                        title: task.title.clone(),
                        reason: format!("{:#}", e),
                    };
                    log::error!("{}", err);
                    if !task.url.is_empty() {
                        log::info!("Manual download is possible from:");
                        log::info!("  {}", task.url);
                    }
                }
            }
        }
        downloaded
    }
}
