//! Authenticated downloads from the ASF datapool.
//!
//! Product URLs redirect to the Earthdata login host and back; the login is only ever sent to
//! that host, and the resulting cookies are kept for the rest of the run.
use crate::config::Login;
use crate::scene::DownloadHandle;
use anyhow::{anyhow, Result};
use futures_util::TryStreamExt;
use reqwest::header::{LOCATION, RANGE};
use reqwest::{redirect, Response, StatusCode};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use url::{Origin, Url};

pub const EARTHDATA_HOST: &str = "urs.earthdata.nasa.gov";
const MAX_REDIRECTS: usize = 10;

pub struct Session {
    client: reqwest::Client,
    login: Login,
    auth_origin: Origin,
}

impl Session {
    pub fn new(login: Login) -> Result<Self> {
        Self::with_login_url(login, &format!("https://{}", EARTHDATA_HOST))
    }

    /// A session whose credentials go to `login_url`'s scheme, host and port only.
    pub fn with_login_url(login: Login, login_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .user_agent(concat!("s1-acquire/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let auth_origin = Url::parse(login_url)?.origin();
        Ok(Self {
            client,
            login,
            auth_origin,
        })
    }

    pub fn username(self: &Self) -> &str {
        &self.login.username
    }

    async fn open(self: &Self, url: &str, offset: u64) -> Result<Response> {
        let mut current = Url::parse(url)?;

        for _ in 0..MAX_REDIRECTS {
            let mut request = self.client.get(current.clone());
            if current.origin() == self.auth_origin {
                request = request.basic_auth(&self.login.username, Some(&self.login.password));
            }
            if offset > 0 {
                request = request.header(RANGE, format!("bytes={}-", offset));
            }

            let response = request.send().await?;
            if response.status().is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .ok_or(anyhow!("Redirect without Location header from {}", current))?
                    .to_str()?;
                current = current.join(location)?;
                log::debug!("Redirected to {}", current.host_str().unwrap_or_default());
                continue;
            }
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(anyhow!(
                    "Earthdata login rejected for user {}",
                    self.login.username
                ));
            }
            // the caller decides what an unsatisfiable resume means
            if offset > 0 && response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
                return Ok(response);
            }
            return Ok(response.error_for_status()?);
        }
        Err(anyhow!("Too many redirects while fetching {}", url))
    }

    /// Downloads a product to `<dir>/<title>.zip`, resuming from a `.partial` file if one is
    /// left over from an earlier run.
    pub async fn download(self: &Self, handle: &DownloadHandle, dir: &Path) -> Result<PathBuf> {
        if handle.url().is_empty() {
            return Err(anyhow!("No download URL for {}", handle.title()));
        }

        // Check if the output file already exists; return early if so
        let dst = dir.join(handle.file_name());
        if dst.exists() {
            log::info!("Output file already exists: {}", dst.display());
            return Ok(dst);
        }

        fs::create_dir_all(dir)?;

        // Check if partial file exists and get its size
        let partial = dir.join(format!("{}.partial", handle.file_name()));
        let mut partial_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&partial)?;
        let mut byte_count = partial_file.metadata()?.len();
        let total_size = handle.size_bytes();

        if total_size == 0 || byte_count < total_size {
            if byte_count > 0 && total_size > 0 {
                let progress = (byte_count as f64 / total_size as f64) * 100.;
                log::info!("Resuming download from {:.2}% completion", progress);
            }

            let mut response = self.open(handle.url(), byte_count).await?;
            if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
                if total_size == 0 {
                    log::info!("Server has no bytes past the partial file, treating it as complete");
                    fs::rename(&partial, &dst)?;
                    return Ok(dst);
                }
                log::warn!("Server rejected the resume offset, restarting download");
                partial_file.set_len(0)?;
                byte_count = 0;
                response = self.open(handle.url(), 0).await?;
            }
            if byte_count > 0 && response.status() != StatusCode::PARTIAL_CONTENT {
                log::warn!("Server ignored the range request, restarting download");
                partial_file.set_len(0)?;
                byte_count = 0;
            }

            let mut body = Box::pin(response.bytes_stream());
            while let Some(bytes) = body.try_next().await? {
                partial_file.write_all(&bytes)?;
                byte_count += bytes.len() as u64;
            }
            partial_file.flush()?;

            if total_size > 0 && byte_count < total_size {
                return Err(anyhow!(
                    "Incomplete download: {} of {} bytes",
                    byte_count,
                    total_size
                ));
            }
        }

        // Rename the file to remove .partial suffix
        fs::rename(&partial, &dst)?;
        Ok(dst)
    }
}
