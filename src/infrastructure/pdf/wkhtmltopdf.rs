use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::sanitize::sanitize_html;
use crate::domain::invoice::ports::{ConvertError, DocumentConverter, PageOptions};

/// wkhtmltopdf-backed HTML-to-PDF converter.
///
/// A semaphore caps how many engine processes run at once; waiting for a
/// slot counts against the conversion timeout, so a saturated pool fails
/// fast instead of queueing without bound. The engine process is spawned
/// with kill-on-drop, so a timed-out conversion does not leave a child
/// running past its budget, and scratch files are removed on every exit
/// path, timeouts included.
pub struct WkHtmlToPdfConverter {
  binary_path: String,
  work_dir: PathBuf,
  pool: Arc<Semaphore>,
  timeout: Duration,
  max_input_bytes: usize,
}

impl WkHtmlToPdfConverter {
  pub fn new(
    binary_path: String,
    work_dir: PathBuf,
    pool_size: usize,
    timeout_seconds: u64,
    max_input_bytes: usize,
  ) -> Self {
    std::fs::create_dir_all(&work_dir).ok();

    Self {
      binary_path,
      work_dir,
      pool: Arc::new(Semaphore::new(pool_size.max(1))),
      timeout: Duration::from_secs(timeout_seconds),
      max_input_bytes,
    }
  }

  async fn run_engine(
    &self,
    html: &str,
    options: &PageOptions,
    input_path: &Path,
    output_path: &Path,
    header_path: Option<&Path>,
    footer_path: Option<&Path>,
  ) -> Result<Vec<u8>, ConvertError> {
    tokio::fs::write(input_path, html.as_bytes())
      .await
      .map_err(|e| ConvertError::EngineFault(format!("Writing converter input failed: {}", e)))?;
    if let (Some(path), Some(header)) = (header_path, &options.header_html) {
      write_sanitized(path, header).await?;
    }
    if let (Some(path), Some(footer)) = (footer_path, &options.footer_html) {
      write_sanitized(path, footer).await?;
    }

    let _permit = self
      .pool
      .acquire()
      .await
      .map_err(|_| ConvertError::EngineFault("Converter pool is shut down".to_string()))?;

    self
      .spawn(input_path, output_path, options, header_path, footer_path)
      .await
  }

  async fn spawn(
    &self,
    input_path: &Path,
    output_path: &Path,
    options: &PageOptions,
    header_path: Option<&Path>,
    footer_path: Option<&Path>,
  ) -> Result<Vec<u8>, ConvertError> {
    let scale = format!("{}", options.scale);
    let margin_top = format!("{}mm", options.margin_top_mm);
    let margin_bottom = format!("{}mm", options.margin_bottom_mm);
    let margin_left = format!("{}mm", options.margin_left_mm);
    let margin_right = format!("{}mm", options.margin_right_mm);

    let mut command = Command::new(&self.binary_path);
    command.args([
      "--page-size",
      options.page_size.as_str(),
      "--orientation",
      options.orientation.as_str(),
      "--margin-top",
      &margin_top,
      "--margin-bottom",
      &margin_bottom,
      "--margin-left",
      &margin_left,
      "--margin-right",
      &margin_right,
      "--zoom",
      &scale,
      "--encoding",
      "utf-8",
      "--disable-local-file-access",
      "--quiet",
    ]);
    if let Some(header) = header_path {
      command.arg("--header-html").arg(header);
    }
    if let Some(footer) = footer_path {
      command.arg("--footer-html").arg(footer);
    }
    command.arg(input_path).arg(output_path);
    // A timed-out conversion drops this future; the child must die with it.
    command.kill_on_drop(true);

    let output = command
      .output()
      .await
      .map_err(|e| ConvertError::EngineFault(format!("Engine execution failed: {}", e)))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ConvertError::EngineFault(format!(
        "Engine exited with {}: {}",
        output.status,
        stderr.trim()
      )));
    }

    tokio::fs::read(output_path)
      .await
      .map_err(|e| ConvertError::EngineFault(format!("Reading converter output failed: {}", e)))
  }
}

async fn write_sanitized(path: &Path, html: &str) -> Result<(), ConvertError> {
  tokio::fs::write(path, sanitize_html(html).as_bytes())
    .await
    .map_err(|e| ConvertError::EngineFault(format!("Writing converter fragment failed: {}", e)))
}

async fn remove_scratch_files(paths: &[Option<&Path>]) {
  for path in paths.iter().flatten() {
    tokio::fs::remove_file(path).await.ok();
  }
}

#[async_trait]
impl DocumentConverter for WkHtmlToPdfConverter {
  async fn convert(&self, html: &str, options: &PageOptions) -> Result<Vec<u8>, ConvertError> {
    if html.len() > self.max_input_bytes {
      return Err(ConvertError::InputTooLarge {
        bytes: html.len(),
        max: self.max_input_bytes,
      });
    }

    let sanitized = sanitize_html(html);
    tracing::debug!(
      input_bytes = sanitized.len(),
      page_size = options.page_size.as_str(),
      "Starting PDF conversion"
    );

    // Paths are fixed up front so the cleanup below also covers a run that
    // was dropped mid-flight by the timeout.
    let job_id = Uuid::new_v4();
    let input_path = self.work_dir.join(format!("{}.html", job_id));
    let output_path = self.work_dir.join(format!("{}.pdf", job_id));
    let header_path = options
      .header_html
      .as_ref()
      .map(|_| self.work_dir.join(format!("{}-header.html", job_id)));
    let footer_path = options
      .footer_html
      .as_ref()
      .map(|_| self.work_dir.join(format!("{}-footer.html", job_id)));

    let run = self.run_engine(
      &sanitized,
      options,
      &input_path,
      &output_path,
      header_path.as_deref(),
      footer_path.as_deref(),
    );
    let result = match tokio::time::timeout(self.timeout, run).await {
      Ok(result) => result,
      Err(_) => Err(ConvertError::Timeout {
        seconds: self.timeout.as_secs(),
      }),
    };

    remove_scratch_files(&[
      Some(input_path.as_path()),
      Some(output_path.as_path()),
      header_path.as_deref(),
      footer_path.as_deref(),
    ])
    .await;

    result
  }
}
