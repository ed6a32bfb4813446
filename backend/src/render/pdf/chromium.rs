use crate::render::pdf::PdfEngine;
use crate::render::shell::PageShell;
use crate::render::RenderError;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Prints the page shell with a headless Chromium.
///
/// Each render gets its own browser process and profile directory, so
/// concurrent renders share nothing.
#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl ChromiumEngine {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        ChromiumEngine { binary, timeout }
    }
}

/// Owns the browser child. Dropping it kills and reaps the process if it is
/// still running.
struct BrowserProcess {
    child: Child,
}

impl BrowserProcess {
    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<ExitStatus>, RenderError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.kill() {
                warn!("failed to kill browser process {}: {}", self.child.id(), e);
            }
            let _ = self.child.wait();
        }
    }
}

impl PdfEngine for ChromiumEngine {
    fn render(&self, page: &PageShell) -> Result<Vec<u8>, RenderError> {
        let workdir = TempDir::new()?;
        let input = workdir.path().join("page.html");
        let output = workdir.path().join("page.pdf");
        let profile = workdir.path().join("profile");
        fs::write(&input, page.to_html())?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--user-data-dir={}", profile.display()))
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        debug!("Running browser: {:?}", cmd);

        let child = cmd
            .spawn()
            .map_err(|e| RenderError::Pdf(format!("starting {}: {}", self.binary.display(), e)))?;
        let mut browser = BrowserProcess { child };

        match browser.wait_timeout(self.timeout)? {
            Some(status) if status.success() => {}
            Some(status) => {
                return Err(RenderError::Pdf(format!("browser exited with {}", status)));
            }
            None => return Err(RenderError::Timeout(self.timeout)),
        }

        let bytes = fs::read(&output)?;
        if !bytes.starts_with(b"%PDF") {
            return Err(RenderError::Pdf("browser produced no PDF".to_string()));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_browser_is_a_pdf_error() {
        let engine = ChromiumEngine::new(
            PathBuf::from("/nonexistent/chromium-binary"),
            Duration::from_secs(1),
        );
        let result = engine.render(&PageShell::new("t", "<p>x</p>"));
        assert!(matches!(result, Err(RenderError::Pdf(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_browser_times_out_and_is_killed() {
        // stands in for a hung browser: ignores the flags and never writes output
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("slow-browser.sh");
        fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let engine = ChromiumEngine::new(script, Duration::from_millis(200));
        let started = Instant::now();
        let result = engine.render(&PageShell::new("t", "<p>x</p>"));
        assert!(matches!(result, Err(RenderError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
