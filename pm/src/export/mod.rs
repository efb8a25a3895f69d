//! Document export
//!
//! The PDF renderer when it is compiled in and enabled, otherwise a fixed
//! placeholder payload. Export never fails.

pub mod layout;
#[cfg(feature = "pdf")]
mod pdf;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "pdf")]
pub use pdf::PdfRenderer;

use crate::chain::{Availability, Tier, TierStatus};
use crate::config::ExportConfig;

/// Payload returned when no renderer can be used
pub const PLACEHOLDER: &[u8] = b"PDF export is not available because the PDF renderer is not enabled.";

/// Errors from a document renderer
#[derive(Debug, Error)]
pub enum ExportError {
    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render failed: {0}")]
    Render(String),
}

/// Turns a plan into a binary document
pub trait DocumentRenderer: Tier {
    fn render(&self, problem: &str, context: &str, response: &str) -> Result<Vec<u8>, ExportError>;
}

/// Placeholder terminal, always ready
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderTier;

impl Tier for PlaceholderTier {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn availability(&self) -> Availability {
        Availability::Ready
    }
}

/// Renderer with placeholder fallback
pub struct Exporter {
    renderer: Result<Arc<dyn DocumentRenderer>, String>,
    terminal: PlaceholderTier,
}

impl Exporter {
    pub fn new(renderer: Option<Arc<dyn DocumentRenderer>>) -> Self {
        Self {
            renderer: renderer.ok_or_else(|| "no renderer configured".to_string()),
            terminal: PlaceholderTier,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        debug!(enabled = config.enabled, "Exporter::from_config: called");
        let renderer = if config.enabled {
            default_renderer()
        } else {
            Err("disabled in config".to_string())
        };
        Self {
            renderer,
            terminal: PlaceholderTier,
        }
    }

    /// True when exports produce a real document rather than the placeholder
    pub fn is_available(&self) -> bool {
        matches!(&self.renderer, Ok(r) if r.availability().is_ready())
    }

    /// Render the plan, or return the placeholder payload
    pub fn export(&self, problem: &str, context: &str, response: &str) -> Vec<u8> {
        debug!(response_len = response.len(), "export: called");
        match &self.renderer {
            Ok(renderer) => match renderer.availability() {
                Availability::Ready => match renderer.render(problem, context, response) {
                    Ok(bytes) => {
                        info!(renderer = %renderer.name(), bytes = bytes.len(), "Document exported");
                        return bytes;
                    }
                    Err(e) => {
                        warn!(renderer = %renderer.name(), error = %e, "Tier failed, falling back");
                    }
                },
                Availability::Unavailable(reason) => {
                    debug!(%reason, "export: renderer unavailable");
                }
            },
            Err(reason) => {
                debug!(%reason, "export: no renderer");
            }
        }
        PLACEHOLDER.to_vec()
    }

    pub fn tier_status(&self) -> Vec<TierStatus> {
        let renderer = match &self.renderer {
            Ok(renderer) => TierStatus::of(renderer.as_ref()),
            Err(reason) => TierStatus {
                name: "pdf".to_string(),
                availability: Availability::Unavailable(reason.clone()),
            },
        };
        vec![renderer, TierStatus::of(&self.terminal)]
    }
}

#[cfg(feature = "pdf")]
fn default_renderer() -> Result<Arc<dyn DocumentRenderer>, String> {
    Ok(Arc::new(PdfRenderer))
}

#[cfg(not(feature = "pdf"))]
fn default_renderer() -> Result<Arc<dyn DocumentRenderer>, String> {
    Err("built without the pdf feature".to_string())
}
