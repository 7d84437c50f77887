//! Built-in tool implementations for PatchChat.
//!
//! These are the side effects the model can request: show the user a
//! message, draft an email, render a report PDF, write a document
//! snippet, look up the weather. Each executor is stateless; generated
//! files land in a shared downloads directory keyed by a time-based
//! filename.

pub mod draft_email;
pub mod inform_user;
pub mod report_pdf;
pub mod weather;
pub mod word_snippet;

pub use draft_email::DraftEmailTool;
pub use inform_user::InformUserTool;
pub use report_pdf::GenerateReportPdfTool;
pub use weather::LookupWeatherTool;
pub use word_snippet::WordSnippetTool;

use patchchat_core::tool::ToolRegistry;
use std::path::Path;

/// Create the default tool registry with all built-in tools.
///
/// `downloads_dir` is where file-producing tools write their artifacts;
/// the gateway serves it under `/downloads`.
pub fn default_registry(downloads_dir: &Path) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(InformUserTool));
    registry.register(Box::new(DraftEmailTool));
    registry.register(Box::new(GenerateReportPdfTool::new(downloads_dir)));
    registry.register(Box::new(WordSnippetTool));
    registry.register(Box::new(LookupWeatherTool));
    registry
}
