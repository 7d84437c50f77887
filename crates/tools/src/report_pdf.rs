//! Report PDF tool — renders the supplied report data into a one-page
//! PDF in the downloads directory.
//!
//! The writer emits a minimal PDF by hand (one page, Helvetica,
//! key/value lines) — enough for a downloadable artifact without pulling
//! in a full PDF stack. Filenames are keyed by the current time;
//! collisions are accepted as practically improbable.

use async_trait::async_trait;
use patchchat_core::error::ToolError;
use patchchat_core::tool::Tool;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

pub struct GenerateReportPdfTool {
    downloads_dir: PathBuf,
}

impl GenerateReportPdfTool {
    pub fn new(downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
        }
    }
}

#[async_trait]
impl Tool for GenerateReportPdfTool {
    fn name(&self) -> &str {
        "generateReportPDF"
    }

    fn description(&self) -> &str {
        "Generates a PDF file based on the provided report data, including formatting and layout."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "reportData": {
                    "type": "object",
                    "description": "An object containing all the necessary data to be included in the PDF report, such as titles, tables, charts, and text content."
                }
            },
            "required": ["reportData"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let report_data = arguments["reportData"]
            .as_object()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'reportData' object".into()))?;

        let lines: Vec<String> = report_data
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            })
            .collect();

        let file_name = format!("report_{}.pdf", chrono::Utc::now().timestamp_millis());
        let file_path = self.downloads_dir.join(&file_name);

        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        tokio::fs::write(&file_path, render_pdf("Generated Report", &lines)).await?;

        info!(file = %file_path.display(), "Report PDF written");

        Ok(json!({
            "fileName": file_name,
            "filePath": file_path.to_string_lossy(),
            "publicUrl": format!("/downloads/{file_name}"),
        }))
    }
}

/// Render a single-page PDF with a centered-ish title and one text line
/// per report entry.
fn render_pdf(title: &str, lines: &[String]) -> Vec<u8> {
    let mut text = String::new();
    text.push_str("BT\n/F1 18 Tf\n72 740 Td\n");
    text.push_str(&format!("({}) Tj\n", escape_pdf_text(title)));
    text.push_str("/F1 12 Tf\n0 -30 Td\n");
    for line in lines {
        text.push_str(&format!("({}) Tj\n0 -16 Td\n", escape_pdf_text(line)));
    }
    text.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{text}\nendstream", text.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{object}\nendobj\n", i + 1));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));

    pdf.into_bytes()
}

/// Escape the characters with meaning inside a PDF literal string.
fn escape_pdf_text(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            '\\' | '(' | ')' => vec!['\\', c],
            '\n' | '\r' => vec![' '],
            _ => vec![c],
        })
        .collect()
}
