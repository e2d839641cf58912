//! CSV report renderer.
//!
//! Turns a window of history into a `text/csv` attachment: a `#` title
//! line, one `# marker` line per event marker, a header, then one row per
//! record.  Padding rows are skipped; a disabled target renders as `off`.

use std::fmt::Write as _;

use crate::app::events::EventMarker;
use crate::app::ports::{Attachment, Renderer};
use crate::error::ReportError;
use crate::store::Record;

pub const CSV_HEADER: &str = "timestamp,temperature_f,target_f,relay";

pub struct CsvRenderer {
    file_name: String,
}

impl Default for CsvRenderer {
    fn default() -> Self {
        Self::new("temperatures.csv")
    }
}

impl CsvRenderer {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// One CSV row, no trailing newline.
pub fn format_row(record: &Record) -> String {
    let target = if record.is_disabled() {
        "off".to_string()
    } else {
        format!("{:.2}", record.target)
    };
    format!(
        "{},{:.2},{},{}",
        record.timestamp,
        record.temp,
        target,
        if record.relay_on { "on" } else { "off" }
    )
}

impl Renderer for CsvRenderer {
    fn render(&self, records: &[Record], title: &str, markers: &[EventMarker]) -> Result<Attachment, ReportError> {
        if title.contains('\n') {
            return Err(ReportError::Render("title spans lines"));
        }

        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "# {title}");
        for m in markers {
            let _ = writeln!(out, "# marker,{},{}", m.time, m.label);
        }
        let _ = writeln!(out, "{CSV_HEADER}");
        for r in records.iter().filter(|r| !r.is_padding()) {
            let _ = writeln!(out, "{}", format_row(r));
        }

        Ok(Attachment {
            file_name: self.file_name.clone(),
            content_type: "text/csv",
            bytes: out.into_bytes(),
        })
    }
}
