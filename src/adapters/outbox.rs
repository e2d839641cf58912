//! Outbox report transport.
//!
//! Implements [`ReportSink`] by dropping each report into a directory for an
//! external mailer to pick up:
//!
//! ```text
//! outbox/
//!   000001/
//!     message.txt        Subject: <subject>\n\n<body>
//!     temperatures.csv   (attachment, if any)
//! ```
//!
//! A report is assembled under `.<seq>.tmp` and renamed into place, so the
//! mailer only ever sees complete entries.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{Attachment, ReportSink};
use crate::error::ReportError;

pub const MESSAGE_FILE: &str = "message.txt";

pub struct OutboxSink {
    dir: PathBuf,
    next_seq: u64,
}

impl OutboxSink {
    /// Open (creating if needed) the outbox.  Numbering continues after the
    /// highest entry already present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let mut highest = 0;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(seq) = entry.file_name().to_str().and_then(|n| n.parse::<u64>().ok()) {
                highest = highest.max(seq);
            }
        }
        Ok(Self {
            dir,
            next_seq: highest + 1,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for OutboxSink {
    fn send(&mut self, subject: &str, message: &str, attachment: Option<&Attachment>) -> Result<(), ReportError> {
        let seq = self.next_seq;
        let name = format!("{seq:06}");
        let staging = self.dir.join(format!(".{name}.tmp"));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir(&staging)?;

        fs::write(staging.join(MESSAGE_FILE), format!("Subject: {subject}\n\n{message}\n"))?;
        if let Some(att) = attachment {
            let file_name = Path::new(&att.file_name)
                .file_name()
                .ok_or(ReportError::Render("attachment has no file name"))?;
            fs::write(staging.join(file_name), &att.bytes)?;
        }

        fs::rename(&staging, self.dir.join(&name))?;
        self.next_seq += 1;
        info!("OUTBOX | queued {} '{}'", name, subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_message_and_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let mut outbox = OutboxSink::open(dir.path()).unwrap();
        let att = Attachment {
            file_name: "temperatures.csv".into(),
            content_type: "text/csv",
            bytes: b"a,b\n".to_vec(),
        };
        outbox.send("Warning: High Temp", "hot", Some(&att)).unwrap();

        let entry = dir.path().join("000001");
        assert_eq!(
            fs::read_to_string(entry.join(MESSAGE_FILE)).unwrap(),
            "Subject: Warning: High Temp\n\nhot\n"
        );
        assert_eq!(fs::read(entry.join("temperatures.csv")).unwrap(), b"a,b\n");
        assert!(!dir.path().join(".000001.tmp").exists());
    }

    #[test]
    fn numbering_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut outbox = OutboxSink::open(dir.path()).unwrap();
            outbox.send("one", "1", None).unwrap();
            outbox.send("two", "2", None).unwrap();
        }
        let mut outbox = OutboxSink::open(dir.path()).unwrap();
        outbox.send("three", "3", None).unwrap();
        assert!(dir.path().join("000003").join(MESSAGE_FILE).exists());
    }

    #[test]
    fn attachment_name_cannot_escape_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut outbox = OutboxSink::open(dir.path().join("out")).unwrap();
        let att = Attachment {
            file_name: "../../evil.csv".into(),
            content_type: "text/csv",
            bytes: Vec::new(),
        };
        outbox.send("s", "m", Some(&att)).unwrap();
        assert!(dir.path().join("out").join("000001").join("evil.csv").exists());
        assert!(!dir.path().join("evil.csv").exists());
    }
}
