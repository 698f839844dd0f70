use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::record::Record;

/// Writes a header row (`url,title,price,description,location`) and one row
/// per record. Unresolved fields are written as the placeholder text.
pub fn write_records<W: Write>(out: W, records: &[Record]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for rec in records {
        writer.serialize(rec)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_file(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_records(file, records).with_context(|| format!("write {}", path.display()))
}

/// Saves `records` as CSV at `path`. Returns whether a file was written;
/// empty input and write failures are logged, never raised.
pub fn save_csv(records: &[Record], path: &Path) -> bool {
    if records.is_empty() {
        warn!("no records to save");
        return false;
    }
    info!("saving {}", path.display());
    match write_file(path, records) {
        Ok(()) => {
            info!("[ok] {} records saved to {}", records.len(), path.display());
            true
        }
        Err(e) => {
            error!("could not save csv: {e:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;

    fn rec(n: u32) -> Record {
        Record {
            url: format!("u{n}"),
            title: Field::Resolved(format!("t{n}")),
            price: Field::Resolved(format!("p{n}")),
            description: Field::Resolved(format!("d{n}")),
            location: Field::Resolved(format!("l{n}")),
        }
    }

    fn to_string(records: &[Record]) -> String {
        let mut buf = Vec::new();
        write_records(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_then_one_row_per_record() {
        let out = to_string(&[rec(1)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, ["url,title,price,description,location", "u1,t1,p1,d1,l1"]);
    }

    #[test]
    fn sentinels_are_written_as_placeholder() {
        let mut r = rec(1);
        r.description = Field::Pending;
        r.location = Field::Unavailable;
        let out = to_string(&[r]);
        assert_eq!(out.lines().nth(1), Some("u1,t1,p1,unavailable,unavailable"));
    }

    #[test]
    fn values_with_commas_are_quoted() {
        let mut r = rec(1);
        r.price = Field::Resolved("1,200 €".into());
        let out = to_string(&[r]);
        assert_eq!(out.lines().nth(1), Some(r#"u1,t1,"1,200 €",d1,l1"#));
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert!(!save_csv(&[], &path));
        assert!(!path.exists());
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("bici_detalles.csv");
        assert!(save_csv(&[rec(1), rec(2)], &path));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 3);
    }

    #[test]
    fn unwritable_target_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should go
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        assert!(!save_csv(&[rec(1)], &path));
    }
}
