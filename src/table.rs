// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Output table writing.
//!
//! Each video produces one independent CSV table with the fixed column layout
//! `frame, person_id, x1, y1, ..., x17, y17, label` - one row per
//! (frame, person) pair, frames ascending, persons contiguous per frame.

use std::fs::File;
use std::path::Path;

use crate::error::Result;
use crate::keypoints::NUM_KEYPOINTS;
use crate::pipeline::OutputRecord;

/// Column names of the output table, in order.
#[must_use]
pub fn table_header() -> Vec<String> {
    let mut header = vec!["frame".to_string(), "person_id".to_string()];
    for i in 1..=NUM_KEYPOINTS {
        header.push(format!("x{i}"));
        header.push(format!("y{i}"));
    }
    header.push("label".to_string());
    header
}

/// CSV writer for one video's output table.
pub struct TableWriter {
    writer: csv::Writer<File>,
}

impl TableWriter {
    /// Create the table file and write the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header written.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(table_header())?;
        Ok(Self { writer })
    }

    /// Append one record as a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub fn write(&mut self, record: &OutputRecord) -> Result<()> {
        let mut row = Vec::with_capacity(2 + record.coords.len() + 1);
        row.push(record.frame.to_string());
        row.push(record.person_id.to_string());
        row.extend(record.coords.iter().map(ToString::to_string));
        row.push(record.label.to_string());
        self.writer.write_record(&row)?;
        Ok(())
    }

    /// Flush and close the table.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_header_layout() {
        let header = table_header();
        assert_eq!(header.len(), 37);
        assert_eq!(header[0], "frame");
        assert_eq!(header[1], "person_id");
        assert_eq!(header[2], "x1");
        assert_eq!(header[3], "y1");
        assert_eq!(header[34], "x17");
        assert_eq!(header[35], "y17");
        assert_eq!(header[36], "label");
    }

    #[test]
    fn test_write_rows() {
        let dir = std::env::temp_dir().join("pose_extract_table_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.csv");

        let mut coords = [0.0f32; 34];
        coords[0] = 1.5;
        coords[33] = 7.0;

        let mut writer = TableWriter::create(&path).unwrap();
        writer
            .write(&OutputRecord {
                frame: 3,
                person_id: 0,
                coords,
                label: 1,
            })
            .unwrap();
        writer.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("frame,person_id,x1,y1"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("3,0,1.5,0,"));
        assert!(row.ends_with(",7,1"));

        fs::remove_dir_all(&dir).ok();
    }
}
