use crate::models::VideoRecord;
use crate::utils::file_safe_term;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Serialize all records to `path`, replacing any existing file.
///
/// Rows are written to a temporary file next to `path` which is then renamed
/// over it, so a failed write leaves the previous file intact.
pub fn write_csv(path: &Path, records: &[VideoRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;

    // header row even when there are no records yet
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(tmp);
    writer.write_record(header())?;
    for record in records {
        writer.serialize(record)?;
    }
    let tmp = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush {}: {}", path.display(), e.error()))?;

    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!("Data saved to {} ({} rows)", path.display(), records.len());
    Ok(())
}

/// Column names in field order.
pub fn header() -> [&'static str; 14] {
    [
        "Video URL",
        "Title",
        "Description",
        "Channel Title",
        "Keyword Tags",
        "YouTube Video Category",
        "Topic Details",
        "Video Published at",
        "Video Duration",
        "View Count",
        "Comment Count",
        "Captions Available",
        "Caption Text",
        "Location of Recording",
    ]
}

pub fn checkpoint_path(dir: &Path, now: DateTime<Local>, rows: usize) -> PathBuf {
    dir.join(format!(
        "youtube_data_temp_{}_{rows:06}.csv",
        now.format(TIMESTAMP_FORMAT)
    ))
}

pub fn final_output_path(dir: &Path, term: &str, now: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "youtube_{}_data_{}.csv",
        file_safe_term(term),
        now.format(TIMESTAMP_FORMAT)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record(id: &str) -> VideoRecord {
        VideoRecord {
            url: crate::models::video_url(id),
            title: format!("Video {id}"),
            description: "line one\nline two, with a comma".into(),
            channel: "Channel".into(),
            tags: "jazz,piano".into(),
            category: "10".into(),
            topics: "https://en.wikipedia.org/wiki/Music".into(),
            published_at: "2024-03-01T12:00:00Z".parse().ok(),
            duration: "0:03:15".into(),
            view_count: 1000,
            comment_count: 12,
            has_captions: false,
            caption_text: String::new(),
            recording_location: "{}".into(),
        }
    }

    fn read_back(path: &Path) -> (Vec<String>, Vec<VideoRecord>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader
            .headers()
            .unwrap()
            .iter()
            .map(String::from)
            .collect();
        let rows = reader
            .deserialize::<VideoRecord>()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        (headers, rows)
    }

    #[test]
    fn writes_header_and_rows_in_field_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![sample_record("a"), sample_record("b")];

        write_csv(&path, &records).unwrap();

        let (headers, rows) = read_back(&path);
        assert_eq!(headers, header().to_vec());
        assert_eq!(rows, records);
    }

    #[test]
    fn empty_export_still_has_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&path, &[]).unwrap();

        let (headers, rows) = read_back(&path);
        assert_eq!(headers.len(), 14);
        assert!(rows.is_empty());
    }

    #[test]
    fn rewrite_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_csv(&path, &[sample_record("a"), sample_record("b")]).unwrap();
        write_csv(&path, &[sample_record("c")]).unwrap();

        let (_, rows) = read_back(&path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, "https://www.youtube.com/watch?v=c");
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        write_csv(&path, &[sample_record("a")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn output_names_carry_term_and_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let dir = Path::new("out");

        assert_eq!(
            final_output_path(dir, "lo-fi hip hop", now),
            Path::new("out/youtube_lo-fi_hip_hop_data_20240506_070809.csv")
        );
        assert_eq!(
            checkpoint_path(dir, now, 50),
            Path::new("out/youtube_data_temp_20240506_070809_000050.csv")
        );
    }
}
