//! Date-partitioned image storage
//!
//! Images live at `<root>/<year>/<month>/<day>/<file name>`. Month and day
//! carry no leading zero. Nothing guards against two uploads sharing a
//! name on the same day: the later rename replaces the earlier file.

use chrono::{Datelike, NaiveDate};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::UploadError;
use crate::logger;

/// Prefix of in-flight temporary files; never served
pub const TEMP_PREFIX: &str = ".upload-";

/// Image successfully written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// File name as stored
    pub name: String,
    /// Location on disk
    pub path: PathBuf,
    /// URL path under which the static server exposes the file
    pub public_path: String,
}

/// Filesystem store rooted at a single directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_path: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, public_path: &str) -> Self {
        Self {
            root: root.into(),
            public_path: public_path.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `year/month/day/name`, relative to the store root
    pub fn relative_path(date: NaiveDate, name: &str) -> String {
        format!("{}/{}/{}/{name}", date.year(), date.month(), date.day())
    }

    pub fn destination(&self, date: NaiveDate, name: &str) -> PathBuf {
        self.root.join(Self::relative_path(date, name))
    }

    /// URL path of a stored file, e.g. `/static/2024/3/5/pic.png`
    pub fn public_path(&self, date: NaiveDate, name: &str) -> String {
        format!("{}/{}", self.public_path, Self::relative_path(date, name))
    }

    /// Write `content` under `date`/`name`.
    ///
    /// The bytes go to a temporary file next to the destination which is
    /// then renamed into place, so readers never see a partial image.
    pub async fn save(
        &self,
        date: NaiveDate,
        name: &str,
        content: &[u8],
    ) -> Result<StoredImage, UploadError> {
        let path = self.destination(date, name);
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&dir).await.map_err(UploadError::Write)?;

        let temp = dir.join(format!("{TEMP_PREFIX}{}", uuid::Uuid::new_v4()));
        if let Err(e) = write_then_rename(&temp, &path, content).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    logger::log_warning(&format!(
                        "Failed to remove temporary file '{}': {cleanup}",
                        temp.display()
                    ));
                }
            }
            return Err(UploadError::Write(e));
        }

        Ok(StoredImage {
            name: name.to_string(),
            path,
            public_path: self.public_path(date, name),
        })
    }
}

async fn write_then_rename(temp: &Path, dest: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp, dest).await
}

/// Reduce a client supplied file name to its last path component.
///
/// Browsers may send full client paths (`C:\photos\a.png`); both
/// separators are stripped. Names that cannot denote a regular file are
/// rejected, as are names the static server would hide as in-flight
/// temporaries.
pub fn sanitize_file_name(raw: &str) -> Result<String, UploadError> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('\0')
        || name.starts_with(TEMP_PREFIX)
    {
        return Err(UploadError::InvalidFileName(raw.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_paths_have_no_leading_zeros() {
        let store = ImageStore::new("static", "/static/");
        assert_eq!(
            ImageStore::relative_path(date(2024, 3, 5), "pic.png"),
            "2024/3/5/pic.png"
        );
        assert_eq!(
            store.destination(date(2024, 12, 25), "a.gif"),
            Path::new("static/2024/12/25/a.gif")
        );
        assert_eq!(
            store.public_path(date(2024, 3, 5), "pic.png"),
            "/static/2024/3/5/pic.png"
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("pic.png").unwrap(), "pic.png");
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name(r"C:\photos\cat.jpg").unwrap(), "cat.jpg");
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("dir/").is_err());
        assert!(matches!(
            sanitize_file_name(".upload-cat.png"),
            Err(UploadError::InvalidFileName(_))
        ));
        assert!(sanitize_file_name("photos/.upload-cat.png").is_err());
        assert_eq!(sanitize_file_name(".hidden.png").unwrap(), ".hidden.png");
    }

    #[tokio::test]
    async fn test_save_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path(), "/static");

        let stored = store
            .save(date(2024, 3, 5), "pic.png", b"image bytes")
            .await
            .unwrap();

        assert_eq!(stored.path, tmp.path().join("2024/3/5/pic.png"));
        assert_eq!(stored.public_path, "/static/2024/3/5/pic.png");
        assert_eq!(fs::read(&stored.path).await.unwrap(), b"image bytes");
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path(), "/static");
        store.save(date(2024, 3, 5), "a.png", b"x").await.unwrap();

        let mut entries = fs::read_dir(tmp.path().join("2024/3/5")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_same_name_same_day_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path(), "/static");
        let day = date(2024, 3, 5);

        store.save(day, "pic.png", b"first").await.unwrap();
        let stored = store.save(day, "pic.png", b"second").await.unwrap();

        assert_eq!(fs::read(&stored.path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_save_fails_when_root_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let store = ImageStore::new(&blocker, "/static");

        let err = store.save(date(2024, 3, 5), "pic.png", b"x").await.unwrap_err();
        assert!(matches!(err, UploadError::Write(_)));
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path(), "/static");
        // A non-empty directory occupies the destination, so the rename fails
        let day_dir = tmp.path().join("2024/3/5");
        std::fs::create_dir_all(day_dir.join("pic.png/sub")).unwrap();

        let err = store.save(date(2024, 3, 5), "pic.png", b"x").await.unwrap_err();
        assert!(matches!(err, UploadError::Write(_)));

        let names: Vec<String> = std::fs::read_dir(&day_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["pic.png".to_string()]);
    }
}
