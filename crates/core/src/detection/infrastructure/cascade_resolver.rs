use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{CASCADE_BASE_URL, CASCADE_DIR_ENV, SYSTEM_CASCADE_DIRS};

#[derive(Error, Debug)]
pub enum CascadeResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write cascade to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Locate a Haar cascade XML by name, downloading it when no local copy exists.
///
/// Resolution order:
/// 1. `explicit_dir` (the `--cascade-dir` flag)
/// 2. `$VCAP_CASCADE_DIR`
/// 3. User cache directory
/// 4. System OpenCV data directories
/// 5. Download from the OpenCV repository into the cache
///
/// A missing user cache directory is only an error when nothing was found
/// locally and a download is needed.
pub fn resolve(
    name: &str,
    explicit_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, CascadeResolveError> {
    let env_dir = std::env::var_os(CASCADE_DIR_ENV).map(PathBuf::from);
    resolve_in(
        name,
        explicit_dir,
        env_dir.as_deref(),
        cascade_cache_dir().ok(),
        progress,
    )
}

fn resolve_in(
    name: &str,
    explicit_dir: Option<&Path>,
    env_dir: Option<&Path>,
    cache_dir: Option<PathBuf>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, CascadeResolveError> {
    let dirs = search_dirs(explicit_dir, env_dir, cache_dir.as_deref());
    if let Some(found) = find_existing(name, &dirs) {
        log::debug!("Using cascade {}", found.display());
        return Ok(found);
    }

    let cache_dir = cache_dir.ok_or(CascadeResolveError::NoCacheDir)?;
    fs::create_dir_all(&cache_dir).map_err(CascadeResolveError::CacheDir)?;
    let dest = cache_dir.join(name);
    let url = format!("{CASCADE_BASE_URL}/{name}");
    log::info!("Downloading {name} from {url}");
    download(&url, &dest, progress)?;
    Ok(dest)
}

/// Platform-specific cascade cache directory, e.g. `~/.cache/vcap/haarcascades/`.
pub fn cascade_cache_dir() -> Result<PathBuf, CascadeResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("vcap").join("haarcascades"))
        .ok_or(CascadeResolveError::NoCacheDir)
}

fn search_dirs(
    explicit_dir: Option<&Path>,
    env_dir: Option<&Path>,
    cache_dir: Option<&Path>,
) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    dirs.extend(explicit_dir.map(Path::to_path_buf));
    dirs.extend(env_dir.map(Path::to_path_buf));
    dirs.extend(cache_dir.map(Path::to_path_buf));
    dirs.extend(SYSTEM_CASCADE_DIRS.iter().map(PathBuf::from));
    dirs
}

fn find_existing(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().map(|d| d.join(name)).find(|p| p.is_file())
}

/// Streams `url` into `dest` through a sibling `.part` file, which is
/// removed again if the transfer fails.
fn download(
    url: &str,
    dest: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), CascadeResolveError> {
    let part = dest.with_extension("part");
    let result = stream_to(url, dest, &part, progress);
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn stream_to(
    url: &str,
    dest: &Path,
    part: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), CascadeResolveError> {
    let fetch_err = |source| CascadeResolveError::Download {
        url: url.to_string(),
        source,
    };
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;
    let total = response.content_length().unwrap_or(0);

    let part_err = |source| CascadeResolveError::Write {
        path: part.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(part).map_err(part_err)?;

    let mut buf = [0u8; 16 * 1024];
    let mut received: u64 = 0;
    loop {
        let n = response.read(&mut buf).map_err(part_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(part_err)?;
        received += n as u64;
        if let Some(cb) = &progress {
            cb(received, total);
        }
    }
    file.sync_all().map_err(part_err)?;
    drop(file);

    fs::rename(part, dest).map_err(|source| CascadeResolveError::Write {
        path: dest.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_search_dirs_order() {
        let dirs = search_dirs(
            Some(Path::new("/explicit")),
            Some(Path::new("/env")),
            Some(Path::new("/cache")),
        );
        assert_eq!(dirs[0], PathBuf::from("/explicit"));
        assert_eq!(dirs[1], PathBuf::from("/env"));
        assert_eq!(dirs[2], PathBuf::from("/cache"));
        assert_eq!(dirs.len(), 3 + SYSTEM_CASCADE_DIRS.len());
    }

    #[test]
    fn test_search_dirs_skips_missing_overrides() {
        let dirs = search_dirs(None, None, Some(Path::new("/cache")));
        assert_eq!(dirs[0], PathBuf::from("/cache"));
    }

    #[test]
    fn test_search_dirs_without_cache_keeps_system_dirs() {
        let dirs = search_dirs(Some(Path::new("/explicit")), None, None);
        assert_eq!(dirs[0], PathBuf::from("/explicit"));
        assert_eq!(dirs.len(), 1 + SYSTEM_CASCADE_DIRS.len());
    }

    #[test]
    fn test_find_existing_prefers_earlier_dir() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("haarcascade_eye.xml"), b"a").unwrap();
        fs::write(second.join("haarcascade_eye.xml"), b"b").unwrap();

        let found = find_existing("haarcascade_eye.xml", &[first.clone(), second]).unwrap();
        assert_eq!(found, first.join("haarcascade_eye.xml"));
    }

    #[test]
    fn test_find_existing_skips_dirs_without_file() {
        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty");
        let full = tmp.path().join("full");
        fs::create_dir_all(&empty).unwrap();
        fs::create_dir_all(&full).unwrap();
        fs::write(full.join("face.xml"), b"x").unwrap();

        let found = find_existing("face.xml", &[empty, full.clone()]);
        assert_eq!(found, Some(full.join("face.xml")));
    }

    #[test]
    fn test_find_existing_none_when_absent() {
        let tmp = TempDir::new().unwrap();
        assert!(find_existing("face.xml", &[tmp.path().to_path_buf()]).is_none());
    }

    #[test]
    fn test_resolve_uses_explicit_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom_cascade_for_test.xml");
        fs::write(&path, b"<opencv_storage/>").unwrap();
        let resolved = resolve("custom_cascade_for_test.xml", Some(tmp.path()), None).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_explicit_dir_found_without_cache_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom_cascade_for_test.xml");
        fs::write(&path, b"<opencv_storage/>").unwrap();

        let resolved =
            resolve_in("custom_cascade_for_test.xml", Some(tmp.path()), None, None, None).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_env_dir_found_without_cache_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("env_cascade_for_test.xml");
        fs::write(&path, b"<opencv_storage/>").unwrap();

        let resolved =
            resolve_in("env_cascade_for_test.xml", None, Some(tmp.path()), None, None).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_download_needs_cache_dir() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_in("missing_cascade_for_test.xml", Some(tmp.path()), None, None, None)
            .unwrap_err();
        assert!(matches!(err, CascadeResolveError::NoCacheDir));
    }

    #[test]
    fn test_cascade_cache_dir_is_namespaced() {
        let dir = cascade_cache_dir().unwrap();
        assert!(dir.ends_with("vcap/haarcascades"));
    }

    #[test]
    fn test_download_invalid_url_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("cascade.xml");
        let result = download("http://invalid.nonexistent.example.com/cascade.xml", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_truncated_download_removes_partial_file() {
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\n\r\n");
            let _ = stream.write_all(&[b'x'; 16]);
        });

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("cascade.xml");
        let result = download(&format!("http://{addr}/cascade.xml"), &dest, None);
        server.join().unwrap();

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
