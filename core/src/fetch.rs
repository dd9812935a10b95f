//! Fetch a remote or local resource and append it to a file.
//!
//! The source is copied into the file as it is read, so size is bounded by
//! disk, not memory. A read that fails part-way leaves the bytes already
//! appended in place.

use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::error::{FetchError, TransportError};
use crate::http::HttpRequest;
use crate::transport::Transport;
use crate::types::{FetchOptions, SavedFile, SourceKind};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Normalize a save directory: blank becomes `./`, and a trailing `/` is
/// added when missing.
pub fn resolve_save_dir(save_dir: &str) -> String {
    if save_dir.trim().is_empty() {
        return "./".to_string();
    }
    if save_dir.ends_with('/') {
        save_dir.to_string()
    } else {
        format!("{save_dir}/")
    }
}

#[instrument(skip_all, fields(url = %options.url, file = %options.file_name))]
pub(crate) fn fetch_file_with<T: Transport + ?Sized>(
    transport: &T,
    options: &FetchOptions,
) -> Result<SavedFile, FetchError> {
    if options.file_name.is_empty() {
        return Err(FetchError::EmptyFileName);
    }

    let save_dir = resolve_save_dir(&options.save_dir);
    ensure_dir(Path::new(&save_dir))?;
    let save_path = format!("{save_dir}{}", options.file_name);

    let bytes_written = match options.source {
        SourceKind::Remote => {
            let mut body = open_remote(transport, &options.url, options.timeout_secs)?;
            append_from(&mut body, Path::new(&save_path), |err| FetchError::Transport {
                url: options.url.clone(),
                source: TransportError::new(err.to_string()),
            })?
        }
        SourceKind::Local => {
            let read_error = |source| FetchError::ReadSource {
                path: options.url.clone().into(),
                source,
            };
            let mut source = File::open(&options.url).map_err(read_error)?;
            append_from(&mut source, Path::new(&save_path), read_error)?
        }
    };

    info!(path = %save_path, bytes = bytes_written, "file saved");
    Ok(SavedFile {
        file_name: options.file_name.clone(),
        save_path,
        bytes_written,
    })
}

fn ensure_dir(dir: &Path) -> Result<(), FetchError> {
    if dir.exists() {
        return Ok(());
    }
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }
    builder.create(dir).map_err(|source| FetchError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Only the connect phase is bounded; a slow body is waited for.
fn open_remote<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    timeout_secs: u64,
) -> Result<Box<dyn Read>, FetchError> {
    let mut request = HttpRequest::get(url);
    request.connect_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

    let response = transport
        .open(&request)
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
    if !(200..300).contains(&response.status) {
        warn!(status = response.status, "saving body of non-2xx response");
    }
    Ok(response.body)
}

/// Copy `reader` onto the end of `path`, returning the bytes appended.
fn append_from(
    reader: &mut dyn Read,
    path: &Path,
    read_error: impl Fn(io::Error) -> FetchError,
) -> Result<u64, FetchError> {
    let write_error = |source| FetchError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_error)?;

    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut written = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(read_error(err)),
        };
        file.write_all(&buf[..n]).map_err(write_error)?;
        written += n as u64;
    }
    Ok(written)
}
