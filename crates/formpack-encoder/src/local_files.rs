use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use formpack_types::LocalFiles;
use url::Url;

/// [`LocalFiles`] backed by the filesystem.
///
/// Understands `file://` URIs on the local host and bare paths. Relative
/// paths are joined to the base directory when one is set. Any other
/// scheme (`content://`, `ph://`, ...) is a platform handle this reader
/// cannot open and yields [`io::ErrorKind::Unsupported`].
#[derive(Clone, Debug, Default)]
pub struct FsLocalFiles {
    base_dir: Option<PathBuf>,
}

impl FsLocalFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Filesystem path for `uri`.
    ///
    /// `file:` URIs are parsed and percent-decoded by [`url::Url`]; anything
    /// that does not parse as an absolute URL is taken as a path.
    ///
    /// # Errors
    ///
    /// - [`io::ErrorKind::Unsupported`] for schemes other than `file`.
    /// - [`io::ErrorKind::InvalidInput`] for a `file:` URI naming a remote
    ///   host.
    pub fn path_for(&self, uri: &str) -> io::Result<PathBuf> {
        let path = match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|()| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("file URI does not name a local path: {uri}"),
                )
            })?,
            // `C:\uploads\a.png` parses with scheme `c`.
            Ok(url) if url.scheme().len() == 1 => PathBuf::from(uri),
            Ok(url) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("cannot read `{}:` URIs from the filesystem: {uri}", url.scheme()),
                ));
            }
            Err(_) => PathBuf::from(uri),
        };

        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        })
    }
}

impl LocalFiles for FsLocalFiles {
    fn read(&self, uri: &str) -> io::Result<Bytes> {
        let path = self.path_for(uri)?;
        tracing::trace!(uri, path = %path.display(), "reading local attachment");
        std::fs::read(path).map(Bytes::from)
    }
}
