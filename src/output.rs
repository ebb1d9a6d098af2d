//! Whole-file replacement that never leaves a partially written target behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum OutputError
{
	#[error("could not create a temporary file next to {path:?}")]
	Create{path: PathBuf, #[source] err: io::Error},
	#[error("could not write output for {path:?}")]
	Write{path: PathBuf, #[source] err: io::Error},
	#[error("could not move output into place at {path:?}")]
	Persist{path: PathBuf, #[source] err: io::Error},
}

#[cfg(unix)]
fn staging_file(dir: &Path) -> io::Result<NamedTempFile>
{
	use std::os::unix::fs::PermissionsExt;
	// the umask still applies, giving the same mode as any freshly created file
	tempfile::Builder::new().permissions(fs::Permissions::from_mode(0o666)).tempfile_in(dir)
}

#[cfg(not(unix))]
fn staging_file(dir: &Path) -> io::Result<NamedTempFile>
{
	NamedTempFile::new_in(dir)
}

/// Runs `fill` against a temporary file in the target's directory and renames it over `path` once `fill` and the
/// final flush succeed. On error the temporary file is dropped (and deleted) and `path` is untouched. A replaced file
/// keeps its permissions.
pub fn write_with<F>(path: &Path, fill: F) -> Result<u64, OutputError>
	where F: FnOnce(&mut dyn Write) -> io::Result<()>
{
	let dir = match path.parent()
	{
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};
	let mut temp = staging_file(dir).map_err(|err| OutputError::Create{path: path.to_path_buf(), err})?;
	debug!("staging {path:?} in {:?}", temp.path());
	let written = (|| -> io::Result<u64>
	{
		{
			let mut buf = io::BufWriter::new(temp.as_file_mut());
			fill(&mut buf)?;
			buf.flush()?;
		}
		temp.as_file().sync_all()?;
		Ok(temp.as_file().metadata()?.len())
	})().map_err(|err| OutputError::Write{path: path.to_path_buf(), err})?;
	if let Ok(meta) = fs::metadata(path)
	{
		temp.as_file().set_permissions(meta.permissions()).map_err(|err| OutputError::Persist{path: path.to_path_buf(), err})?;
	}
	temp.persist(path).map_err(|e| OutputError::Persist{path: path.to_path_buf(), err: e.error})?;
	Ok(written)
}

pub fn write_all(path: &Path, data: &[u8]) -> Result<(), OutputError>
{
	write_with(path, |w| w.write_all(data)).map(|_| ())
}
