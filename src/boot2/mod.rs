//! Second stage bootloader images.
//!
//! The boot ROM copies the first 256 bytes of flash into SRAM and only executes them if the last word holds the
//! checksum of the preceding 252 bytes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::crc;
use crate::output::{self, OutputError};


pub const BOOT2_LEN: usize = 256;
pub const CRC_OFFSET: usize = BOOT2_LEN - 4;

#[derive(Debug, thiserror::Error)]
pub enum Boot2Error
{
	#[error("boot image too short (need {} bytes, got {len})", BOOT2_LEN)]
	TooShort{len: usize},
	#[error("could not read boot image {path:?}")]
	Read{path: PathBuf, #[source] err: io::Error},
	#[error(transparent)]
	Output(#[from] OutputError),
}

fn check_len(image: &[u8]) -> Result<(), Boot2Error>
{
	if image.len() < BOOT2_LEN {Err(Boot2Error::TooShort{len: image.len()})}
	else {Ok(())}
}

/// Writes the checksum of `image[..252]` into `image[252..256]` and returns it. Bytes past the boot stage belong to
/// whatever follows it in flash and are left alone.
pub fn patch(image: &mut [u8]) -> Result<u32, Boot2Error>
{
	check_len(image)?;
	let value = crc::checksum(&image[..CRC_OFFSET]);
	image[CRC_OFFSET..BOOT2_LEN].copy_from_slice(&u32::to_le_bytes(value));
	debug!("boot2 checksum {value:#010X}");
	Ok(value)
}

pub fn stored(image: &[u8]) -> Result<u32, Boot2Error>
{
	check_len(image)?;
	let mut word = [0u8; 4];
	word.copy_from_slice(&image[CRC_OFFSET..BOOT2_LEN]);
	Ok(u32::from_le_bytes(word))
}

pub fn verify(image: &[u8]) -> Result<bool, Boot2Error>
{
	Ok(stored(image)? == crc::checksum(&image[..CRC_OFFSET]))
}

fn read(path: &Path) -> Result<Vec<u8>, Boot2Error>
{
	fs::read(path).map_err(|err| Boot2Error::Read{path: path.to_path_buf(), err})
}

/// Patches the file at `path`. The replacement is staged in a temporary file so a failure never leaves a
/// half-written checksum behind.
pub fn patch_file(path: &Path) -> Result<u32, Boot2Error>
{
	let mut image = read(path)?;
	let value = patch(&mut image)?;
	output::write_all(path, &image)?;
	info!("patched {path:?} with checksum {value:#010X}");
	Ok(value)
}

pub fn verify_file(path: &Path) -> Result<bool, Boot2Error>
{
	verify(&read(path)?)
}
