use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{LevelFilter, info, warn};

use picopack::boot2;
use picopack::output;
use picopack::uf2::{self, FLASH_BASE, RP2040_FAMILY_ID};

#[derive(Debug, Parser)]
#[clap(name = "picopack", version, about = "Patch boot2 checksums and package RP2040 firmware as UF2.")]
struct Opts
{
	/// Increase log output (repeat for more).
	#[clap(short, long, action = clap::ArgAction::Count, global = true)]
	verbose: u8,
	
	#[clap(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command
{
	/// Embed the boot ROM checksum into a second stage boot image, in place.
	Boot2
	{
		image: PathBuf,
		/// Only check the stored checksum, exit with an error if it is wrong.
		#[clap(long)]
		check: bool,
	},
	/// Convert a flat binary into a UF2 container.
	Uf2
	{
		input: PathBuf,
		output: PathBuf,
		/// Address of the first byte of the image.
		#[clap(long, value_parser = parse_u32, default_value_t = FLASH_BASE)]
		base: u32,
		/// Family ID stored in every block.
		#[clap(long, value_parser = parse_u32, default_value_t = RP2040_FAMILY_ID)]
		family: u32,
		/// The image starts with boot2, patch its checksum before encoding.
		#[clap(long)]
		boot2: bool,
	},
	/// Print a summary of a UF2 container.
	Info
	{
		input: PathBuf,
	},
}

fn parse_u32(src: &str) -> Result<u32, ParseIntError>
{
	parse_int::parse(src)
}

fn init_logging(verbose: u8)
{
	let level = match verbose
	{
		0 => LevelFilter::Warn,
		1 => LevelFilter::Info,
		2 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};
	let mut builder = pretty_env_logger::formatted_builder();
	builder.filter_level(level);
	if let Ok(filters) = std::env::var("RUST_LOG")
	{
		builder.parse_filters(&filters);
	}
	builder.init();
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>>
{
	fs::read(path).with_context(|| format!("Could not read {}", path.display()))
}

fn run(opts: Opts) -> anyhow::Result<()>
{
	match opts.command
	{
		Command::Boot2{image, check: true} =>
		{
			if !boot2::verify_file(&image).with_context(|| format!("Could not verify {}", image.display()))?
			{
				warn!("checksum mismatch in {image:?}");
				bail!("Boot image {} has an invalid checksum", image.display());
			}
			println!("Checksum OK");
		},
		Command::Boot2{image, check: false} =>
		{
			let value = boot2::patch_file(&image).with_context(|| format!("Could not patch {}", image.display()))?;
			println!("Checksum {value:#010X}");
		},
		Command::Uf2{input, output: out_path, base, family, boot2: patch_boot2} =>
		{
			let mut data = read(&input)?;
			if patch_boot2
			{
				boot2::patch(&mut data).context("Boot2 patch failed")?;
			}
			let container = uf2::write::encode(&data, base, family).context("UF2 encoding failed")?;
			output::write_all(&out_path, &container)?;
			info!("wrote {} blocks to {out_path:?}", container.len() / uf2::BLOCK_LEN);
		},
		Command::Info{input} =>
		{
			let data = read(&input)?;
			let decoded = uf2::read::decode(&data).with_context(|| format!("Malformed UF2 file {}", input.display()))?;
			println!("blocks:  {}", decoded.blocks);
			println!("address: {:#010X}", decoded.addr);
			println!("info:    {}", decoded.info);
			println!("payload: {} bytes", decoded.data.len());
		},
	}
	Ok(())
}

pub fn main()
{
	let opts = Opts::parse();
	init_logging(opts.verbose);
	if let Err(err) = run(opts)
	{
		eprintln!("Error: {err}");
		for src in err.chain().skip(1)
		{
			eprintln!("\tsource: {src}");
		}
		std::process::exit(1);
	}
}
