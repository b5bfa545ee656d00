// Command-line front end.
//
// Explicit subcommands mirroring the three operations, plus inspection
// helpers. Binary payloads can go to stdout for piping; stats go to stderr
// (optionally as JSON).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::block::hex_digest;
use crate::engine::{self, SignatureOptions};
use crate::format::delta::{DeltaReader, Instruction};
use crate::format::signature::Signature;
use crate::format::{DEFAULT_BLOCK_SIZE, DELTA_MAGIC, MAX_BLOCK_SIZE, SIGNATURE_MAGIC};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Fixed-block delta encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "blockdelta",
    version,
    about = "Fixed-block delta encoder/decoder (signature, delta, patch)",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate the block signature of a basis file.
    #[command(alias = "sig")]
    Signature(SignatureArgs),
    /// Compute a delta from a signature and a new file.
    Delta(DeltaArgs),
    /// Reconstruct the new file from a basis file and a delta.
    Patch(PatchArgs),
    /// Print header and record details of a signature or delta file.
    Info(InfoArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct SignatureArgs {
    /// Basis file to describe.
    #[arg(value_hint = ValueHint::FilePath)]
    basis: PathBuf,

    /// Signature output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Block size in bytes (supports K/M/G suffix).
    #[arg(long = "block-size", short = 'b', value_parser = parse_byte_size, default_value_t = DEFAULT_BLOCK_SIZE as u64)]
    block_size: u64,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,
}

#[derive(Args, Debug)]
struct DeltaArgs {
    /// Signature of the basis file.
    #[arg(long, short = 's', value_hint = ValueHint::FilePath)]
    signature: PathBuf,

    /// New file to encode.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Delta output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Basis file to copy blocks from.
    #[arg(long, short = 's', value_hint = ValueHint::FilePath)]
    basis: PathBuf,

    /// Delta file to replay.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Reconstructed output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Signature or delta file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Output plumbing
// ---------------------------------------------------------------------------

/// Open the output sink: stdout when requested or no path given, otherwise
/// the file (refusing to clobber without --force).
fn open_output(
    use_stdout: bool,
    path: Option<&Path>,
    force: bool,
) -> Result<Box<dyn Write>, String> {
    match (use_stdout, path) {
        (true, _) | (_, None) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            File::create(path)
                .map(|f| Box::new(BufWriter::with_capacity(BUF_SIZE, f)) as Box<dyn Write>)
                .map_err(|e| format!("output file: {}: {e}", path.display()))
        }
    }
}

fn open_input(path: &Path, what: &str) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(|f| BufReader::with_capacity(BUF_SIZE, f))
        .map_err(|e| format!("{what}: {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// Signature command
// ---------------------------------------------------------------------------

fn cmd_signature(args: &SignatureArgs, cli: &Cli) -> i32 {
    let block_size = match u32::try_from(args.block_size) {
        Ok(v) if v >= 1 && v <= MAX_BLOCK_SIZE => v,
        _ => {
            eprintln!(
                "blockdelta: --block-size: {} out of range 1..={MAX_BLOCK_SIZE}",
                args.block_size
            );
            return 1;
        }
    };

    let mut basis = match open_input(&args.basis, "basis file") {
        Ok(r) => r,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };
    let mut output = match open_output(args.stdout, args.output.as_deref(), cli.force) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };

    let stats = match engine::signature(&mut basis, &mut output, &SignatureOptions { block_size }) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("blockdelta: signature error: {e}");
            return 1;
        }
    };
    if let Err(e) = output.flush() {
        eprintln!("blockdelta: write flush error: {e}");
        return 1;
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!(
            "blockdelta: signature: basis size: {}, blocks: {}, block size: {}",
            stats.basis_size, stats.blocks, stats.block_size
        );
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "signature",
            "basis_size": stats.basis_size,
            "block_size": stats.block_size,
            "blocks": stats.blocks,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Delta command
// ---------------------------------------------------------------------------

fn cmd_delta(args: &DeltaArgs, cli: &Cli) -> i32 {
    let mut sig_in = match open_input(&args.signature, "signature file") {
        Ok(r) => r,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };
    let mut new = match open_input(&args.input, "input file") {
        Ok(r) => r,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };
    let mut output = match open_output(args.stdout, args.output.as_deref(), cli.force) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };

    let stats = match engine::delta(&mut sig_in, &mut new, &mut output) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("blockdelta: delta error: {e}");
            return 1;
        }
    };
    if let Err(e) = output.flush() {
        eprintln!("blockdelta: write flush error: {e}");
        return 1;
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!(
            "blockdelta: delta: input size: {}, copies: {}, literal runs: {} ({} bytes)",
            stats.new_size, stats.copies, stats.literal_runs, stats.literal_bytes
        );
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "delta",
            "input_size": stats.new_size,
            "copies": stats.copies,
            "literal_runs": stats.literal_runs,
            "literal_bytes": stats.literal_bytes,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(args: &PatchArgs, cli: &Cli) -> i32 {
    let mut basis = match File::open(&args.basis) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("blockdelta: basis file: {}: {e}", args.basis.display());
            return 1;
        }
    };
    let mut delta_in = match open_input(&args.input, "delta file") {
        Ok(r) => r,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };
    let mut output = match open_output(args.stdout, args.output.as_deref(), cli.force) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };

    let stats = match engine::patch(&mut basis, &mut delta_in, &mut output) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("blockdelta: patch error: {e}");
            return 1;
        }
    };
    if let Err(e) = output.flush() {
        eprintln!("blockdelta: write flush error: {e}");
        return 1;
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!(
            "blockdelta: patch: output size: {}, copies: {}, literal runs: {}",
            stats.output_size, stats.copies, stats.literal_runs
        );
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "patch",
            "output_size": stats.output_size,
            "copies": stats.copies,
            "literal_runs": stats.literal_runs,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(args: &InfoArgs, cli: &Cli) -> i32 {
    let mut reader = match open_input(&args.input, "input file") {
        Ok(r) => r,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };

    // Sniff the magic, then rewind and hand the stream to the right parser.
    let mut magic = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut magic) {
        eprintln!("blockdelta: {}: {e}", args.input.display());
        return 1;
    }
    if let Err(e) = reader.rewind() {
        eprintln!("blockdelta: {}: {e}", args.input.display());
        return 1;
    }

    if magic[..3] == SIGNATURE_MAGIC[..3] {
        info_signature(&mut reader, cli)
    } else if magic[..3] == DELTA_MAGIC[..3] {
        info_delta(&mut reader, cli)
    } else {
        eprintln!(
            "blockdelta: {}: neither a signature nor a delta file",
            args.input.display()
        );
        1
    }
}

fn info_signature(reader: &mut BufReader<File>, cli: &Cli) -> i32 {
    let sig = match Signature::read_from(reader) {
        Ok(sig) => sig,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };

    println!("signature version:   0");
    println!("block size:          {}", sig.block_size());
    println!("blocks:              {}", sig.total_blocks());
    println!("basis size:          {}", sig.basis_size());

    if cli.verbose > 0 {
        for (index, block) in sig.blocks().iter().enumerate() {
            println!(
                "block {index:>8}:  len {:>10}  {}",
                block.length,
                hex_digest(&block.digest)
            );
        }
    }

    0
}

fn info_delta(reader: &mut BufReader<File>, cli: &Cli) -> i32 {
    let delta = match DeltaReader::new(reader) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("blockdelta: {e}");
            return 1;
        }
    };

    println!("delta version:       0");
    println!("block size:          {}", delta.header().block_size);
    println!("basis size:          {}", delta.header().basis_size);

    let mut copies = 0u64;
    let mut literal_runs = 0u64;
    let mut literal_bytes = 0u64;
    let mut iter = delta.instructions();
    for (n, inst) in iter.by_ref().enumerate() {
        match inst {
            Ok(Instruction::Copy { index }) => {
                copies += 1;
                if cli.verbose > 0 {
                    println!("inst {n:>9}:  copy block {index}");
                }
            }
            Ok(Instruction::Literal { data }) => {
                literal_runs += 1;
                literal_bytes += data.len() as u64;
                if cli.verbose > 0 {
                    println!("inst {n:>9}:  literal {} bytes", data.len());
                }
            }
            Err(e) => {
                eprintln!("blockdelta: instruction {n}: {e}");
                return 1;
            }
        }
    }

    println!("copy instructions:   {copies}");
    println!("literal runs:        {literal_runs}");
    println!("literal bytes:       {literal_bytes}");
    if let Some(digest) = iter.trailer() {
        println!("output sha256:       {}", hex_digest(digest));
    }

    0
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("blockdelta version {version} (Rust), Copyright (C) blockdelta contributors");
    eprintln!("Licensed under the MIT license");

    let ptr_size = std::mem::size_of::<*const ()>();
    eprintln!("DEFAULT_BLOCK_SIZE={DEFAULT_BLOCK_SIZE}");
    eprintln!("MAX_BLOCK_SIZE={MAX_BLOCK_SIZE}");
    eprintln!("DIGEST=sha256");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Cmd::Signature(args) => cmd_signature(args, &cli),
        Cmd::Delta(args) => cmd_delta(args, &cli),
        Cmd::Patch(args) => cmd_patch(args, &cli),
        Cmd::Info(args) => cmd_info(args, &cli),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("blockdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    let _ = Cli::try_parse_from(argv);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
