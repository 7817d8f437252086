//! Command line tool to list, extract, and disassemble programs from BBC
//! Micro DFS disk images.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};

use beeb_disasm::parser::{host_filenames, DfsParser, DiskImage};
use beeb_disasm::{
    parse_number, Address, Disassembler, DisassemblyOptions, DiskParser, OutputFormat, Variable,
};

#[derive(Parser, Debug)]
#[command(
    name = "beeb-disasm",
    author,
    version,
    about = "Extract and disassemble programs from BBC Micro DFS disk images",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a DFS disk image
    #[command(visible_alias = "ls")]
    List {
        /// Disk image
        image: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },

    /// Extract one or more files from a DFS disk image
    #[command(visible_alias = "x")]
    Extract {
        /// Output directory for extracted files
        #[arg(long, default_value = ".")]
        outdir: PathBuf,

        /// Disk image
        image: PathBuf,

        /// Entries to extract, all when omitted
        entries: Vec<String>,
    },

    /// Disassemble a file
    #[command(visible_alias = "d")]
    Disasm {
        /// Program file
        file: PathBuf,

        /// Offset from the start of the file where disassembly begins
        #[arg(value_parser = parse_address)]
        offset: Option<Address>,

        /// Number of bytes to disassemble
        #[arg(value_parser = parse_address)]
        length: Option<Address>,

        /// Load address for the code
        #[arg(long, value_parser = parse_address, default_value = "0")]
        loadaddr: Address,

        /// Locations of known code, comma separated
        #[arg(long, value_delimiter = ',', value_parser = parse_address)]
        codeaddrs: Vec<Address>,

        /// Variable definition NAME=VALUE, may be repeated
        #[arg(long = "definevar")]
        definevars: Vec<Variable>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListFormat {
    Text,
    Json,
}

fn parse_address(s: &str) -> std::result::Result<Address, String> {
    parse_number(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::List { image, format } => list(&image, format),
        Command::Extract {
            outdir,
            image,
            entries,
        } => extract(&image, &entries, &outdir),
        Command::Disasm {
            file,
            offset,
            length,
            loadaddr,
            codeaddrs,
            definevars,
            format,
        } => {
            let program =
                fs::read(&file).with_context(|| format!("Error reading {}", file.display()))?;

            let offset = offset.unwrap_or(0) as usize;
            if offset >= program.len() {
                bail!("offset cannot be past end of file");
            }
            // Over-long lengths are clamped to the rest of the file
            let remaining = program.len() - offset;
            let length = length.map_or(remaining, |l| (l as usize).min(remaining));

            let mut options = DisassemblyOptions::default()
                .with_offset(offset)
                .with_length(length)
                .with_load_address(loadaddr)
                .with_code_addresses(codeaddrs);
            for var in definevars {
                options = options.with_variable(var);
            }

            let stdout = io::stdout();
            let mut sink = format.sink(stdout.lock());
            Disassembler::new(&program, options)
                .disassemble(sink.as_mut())
                .with_context(|| format!("Could not disassemble {}", file.display()))
        }
    }
}

fn read_disk(image: &Path) -> Result<(Vec<u8>, DiskImage)> {
    let data = fs::read(image).with_context(|| format!("Error reading {}", image.display()))?;
    let disk = DfsParser::new()
        .parse(&data)
        .with_context(|| format!("{} is not a DFS disk image", image.display()))?;
    Ok((data, disk))
}

fn list(image: &Path, format: ListFormat) -> Result<()> {
    let (_, disk) = read_disk(image)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        ListFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &disk)?;
            writeln!(out)?;
        }
        ListFormat::Text => {
            writeln!(out, "Disk Title  {}", disk.title)?;
            writeln!(out, "Num Files   {}", disk.files.len())?;
            writeln!(out, "Num Sectors {}", disk.sectors)?;
            writeln!(out, "Boot Option {}", disk.boot_option)?;
            writeln!(out, "Disk Cycle  0x{:X}", disk.cycle)?;
            writeln!(out)?;
            writeln!(out, "Filename  Length LoadAddr ExecAddr Sector")?;
            for entry in &disk.files {
                writeln!(out, "{}", entry)?;
            }
        }
    }
    Ok(())
}

fn extract(image: &Path, entries: &[String], outdir: &Path) -> Result<()> {
    let (data, disk) = read_disk(image)?;

    match fs::metadata(outdir) {
        Ok(meta) if !meta.is_dir() => {
            bail!("output path {} is not a directory", outdir.display())
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(outdir)
                .with_context(|| format!("could not create directory {}", outdir.display()))?;
        }
        Err(e) => return Err(e).with_context(|| format!("could not access {}", outdir.display())),
    }

    let selected = disk
        .select(entries)
        .with_context(|| format!("Could not extract from {}", image.display()))?;

    for (entry, filename) in selected.iter().zip(host_filenames(&selected)) {
        let contents = disk.contents(entry, &data)?;
        let path = outdir.join(filename);
        fs::write(&path, contents)
            .with_context(|| format!("could not write {}", path.display()))?;
        log::info!("Extracted {} ({} bytes) to {}", entry.qualified_name(), contents.len(), path.display());
    }
    Ok(())
}
