use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use clap::Parser;
use huffstream::{pipeline, Config, DynErr, Error, STD_CONFIG};

const RCH: &str = "unreachable was reached";

/// Streaming, block-parallel Huffman compressor / expander.
#[derive(Parser, Debug)]
#[command(name = "huffstream", version, about = "compress or expand a stream with block-parallel Huffman coding")]
struct Args {
    /// compress the input (default)
    #[arg(short = 'c', long, conflicts_with_all = ["decompress", "expand"])]
    compress: bool,
    /// decompress the input
    #[arg(short = 'd', long)]
    decompress: bool,
    /// decompress the input (alias for -d, matching the original CLI)
    #[arg(short = 'x', long = "expand")]
    expand: bool,
    /// number of worker threads; 0 derives a count from available parallelism
    #[arg(long, default_value_t = 0)]
    workers: usize,
    /// input path; defaults to standard input
    infile: Option<String>,
    /// output path; defaults to standard output
    outfile: Option<String>,
}

fn open_input(path: &Option<String>) -> Result<Box<dyn Read + Send>, Error> {
    match path {
        Some(p) => Ok(Box::new(BufReader::new(File::open(p).map_err(|_| Error::IoRead)?))),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(path: &Option<String>) -> Result<Box<dyn Write + Send>, Error> {
    match path {
        Some(p) => Ok(Box::new(BufWriter::new(File::create(p).map_err(|_| Error::IoWrite)?))),
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

fn main() -> Result<(), DynErr> {
    env_logger::init();
    let args = Args::parse();

    let decompressing = args.decompress || args.expand;
    if decompressing && args.compress {
        eprintln!("cannot pass both a compress and a decompress flag");
        return Err(Box::new(Error::Usage));
    }

    let mut config: Config = STD_CONFIG;
    config.workers = args.workers;

    let mut input = open_input(&args.infile)?;
    let mut output = open_output(&args.outfile)?;

    let result = if decompressing {
        pipeline::decompress(&mut input, &mut output, &config)
    } else {
        pipeline::compress(&mut input, &mut output, &config)
    };

    output.flush().expect(RCH);
    result?;
    Ok(())
}
