use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use the_count::logging::{Verbosity, init_logger};
use the_count::*;

/// Exit status after an interrupt (128 + SIGINT).
const INTERRUPTED: u8 = 130;

/// Count the haystack records that contain each needle exactly.
#[derive(Parser, Debug)]
#[command(name = "the-count", author, version, about)]
struct Args {
    /// FASTA file of needles (probes) to look for
    #[arg(short = 'd', long)]
    needles: PathBuf,

    /// FASTA file of haystack records (reads) to search
    #[arg(short = 'r', long)]
    haystack: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads; 0 runs sequentially
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Haystack records per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Alphabet in code order
    #[arg(long, default_value = "ATCG")]
    alphabet: String,

    /// Bits per symbol (default: ceil(log2(alphabet size)))
    #[arg(long)]
    pack_width: Option<u32>,

    /// Fail on needles longer than one window instead of truncating them
    #[arg(long, default_value_t = false)]
    reject_long_needles: bool,

    /// Print debugging information
    #[arg(long, default_value_t = false, conflicts_with = "silent")]
    debug: bool,

    /// Do not print anything at all
    #[arg(long, default_value_t = false)]
    silent: bool,
}

impl Args {
    fn verbosity(&self) -> Verbosity {
        if self.debug {
            Verbosity::Debug
        } else if self.silent {
            Verbosity::Silent
        } else {
            Verbosity::Normal
        }
    }

    fn config(&self) -> CountConfig {
        let cfg = CountConfig::default()
            .workers(self.workers)
            .batch_size(self.batch_size)
            .alphabet(self.alphabet.as_bytes())
            .long_needles(if self.reject_long_needles {
                LongNeedlePolicy::Reject
            } else {
                LongNeedlePolicy::Truncate
            });
        match self.pack_width {
            Some(w) => cfg.pack_width(w),
            None => cfg,
        }
    }
}

fn run(args: &Args, cancel: &CancelToken) -> Result<()> {
    let verbosity = args.verbosity();
    let cfg = args.config();

    let show_progress = verbosity != Verbosity::Silent;
    let total = if show_progress {
        Some(count_haystack(&args.haystack, cancel)?)
    } else {
        None
    };

    let mut stderr = io::stderr();
    let mut progress = |n: usize| {
        if let Some(total) = total {
            let _ = write!(stderr, "\rPROGRESS {n}/{total}");
            let _ = stderr.flush();
        }
    };
    progress(0);

    let result = count_files(&args.needles, &args.haystack, &cfg, cancel, &mut progress);
    if show_progress {
        eprintln!();
    }
    let table = result?;
    if cancel.is_cancelled() {
        return Err(CountError::Cancelled.into());
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            table.write_report(BufWriter::new(file))?;
        }
        None if verbosity != Verbosity::Silent => {
            table.write_report(io::stdout().lock())?;
        }
        None => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbosity());

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        log::warn!("cannot install interrupt handler: {e}");
    }

    match run(&args, &cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if matches!(e.downcast_ref::<CountError>(), Some(CountError::Cancelled)) => {
            ExitCode::from(INTERRUPTED)
        }
        Err(e) => {
            eprintln!("the-count: {e:#}");
            ExitCode::FAILURE
        }
    }
}
