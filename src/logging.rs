use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// How chatty a run is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Nothing on the console.
    Silent,
    /// Load and run summaries plus progress.
    #[default]
    Normal,
    /// Every match and worker setup.
    Debug,
}

impl Verbosity {
    pub fn level(self) -> log::LevelFilter {
        match self {
            Verbosity::Silent => log::LevelFilter::Off,
            Verbosity::Normal => log::LevelFilter::Info,
            Verbosity::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Initialize the logger with elapsed-time formatting.
///
/// Output format: [HH:MM:SS] LEVEL: message, on stderr. Silent runs install
/// no logger at all.
pub fn init_logger(verbosity: Verbosity) {
    if verbosity == Verbosity::Silent {
        log::set_max_level(log::LevelFilter::Off);
        return;
    }
    let start = *START_TIME.get_or_init(Instant::now);

    env_logger::Builder::from_default_env()
        .filter_level(verbosity.level())
        .format(move |buf, record| {
            let elapsed = start.elapsed();
            let hours = elapsed.as_secs() / 3600;
            let minutes = (elapsed.as_secs() % 3600) / 60;
            let seconds = elapsed.as_secs() % 60;

            writeln!(
                buf,
                "[{:02}:{:02}:{:02}] {}: {}",
                hours,
                minutes,
                seconds,
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok();
}
