use anyhow::{bail, Context};
use clap::Parser;
use logtrail::analyzers::{self, AnalysisOpts};
use logtrail::corpus::LogCorpus;
use logtrail::report;
use logtrail::session::{Response, Session, View};
use logtrail::stats;
use logtrail::temporal::DEFAULT_BAR_HEIGHT;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Once};
use tracing::Level;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[derive(Parser, Debug)]
#[command(name = "logtrail", version, about = "Explore a log file with unknown timestamp format")]
struct Cli {
    /// Log file to load
    input: String,

    /// Print only a specific section: load | histogram | list | stat | analyse
    #[arg(long = "only")]
    only: Option<String>,

    /// Print lines matching a regular expression
    #[arg(long = "filter")]
    filter: Option<String>,

    /// Print the file from the line nearest to this (partial) timestamp
    #[arg(long = "goto")]
    goto: Option<String>,

    /// Histogram width in columns
    #[arg(long = "width", default_value_t = 80)]
    width: usize,
    /// Histogram bar height in rows
    #[arg(long = "height", default_value_t = DEFAULT_BAR_HEIGHT)]
    height: usize,

    /// Output format: json | text (defaults to text on a terminal)
    #[arg(long = "format")]
    format: Option<String>,

    // Analysis tunables
    #[arg(long = "top", default_value_t = 7)] top: usize,
    #[arg(long = "rare", default_value_t = 5)] rare: usize,
    #[arg(long = "rare-max-count", default_value_t = 2)] rare_max_count: usize,
    #[arg(long = "longest", default_value_t = 5)] longest: usize,
    #[arg(long = "suspicious-per-keyword", default_value_t = 3)] suspicious_per_keyword: usize,
    #[arg(long = "ngram-top", default_value_t = 10)] ngram_top: usize,
    #[arg(long = "ngram-sizes", value_delimiter = ',', default_values_t = vec![2, 3, 4])]
    ngram_sizes: Vec<usize>,

    /// Read commands from stdin (list, filter, goto, stat, analyse, help, quit)
    #[arg(long = "interactive", short = 'i', default_value_t = false)]
    interactive: bool,

    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn analysis_opts(&self) -> AnalysisOpts {
        AnalysisOpts {
            top: self.top,
            rare: self.rare,
            rare_max_count: self.rare_max_count,
            longest: self.longest,
            suspicious_per_rule: self.suspicious_per_keyword,
            ngram_top: self.ngram_top,
            ngram_sizes: self.ngram_sizes.clone(),
        }
    }

    fn json(&self) -> anyhow::Result<bool> {
        match self.format.as_deref() {
            None => Ok(!atty::is(atty::Stream::Stdout)),
            Some("json") => Ok(true),
            Some("text") => Ok(false),
            Some(other) => bail!("unknown --format {other:?} (expected json or text)"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    init_parallelism();

    let corpus = Arc::new(
        LogCorpus::load(&cli.input).with_context(|| format!("loading {}", cli.input))?,
    );

    if cli.interactive {
        return run_interactive(corpus, cli.analysis_opts());
    }

    let json = cli.json()?;

    if let Some(expr) = &cli.filter {
        let result = corpus.filter(expr).context("--filter")?;
        if json {
            let lines: Vec<_> = result
                .indices
                .iter()
                .filter_map(|&i| corpus.line(i).map(|l| serde_json::json!({"line": i + 1, "text": l})))
                .collect();
            println!("{}", serde_json::to_string_pretty(&lines)?);
        } else {
            println!("{}", report::render_view(&corpus, &View::Filtered(result)));
        }
        return Ok(());
    }

    if let Some(ts) = &cli.goto {
        let from = logtrail::query::goto(&corpus, ts).context("--goto")?;
        if json {
            println!("{}", serde_json::json!({"line": from + 1, "timestamp": corpus.timestamp(from)}));
        } else {
            println!("{}", report::render_view(&corpus, &View::Tail { from }));
        }
        return Ok(());
    }

    match cli.only.as_deref() {
        Some("load") => print_load(&corpus, json)?,
        Some("histogram") => print_histogram(&corpus, cli.width, cli.height, json)?,
        Some("list") => {
            if json {
                println!("{}", serde_json::to_string_pretty(corpus.lines())?);
            } else {
                println!("{}", report::render_view(&corpus, &View::All));
            }
        }
        Some("stat") => {
            let s = stats::build_statistics(&corpus);
            if json {
                println!("{}", serde_json::to_string_pretty(&s)?);
            } else {
                println!("{}", report::render_statistics(&s));
            }
        }
        Some("analyse") | Some("analyze") => {
            let r = analyzers::analyse(&corpus, &cli.analysis_opts());
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                println!("{}", report::render_analysis(&r));
            }
        }
        Some(other) => bail!("unknown --only {other:?}"),
        None => {
            if json {
                let out = serde_json::json!({
                    "load": corpus.load_result(),
                    "histogram": corpus.histogram(),
                    "statistics": stats::build_statistics(&corpus),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_load(&corpus, false)?;
                println!();
                print_histogram(&corpus, cli.width, cli.height, false)?;
            }
        }
    }
    Ok(())
}

fn print_load(corpus: &LogCorpus, json: bool) -> anyhow::Result<()> {
    let r = corpus.load_result();
    if json {
        println!("{}", serde_json::to_string_pretty(&r)?);
    } else {
        println!("{}", report::render_load(&r));
    }
    Ok(())
}

fn print_histogram(corpus: &LogCorpus, width: usize, height: usize, json: bool) -> anyhow::Result<()> {
    let rendered = match corpus.histogram().rebin(width, height) {
        Ok(r) => r,
        Err(e) => {
            // nothing to plot is not fatal
            eprintln!("histogram: {e}");
            return Ok(());
        }
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        println!("{}", report::render_histogram(&rendered));
    }
    Ok(())
}

fn run_interactive(corpus: Arc<LogCorpus>, opts: AnalysisOpts) -> anyhow::Result<()> {
    let mut session = Session::new(corpus, opts);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", report::render_view(session.corpus(), session.view()))?;
    write!(out, "> ")?;
    out.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line.context("reading command")?;
        match session.submit(&line) {
            Ok(Response::Quit) => break,
            Ok(Response::Updated) => {
                writeln!(out, "{}", report::render_view(session.corpus(), session.view()))?;
            }
            Ok(Response::Unchanged) => {}
            Ok(Response::Prompt(what)) => {
                write!(out, "{what}: ")?;
                out.flush()?;
                continue;
            }
            Ok(Response::AnalysisStarted) => {
                // print sections as they complete
                while let Some(kind) = session.next_section() {
                    if let View::Analysis(r) = session.view() {
                        if let Some(section) = r.get(kind) {
                            writeln!(out, "{}\n", report::render_section(section))?;
                        }
                    }
                }
            }
            Err(e) => writeln!(out, "error: {e}")?,
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}
