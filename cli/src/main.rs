extern crate structopt;

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::process;
use std::str::FromStr;

use structopt::StructOpt;
use strum::{EnumString, VariantNames};
use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use graph::cycle;
use graph::graph::DirectedGraph;

#[derive(EnumString, VariantNames, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
enum Algorithm {
    Dfs,
    Kahn,
    Both,
}

impl Algorithm {
    fn runs_dfs(self) -> bool {
        matches!(self, Algorithm::Dfs | Algorithm::Both)
    }

    fn runs_kahn(self) -> bool {
        matches!(self, Algorithm::Kahn | Algorithm::Both)
    }
}

/// Reads a directed graph from standard input and reports whether it
/// contains a cycle.
#[derive(Debug, StructOpt)]
#[structopt(name = "cycle-detect", rename_all = "kebab-case")]
struct CliArg {
    /// Print the adjacency list before the report
    #[structopt(short, long)]
    debug: bool,
    /// Which checker to run
    #[structopt(short, long, default_value = "both", possible_values = Algorithm::VARIANTS)]
    algorithm: Algorithm,
    /// Print the cycle path found by DFS and Kahn's processed count
    #[structopt(short = "c", long)]
    show_cycle: bool,
    /// Do not print prompts
    #[structopt(short, long)]
    quiet: bool,
}

#[derive(Error, Debug)]
enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of input")]
    UnexpectedEof,
}

/// Whitespace separated tokens read lazily, line by line.
struct Tokens<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Tokens<R> {
        Tokens {
            reader,
            pending: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> Result<String, InputError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(InputError::UnexpectedEof);
            }
            self.pending.extend(line.split_whitespace().map(str::to_owned));
        }
    }
}

struct Session<R, W> {
    tokens: Tokens<R>,
    output: W,
    quiet: bool,
}

impl<R: BufRead, W: Write> Session<R, W> {
    fn new(input: R, output: W, quiet: bool) -> Session<R, W> {
        Session {
            tokens: Tokens::new(input),
            output,
            quiet,
        }
    }

    fn prompt(&mut self, text: &str) -> Result<(), InputError> {
        if !self.quiet {
            write!(self.output, "{}", text)?;
            self.output.flush()?;
        }
        Ok(())
    }

    fn read_number<T: FromStr>(&mut self, prompt: &str) -> Result<T, InputError> {
        loop {
            self.prompt(prompt)?;
            let token = self.tokens.next_token()?;
            match token.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(_) => writeln!(self.output, "Invalid number '{}'. Please re-enter.", token)?,
            }
        }
    }

    /// Reads the vertex count, the edge count and then every edge. An edge
    /// with an endpoint outside the graph is discarded and its slot asked
    /// for again.
    fn read_graph(&mut self) -> Result<DirectedGraph, InputError> {
        let vertices: usize = self.read_number("Enter number of vertices: ")?;
        let edges: usize = self.read_number("Enter number of edges: ")?;
        debug!(vertices, edges, "read graph size");

        let mut graph = DirectedGraph::new(vertices);
        self.prompt("Enter each edge (from to):\n")?;
        let mut slot = 1;
        while slot <= edges {
            let from: i64 = self.read_number(&format!("Edge {} - from: ", slot))?;
            let to: i64 = self.read_number(&format!("Edge {} - to: ", slot))?;
            match graph.try_add_edge(from, to) {
                Ok(()) => slot += 1,
                Err(e) => {
                    warn!(slot, error = %e, "rejected edge");
                    writeln!(self.output, "Invalid edge ({} -> {}). Please re-enter.", from, to)?;
                }
            }
        }
        Ok(graph)
    }
}

fn verdict(has_cycle: bool) -> &'static str {
    if has_cycle {
        "Cycle detected"
    } else {
        "No cycle detected"
    }
}

fn join(vertices: &[usize], separator: &str) -> String {
    vertices.iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

fn report<W: Write>(graph: &DirectedGraph, args: &CliArg, output: &mut W) -> io::Result<()> {
    if args.debug {
        writeln!(output, "\nAdjacency list:")?;
        write!(output, "{}", graph)?;
    }

    writeln!(output)?;
    if args.algorithm.runs_dfs() {
        let found = cycle::find_cycle(graph);
        writeln!(output, "DFS-based Cycle Detection: {}", verdict(found.is_some()))?;
        if let (true, Some(path)) = (args.show_cycle, &found) {
            writeln!(output, "Cycle path: {}", join(path, " -> "))?;
        }
    }
    if args.algorithm.runs_kahn() {
        let outcome = cycle::kahn(graph);
        writeln!(output, "Kahn's Algorithm (BFS-based) Cycle Detection: {}", verdict(outcome.has_cycle()))?;
        if args.show_cycle {
            writeln!(output, "Kahn processed {} of {} vertices", outcome.processed(), graph.vertex_count())?;
            if !outcome.has_cycle() {
                writeln!(output, "Topological order: {}", join(outcome.order(), " "))?;
            }
        }
    }
    Ok(())
}

fn run(args: &CliArg) -> Result<(), InputError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(stdin.lock(), stdout.lock(), args.quiet);

    let graph = session.read_graph()?;
    report(&graph, args, &mut session.output)?;
    session.output.flush()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = CliArg::from_args();
    debug!(?args, "parsed arguments");

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
