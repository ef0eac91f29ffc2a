use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use graphd_core::{AlgorithmKind, GraphRequest, MatrixRequest};

#[derive(Parser, Debug)]
#[command(
    name = "graphd-client",
    version,
    about = "Send one graph analysis request to a graphd server"
)]
struct Cli {
    #[arg(
        short = 'a',
        long,
        required_unless_present = "matrix",
        help = "Algorithm: EULERIAN, MST, SCC, HAMILTON or MAXCLIQUE"
    )]
    algorithm: Option<AlgorithmKind>,

    #[arg(short = 'v', long, required_unless_present = "matrix", help = "Number of vertices")]
    vertices: Option<usize>,

    #[arg(short = 'e', long, required_unless_present = "matrix", help = "Number of edges")]
    edges: Option<usize>,

    #[arg(
        short = 's',
        long,
        allow_hyphen_values = true,
        required_unless_present = "matrix",
        help = "Random seed"
    )]
    seed: Option<i64>,

    #[arg(
        long,
        conflicts_with_all = ["algorithm", "vertices", "edges", "seed"],
        help = "Send this adjacency matrix file instead (serial servers answer with an Eulerian verdict)"
    )]
    matrix: Option<PathBuf>,

    #[arg(long, requires = "matrix", help = "Treat the matrix as a directed graph")]
    directed: bool,

    #[arg(long, default_value = "mysocket", env = "GRAPHD_SOCKET", help = "Server socket path")]
    socket: PathBuf,

    #[arg(long, default_value_t = 10, help = "Seconds to wait for the reply")]
    timeout: u64,
}

impl Cli {
    fn request_text(&self) -> Result<String> {
        if let Some(path) = &self.matrix {
            let rows = std::fs::read_to_string(path)
                .with_context(|| format!("reading matrix file {:?}", path))?;
            return Ok(MatrixRequest::new(rows, self.directed).to_request_text());
        }

        let (Some(algorithm), Some(vertices), Some(edges), Some(seed)) =
            (self.algorithm, self.vertices, self.edges, self.seed)
        else {
            anyhow::bail!("-a, -v, -e and -s are required without --matrix");
        };
        let request = GraphRequest {
            algorithm,
            vertices,
            edges,
            seed,
        };
        Ok(request.to_request_line())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let text = cli.request_text()?;

    let timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    let reply = graphd_server::client::request(&cli.socket, &text, timeout)
        .with_context(|| format!("request to {:?} failed", cli.socket))?;
    print!("{}", reply);
    Ok(())
}
