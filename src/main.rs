use std::env;

use tracing_subscriber::EnvFilter;

use monthgrid::cli;

fn main() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "monthgrid=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli::parse_args(env::args().skip(1)).and_then(cli::run) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            eprintln!("{}", cli::USAGE);
            2
        }
    };
    std::process::exit(code);
}
