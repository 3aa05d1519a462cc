mod bench;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptive_grid=info".parse().unwrap()),
        )
        .init();

    let code = match bench::maybe_parse_args() {
        Ok(Some(args)) => bench::run_benchmark(args).unwrap_or_else(|err| {
            tracing::error!(error = ?err, "Benchmark failed");
            1
        }),
        Ok(None) => {
            println!("{}", bench::USAGE);
            0
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            eprintln!();
            eprintln!("{}", bench::USAGE);
            2
        }
    };
    std::process::exit(code);
}
