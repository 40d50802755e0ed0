// src/main.rs

use runsample::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("runsample error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let report = run(args).await?;
    if report.published {
        println!("{}", report.location.display());
    } else if report.exit_code != 0 {
        eprintln!("workspace left at {}", report.location.display());
    }
    Ok(report.exit_code)
}
