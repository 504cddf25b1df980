use favkit_cli::CliError;

#[tokio::main]
async fn main() {
    match favkit_cli::run().await {
        Ok(()) => {}
        Err(CliError::Reported) => std::process::exit(1),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
