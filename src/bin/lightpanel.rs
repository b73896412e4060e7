use clap::Parser;
use log::info;
use lightpanel::{init_logging, run};
use lightpanel::args::Args;
use lightpanel::error::{report_error, AppRunError, ConfigError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppRunError> {
    let args = Args::parse();
    init_logging(args.verbose);
    info!(concat!("Light Panel ", env!("CARGO_PKG_VERSION")));

    match run(args).await {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            eprintln!("This panel has already been started with the same config file");
            Ok(())
        },
        Err(err) => {
            report_error("Unexpected error", &err);
            Err(err)
        }
        Ok(_) => Ok(())
    }
}
