mod args;
mod campaign;

use clap::Parser;
use log::{debug, info, warn};
use snafu::ErrorCompat;
use tokio_util::sync::CancellationToken;

use campaign_core::notify::NotificationQueue;

use crate::args::Args;
use crate::campaign::StderrRenderer;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();
    debug!("args: {:?}", args);

    // Ctrl-C cancels whatever request is in flight; late responses are dropped.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let mut notices = NotificationQueue::new();
    let res = campaign::run(&args, &mut notices, cancel).await;
    if let Err(e) = &res {
        notices.error(e, chrono::Utc::now());
    }
    notices.flush(&mut StderrRenderer);

    if let Err(e) = res {
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        } else {
            debug!("No trace found for {:?}", e);
        }
        std::process::exit(1);
    }
    info!("done");
}
