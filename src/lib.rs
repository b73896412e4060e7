use std::env;
use log::info;
use tokio_util::sync::CancellationToken;

use crate::args::Args;
use crate::broker::coordinator::Coordinator;
use crate::broker::transport::MqttTransport;
use crate::config::io::ConfigIO;
use crate::error::AppRunError;
use crate::fixture::store::FixtureStore;
use crate::notice::Notifier;
use crate::panel::dispatcher::Dispatcher;
use crate::panel::run_panel;
use crate::panel::shell::{notice_printer_task, shell_task};
use crate::scene::catalog::SceneCatalog;

pub mod args;
pub mod broker;
pub mod config;
pub mod error;
pub mod fixture;
pub mod notice;
pub mod panel;
pub mod scene;

pub fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // rumqttc is chatty about every packet
        .level_for("rumqttc", log::LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

pub async fn run(args: Args) -> Result<(), AppRunError> {
    let config_io = ConfigIO::new_sync(args.config)?;
    let mut config_locker = config_io.locker()?;
    let _config_lock = config_locker.lock()?;

    let mut config = config_io.read_or_init().await?;
    config.apply_env()?;
    config.apply_overrides(args.scheme, args.host, args.port);

    let endpoint = config.endpoint()?;
    let catalog = SceneCatalog::load(config.scene_catalog.as_deref()).await?;
    let store = FixtureStore::new(config.make_fixtures()?);
    info!("Broker at {}, {} lights, dispatch policy {:?}", endpoint.url(), store.fixtures().len(), config.dispatch);

    let cancel = CancellationToken::new();
    let (notifier, notices) = Notifier::channel();

    let coordinator = Coordinator::new(
        MqttTransport::new(cancel.clone()),
        endpoint,
        config.connect_options()?,
        config.connect_timeout(),
        notifier.clone(),
    );
    let dispatcher = Dispatcher::new(
        coordinator,
        store,
        catalog,
        config.topics.clone(),
        config.dispatch,
        notifier,
    );

    let (intents, shell_handle) = shell_task(cancel.clone(), dispatcher.subscribe_status());
    let printer_handle = notice_printer_task(notices);

    run_panel(dispatcher, intents, cancel.clone()).await;

    // the printer ends once every notifier is gone, so the last notices still show
    shell_handle.await.ok();
    printer_handle.await.ok();
    cancel.cancel();
    Ok(())
}
