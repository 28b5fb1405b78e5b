use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::Parser;
use log::{error, info, warn};
use photo_events::{
    config::{CONFIG, MAX_SIGNED_URL_MINUTES},
    gallery,
    storage::S3Store,
    web::{self, AppState},
};

lazy_static::lazy_static! {
    static ref ARGS: Args = Args::parse();
}

/// Photo event gallery: upload signing, object cleanup and gallery pages
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Validates every event in the content directory and exits
    #[clap(short, long)]
    check: bool,
}

async fn check() -> bool {
    let dir = &CONFIG.gallery.content_dir;
    match gallery::check_collection(dir).await {
        Ok(report) => {
            info!(
                "{}: {} valid, {} invalid",
                dir.display(),
                report.valid.len(),
                report.failures.len()
            );
            report.failures.is_empty()
        }
        Err(e) => {
            error!("{e}");
            false
        }
    }
}

#[tokio::main]
async fn main() {
    lazy_static::initialize(&ARGS);

    env_logger::Builder::new()
        .parse_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    if ARGS.check {
        if !check().await {
            std::process::exit(1);
        }
        return;
    }

    if let Some(prometheus_bind) = CONFIG.prometheus_bind {
        prometheus_exporter::start(prometheus_bind).expect("failed to load prometheus_exporter");
    }

    if CONFIG.storage.bucket_name.is_empty() {
        error!("no bucket configured, set storage.bucket_name or BUCKET_NAME");
    }
    info!("using bucket {:?} @ {}", CONFIG.storage.bucket_name, CONFIG.storage.endpoint());
    if CONFIG.upload.signed_url_minutes > MAX_SIGNED_URL_MINUTES {
        warn!(
            "upload.signed_url_minutes = {} exceeds the presign limit, using {MAX_SIGNED_URL_MINUTES}",
            CONFIG.upload.signed_url_minutes
        );
    }
    let store = Arc::new(S3Store::new(&CONFIG.storage).await);
    let state = AppState::from_config(&CONFIG, store);

    async fn run(state: AppState) -> anyhow::Result<()> {
        let server = axum::Server::try_bind(&CONFIG.web_bind)?;
        info!("listening @ {}", CONFIG.web_bind);
        server
            .serve(web::route(state).into_make_service_with_connect_info::<SocketAddr>())
            .await?;
        Ok(())
    }
    loop {
        if let Err(e) = run(state.clone()).await {
            error!("failed to start api server: {:?}", e);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
