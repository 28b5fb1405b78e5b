use std::{path::PathBuf, sync::Arc};

use axum::{response::Html, routing, Router};
use axum_util::logger::{LoggerConfig, LoggerLayer};
use log::Level;
use typed_html::elements::FlowContent;
use typed_html::{dom::DOMTree, html, text};

use crate::{
    config::{Config, UploadConfig},
    storage::ObjectStore,
};

mod delete_contents;
mod get_event;
mod list_events;
mod signed_url;

lazy_static::lazy_static! {
    // registers its histogram on construction, so it is built once per process
    static ref LOGGER: LoggerLayer = LoggerLayer::new(LoggerConfig {
        log_level_filter: Arc::new(|x| {
            if x == "/health" {
                Level::Debug
            } else {
                Level::Info
            }
        }),
        honor_xff: true,
        metric_name: "photo_events_web_responses".to_string(),
    });
}

/// What the gallery pages need to know about the site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub web_base: String,
    pub content_dir: PathBuf,
    pub columns: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub upload: UploadConfig,
    pub site: Arc<SiteConfig>,
}

impl AppState {
    pub fn from_config(config: &Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            upload: config.upload,
            site: Arc::new(SiteConfig {
                web_base: config.web_base.clone(),
                content_dir: config.gallery.content_dir.clone(),
                columns: config.gallery.columns,
            }),
        }
    }
}

async fn health() {}

pub fn route(state: AppState) -> Router {
    Router::new()
        .route("/", routing::get(list_events::list_events))
        .route("/events/:slug", routing::get(get_event::get_event))
        .route("/signed_url", routing::get(signed_url::signed_url))
        .route(
            "/r2_contents/:id",
            routing::delete(delete_contents::delete_contents),
        )
        .route("/health", routing::get(health))
        .layer(LOGGER.clone())
        .with_state(state)
}

#[allow(unused_braces)]
fn page(title: &str, body: Vec<Box<dyn FlowContent<String>>>) -> Html<String> {
    let total: DOMTree<String> = html! {
        <html>
        <head>
            <title>{ text!("{}", title) }</title>
            <style>
                r"
                body {
                    font-family: sans-serif;
                    margin: 0 auto;
                    max-width: 1200px;
                    padding: 16px;
                }
                .masonry {
                    display: flex;
                    gap: 12px;
                    align-items: flex-start;
                }
                .column {
                    flex: 1;
                    display: flex;
                    flex-direction: column;
                    gap: 12px;
                }
                .photo img {
                    width: 100%;
                    display: block;
                }
                .date, .taken, .exif {
                    color: #666;
                    font-size: 0.85em;
                }"
            </style>
        </head>
        <body>
            {body.into_iter()}
        </body>
        </html>
    };
    Html(total.to_string())
}
