use axum::{extract::State, response::Html};
use axum_util::errors::ApiResult;
use typed_html::elements::FlowContent;
use typed_html::{html, text};

use crate::{datefmt::format_instant_range, gallery::load_events};

use super::{page, AppState};

#[allow(unused_braces)]
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let entries = load_events(&state.site.content_dir).await?;

    let mut out = Vec::<Box<dyn FlowContent<String>>>::new();
    out.push(html! {
        <h1>"Events"</h1>
    });
    if entries.is_empty() {
        out.push(html! {
            <p>"No events yet."</p>
        });
    }
    for entry in entries {
        let meta = entry.event.meta;
        let range = format_instant_range(meta.start_at, meta.end_at);
        out.push(html! {
            <div class="event">
                <a href={format!("{}events/{}", state.site.web_base, entry.slug)}>{ text!("{}", meta.title) }</a>
                " "
                <span class="date">{ text!("{}", range) }</span>
                {text!(" ({} photos)", entry.event.photos.len())}
            </div>
        });
    }

    Ok(page("Events", out))
}
