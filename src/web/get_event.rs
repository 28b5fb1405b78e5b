use axum::{
    extract::{Path, State},
    response::Html,
};
use axum_util::errors::{ApiError, ApiResult};
use typed_html::elements::FlowContent;
use typed_html::{html, text};

use crate::{
    datefmt::{format_instant, format_instant_range, FormatOptions},
    gallery::load_event,
    masonry::calculate_masonry,
    schema::Photo,
};

use super::{page, AppState};

#[allow(unused_braces)]
fn photo_tile(photo: &Photo) -> Box<dyn FlowContent<String>> {
    let mut caption = Vec::<Box<dyn FlowContent<String>>>::new();
    if !photo.place.is_empty() {
        caption.push(html! {
            <div class="place">{ text!("{}", photo.place) }</div>
        });
    }
    if !photo.description.is_empty() {
        caption.push(html! {
            <div class="description">{ text!("{}", photo.description) }</div>
        });
    }
    if let Some(taken) = photo.date_time {
        let taken = format_instant(taken, photo.timezone.as_deref(), FormatOptions::default());
        caption.push(html! {
            <div class="taken">{ text!("{}", taken) }</div>
        });
    }
    if let Some(exif) = photo.exif.summary() {
        caption.push(html! {
            <div class="exif">{ text!("{}", exif) }</div>
        });
    }

    html! {
        <div class="photo">
            <a href={photo.url.to_string()}>
                <img src={photo.thumbnail_url.to_string()} alt={photo.description.clone()}/>
            </a>
            {caption.into_iter()}
        </div>
    }
}

#[allow(unused_braces)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Html<String>> {
    let Some(entry) = load_event(&state.site.content_dir, &slug).await? else {
        return Err(ApiError::NotFound);
    };
    let event = entry.event;
    let range = format_instant_range(event.meta.start_at, event.meta.end_at);

    let mut out = Vec::<Box<dyn FlowContent<String>>>::new();
    out.push(html! {
        <div>
            <a href={state.site.web_base.clone()}>{ text!("All events") }</a>
        </div>
    });
    out.push(html! {
        <h1>{ text!("{}", event.meta.title) }</h1>
    });
    out.push(html! {
        <p class="date">{ text!("{}", range) }</p>
    });
    if !event.meta.description.is_empty() {
        out.push(html! {
            <p>{ text!("{}", event.meta.description) }</p>
        });
    }

    let mut columns = Vec::<Box<dyn FlowContent<String>>>::new();
    for column in calculate_masonry(&event.photos, state.site.columns) {
        let tiles: Vec<Box<dyn FlowContent<String>>> = column.into_iter().map(photo_tile).collect();
        columns.push(html! {
            <div class="column">
                {tiles.into_iter()}
            </div>
        });
    }
    out.push(html! {
        <div class="masonry">
            {columns.into_iter()}
        </div>
    });

    Ok(page(&event.meta.title, out))
}
