//! Server-rendered browse pages.
//!
//! Each catalog gets one page per cursor position with a plain "load more"
//! link; the progressive version of the same listing is the RPC API plus
//! the client-side feed. Owned items pick up a badge when the session
//! proxy identifies the visitor, and `?owned=hide` filters them out.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use serde::Deserialize;
use tokio::task;

use crate::catalog::{clamp_limit, stats, StatsReport};
use crate::cursor::Cursor;
use crate::model::{AnyKind, ExpandedInstance, ExpandedItem, InstanceKind, ItemKind, Page};
use crate::server::rpc::RpcError;
use crate::server::{identity_from, AppState};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BrowseParams {
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    owned: Option<String>,
}

pub(crate) async fn index(State(state): State<AppState>) -> Result<Html<String>, RpcError> {
    let report = task::spawn_blocking(move || stats(state.db_path())).await??;
    Ok(Html(render_index(&report)))
}

pub(crate) async fn browse(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(params): Query<BrowseParams>,
    headers: HeaderMap,
) -> Result<Html<String>, RpcError> {
    let kind = AnyKind::from_plural(&segment)
        .ok_or_else(|| RpcError::UnknownCatalog(segment.clone()))?;
    let cursor = Cursor::decode_opt(params.cursor.as_deref())?;
    let limit = clamp_limit(params.limit, kind.default_limit());
    let identity = identity_from(&headers);
    let hide_owned = identity.is_some() && params.owned.as_deref() == Some("hide");

    let html = match kind {
        AnyKind::Item(item_kind) => {
            let page = task::spawn_blocking(move || {
                state.open_catalog()?.page_items(item_kind, cursor, limit)
            })
            .await??;
            render_item_page(item_kind, &page, identity.as_deref(), hide_owned, limit)
        }
        AnyKind::Instance(instance_kind) => {
            let page = task::spawn_blocking(move || {
                state.open_catalog()?.page_instances(instance_kind, cursor, limit)
            })
            .await??;
            render_instance_page(instance_kind, &page, identity.as_deref(), limit)
        }
    };
    Ok(Html(html))
}

#[cfg(feature = "bundled-assets")]
pub(crate) async fn bundled_asset(Path(path): Path<String>) -> axum::response::Response {
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;

    static ASSETS: include_dir::Dir<'static> =
        include_dir::include_dir!("$CARGO_MANIFEST_DIR/web");

    match ASSETS.get_file(path.as_str()) {
        Some(file) => {
            let mime = mime_guess::from_path(path.as_str()).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], file.contents()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn render_index(report: &StatsReport) -> String {
    let mut rows = String::new();
    for entry in report.items.iter().chain(report.instances.iter()) {
        let display = AnyKind::from_plural(entry.kind)
            .map(|kind| kind.display_plural())
            .unwrap_or(entry.kind);
        rows.push_str(&format!(
            "<li><a href=\"/browse/{}\">{}</a><span class=\"count\">{}</span></li>",
            entry.kind, display, entry.count
        ));
    }
    let main = format!(
        "<h2>Catalogs</h2><ul class=\"catalog-index\">{rows}</ul>\
         <p class=\"tally\">{} collectors tracking {} collection entries.</p>",
        report.users, report.ownership_rows
    );
    shell("Catalogs", &main)
}

fn render_item_page(
    kind: ItemKind,
    page: &Page<ExpandedItem>,
    identity: Option<&str>,
    hide_owned: bool,
    limit: u32,
) -> String {
    let mut cards = String::new();
    let mut shown = 0usize;
    for item in &page.items {
        let owned = identity.map(|user| item.owned_by(user)).unwrap_or(false);
        if hide_owned && owned {
            continue;
        }
        shown += 1;
        cards.push_str(&render_item_card(item, owned));
    }

    let mut main = format!("<h2>{}</h2>", kind.display_plural());
    if shown == 0 {
        main.push_str("<p class=\"empty\">Nothing to show here.</p>");
    } else {
        main.push_str(&format!("<ul class=\"cards\">{cards}</ul>"));
    }
    main.push_str(&page_footer(
        kind.plural(),
        page.next_cursor.as_deref(),
        limit,
        hide_owned,
    ));
    shell(kind.display_plural(), &main)
}

fn render_instance_page(
    kind: InstanceKind,
    page: &Page<ExpandedInstance>,
    identity: Option<&str>,
    limit: u32,
) -> String {
    let mut cards = String::new();
    for instance in &page.items {
        cards.push_str(&render_instance_card(instance, identity));
    }

    let mut main = format!("<h2>{}</h2>", kind.display_plural());
    if page.items.is_empty() {
        main.push_str("<p class=\"empty\">Nothing to show here.</p>");
    } else {
        main.push_str(&format!("<ul class=\"cards\">{cards}</ul>"));
    }
    main.push_str(&page_footer(
        kind.plural(),
        page.next_cursor.as_deref(),
        limit,
        false,
    ));
    shell(kind.display_plural(), &main)
}

fn render_item_card(item: &ExpandedItem, owned: bool) -> String {
    let class = if owned { "card owned" } else { "card" };
    let mut out = format!("<li class=\"{class}\"><h3>{}</h3>", escape(&item.name));
    if let Some(image) = &item.image {
        out.push_str(&format!("<img src=\"{}\" alt=\"\">", escape(image)));
    }
    if !item.sources.is_empty() {
        out.push_str("<ul class=\"sources\">");
        for source in &item.sources {
            out.push_str(&format!(
                "<li><span class=\"source-type\">{}</span> {}</li>",
                escape(&source.kind),
                escape(&source.text)
            ));
        }
        out.push_str("</ul>");
    }
    out.push_str(&format!(
        "<p class=\"collectors\">{} collectors</p>",
        item.owners.len()
    ));
    if owned {
        out.push_str("<span class=\"badge\">Collected</span>");
    }
    out.push_str("</li>");
    out
}

fn render_instance_card(instance: &ExpandedInstance, identity: Option<&str>) -> String {
    let complete = identity
        .map(|user| instance.fully_owned_by(user))
        .unwrap_or(false);
    let class = if complete { "card complete" } else { "card" };
    let mut out = format!("<li class=\"{class}\"><h3>{}</h3>", escape(&instance.name));
    if let Some(image) = &instance.image {
        out.push_str(&format!("<img src=\"{}\" alt=\"\">", escape(image)));
    }
    for (kind, items) in instance.reward_groups() {
        out.push_str(&format!("<h4>{}</h4><ul class=\"rewards\">", kind.display_plural()));
        for item in items {
            let owned = identity.map(|user| item.owned_by(user)).unwrap_or(false);
            let class = if owned { "reward owned" } else { "reward" };
            out.push_str(&format!(
                "<li class=\"{class}\">{}</li>",
                escape(&item.name)
            ));
        }
        out.push_str("</ul>");
    }
    if complete {
        out.push_str("<span class=\"badge\">Completed</span>");
    }
    out.push_str("</li>");
    out
}

fn page_footer(segment: &str, next_cursor: Option<&str>, limit: u32, hide_owned: bool) -> String {
    match next_cursor {
        Some(token) => {
            let mut href = format!("/browse/{segment}?cursor={token}&limit={limit}");
            if hide_owned {
                href.push_str("&owned=hide");
            }
            format!("<a class=\"more\" href=\"{href}\">Load more</a>")
        }
        None => "<p class=\"end\">End of the catalog.</p>".to_string(),
    }
}

fn shell(title: &str, main: &str) -> String {
    let mut nav = String::new();
    for kind in ItemKind::ALL {
        nav.push_str(&format!(
            "<a href=\"/browse/{}\">{}</a>",
            kind.plural(),
            kind.display_plural()
        ));
    }
    for kind in InstanceKind::ALL {
        nav.push_str(&format!(
            "<a href=\"/browse/{}\">{}</a>",
            kind.plural(),
            kind.display_plural()
        ));
    }
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Dungeoneer</title>
    <link rel="stylesheet" href="/assets/style.css">
  </head>
  <body>
    <header><a class="home" href="/">Dungeoneer</a><nav>{nav}</nav></header>
    <main>{main}</main>
  </body>
</html>"#
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
