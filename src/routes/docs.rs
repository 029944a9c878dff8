use crate::state::AppState;
use actix_web::{get, web, HttpResponse, Responder};
use comrak::{markdown_to_html, Options};
use std::path::Path;

const PAGE_TEMPLATE: &str = include_str!("docs.html");

fn render_markdown(text: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(text, &options)
}

/// Wraps rendered markdown in the themed page shell.
pub fn render_page(markdown: &str) -> String {
    PAGE_TEMPLATE.replace("{content}", &render_markdown(markdown))
}

/// Project documentation rendered from `README.md` in the configured docs directory.
#[get("/")]
pub async fn index(state: web::Data<AppState>) -> impl Responder {
    let path = Path::new(&state.docs_dir).join("README.md");

    let body = match tokio::fs::read_to_string(&path).await {
        Ok(text) => render_page(&text),
        Err(e) => {
            log::warn!("could not read {}: {}", path.display(), e);
            format!("<h1>README.md not found at {}</h1>", path.display())
        }
    };

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}
