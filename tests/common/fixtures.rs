//! Mock web site and runner fixtures

use scraper::{Html, Selector};
use simplespider::item::{Item, ResultObject};
use simplespider::runner::{Matcher, RunnerError};
use simplespider::task::{Task, TaskKind};
use simplespider::web::HttpResponse;
use simplespider::{Config, SpiderBuilder};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Home page linking to two articles, one of them twice
pub const HOME_PAGE: &str = r#"<html><head><title>Home</title></head><body>
  <a href="/wiki/Alpha">Alpha</a>
  <a href="/wiki/Beta#History">Beta</a>
  <a href="/wiki/Alpha">Alpha again</a>
  <a href="mailto:admin@example.com">Contact</a>
</body></html>"#;

/// Article linking back home and to a missing page
pub const ALPHA_PAGE: &str = r#"<html><head><title>Alpha</title></head><body>
  <a href="/">Home</a>
  <a href="/wiki/Missing">Missing</a>
</body></html>"#;

/// Article linking back home
pub const BETA_PAGE: &str = r#"<html><head><title>Beta</title></head><body>
  <a href="/">Home</a>
</body></html>"#;

/// Serve the three-page site; `/wiki/Missing` is a 404
pub async fn mount_site() -> MockServer {
    let server = MockServer::start().await;
    for (route, body) in [
        ("/", HOME_PAGE),
        ("/wiki/Alpha", ALPHA_PAGE),
        ("/wiki/Beta", BETA_PAGE),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/wiki/Missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

/// Configuration with a fresh database path under `dir`
pub fn config_in(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("spider.db");
    config.engine.name = "integration".to_string();
    config
}

/// Register a scrape runner that stores `<title>` as a "page" object keyed by url
pub fn with_title_scraper(builder: SpiderBuilder) -> SpiderBuilder {
    builder.runner_fn("titles", TaskKind::Scrape, Matcher::new(), |task| {
        let value = task
            .response()
            .ok_or_else(|| RunnerError::skip("no response"))?;
        let response = HttpResponse::try_from(value)?;
        let document = Html::parse_document(&response.text());
        let selector =
            Selector::parse("title").map_err(|e| RunnerError::failed(format!("{:?}", e)))?;
        let title: String = document
            .select(&selector)
            .next()
            .map(|t| t.text().collect())
            .unwrap_or_default();

        let url = task.url().unwrap_or_default();
        Ok(vec![Item::Object(
            ResultObject::new("page").with_id(url).with("title", title),
        )])
    })
}

/// Download task for a path on the mock server
pub fn download(server_uri: &str, route: &str) -> Task {
    Task::download(format!("{}{}", server_uri, route)).unwrap()
}
