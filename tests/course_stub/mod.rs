use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;

pub const COURSE: &str = "abc123";

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl Route {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            body: body.as_bytes().to_vec(),
            headers: vec![("Content-Type", "text/html; charset=utf-8")],
        }
    }

    #[allow(dead_code)]
    /// Body compressed and labelled with `Content-Encoding: gzip`.
    pub fn gzip_encoded(text: &str) -> Self {
        Self {
            status: 200,
            body: gzip(text.as_bytes()),
            headers: vec![
                ("Content-Type", "text/plain; charset=utf-8"),
                ("Content-Encoding", "gzip"),
            ],
        }
    }

    #[allow(dead_code)]
    /// Gzip bytes served as an opaque download, without an encoding header.
    pub fn gzip_file(text: &str) -> Self {
        Self {
            status: 200,
            body: gzip(text.as_bytes()),
            headers: vec![("Content-Type", "application/octet-stream")],
        }
    }

    /// HTML compressed the way web servers do when gzip is negotiated.
    #[allow(dead_code)]
    pub fn gzip_html(body: &str) -> Self {
        Self {
            status: 200,
            body: gzip(body.as_bytes()),
            headers: vec![
                ("Content-Type", "text/html; charset=utf-8"),
                ("Content-Encoding", "gzip"),
            ],
        }
    }

    #[allow(dead_code)]
    pub fn plain(text: &str) -> Self {
        Self {
            status: 200,
            body: text.as_bytes().to_vec(),
            headers: vec![("Content-Type", "text/plain; charset=utf-8")],
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: b"error".to_vec(),
            headers: Vec::new(),
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub cookie: Option<String>,
    pub accept_encoding: Option<String>,
}

pub struct CourseServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CourseServer {
    /// Routes are keyed by request path; the query string is ignored.
    pub fn spawn(routes: HashMap<String, Route>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let log = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url).to_owned();
                let header = |name: &'static str| {
                    request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv(name))
                        .map(|h| h.value.as_str().to_owned())
                };
                let recorded = RecordedRequest {
                    path: path.clone(),
                    cookie: header("Cookie"),
                    accept_encoding: header("Accept-Encoding"),
                };
                log.lock().expect("request log lock").push(recorded);

                let route = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| Route::status(404));
                let mut response =
                    tiny_http::Response::from_data(route.body).with_status_code(route.status);
                for (name, value) in route.headers {
                    let header =
                        tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes())
                            .expect("build header");
                    response = response.with_header(header);
                }

                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log lock").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        self.requests.lock().expect("request log lock").clear();
    }
}

impl Drop for CourseServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[allow(dead_code)]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("gzip fixture");
    encoder.finish().expect("finish gzip fixture")
}

pub fn progress_page(subsections: &[(&str, &str)]) -> String {
    let children = subsections
        .iter()
        .map(|(title, href)| {
            format!("      <div class=\"subsection\"><h3><a href=\"{href}\">{title}</a></h3></div>\n")
        })
        .collect::<String>();
    format!(
        "<!doctype html>\n<html><body>\n  <div class=\"chapter\">\n    <div class=\"sections\">\n      <div class=\"chapter-note\">Week 1</div>\n{children}    </div>\n  </div>\n</body></html>\n"
    )
}

#[allow(dead_code)]
pub fn subsection_page(transcript_href: Option<&str>) -> String {
    let link = match transcript_href {
        Some(href) => format!("<a class=\"download\" href=\"{href}\">Download transcript</a>"),
        None => "<p>This unit has no video.</p>".to_owned(),
    };
    format!("<!doctype html>\n<html><body>\n<div class=\"video\">\n{link}\n</div>\n</body></html>\n")
}

pub fn progress_path() -> String {
    format!("/courses/{COURSE}/progress")
}

pub fn write_config(dir: &Path, base_url: &str, redownload: bool) {
    let config = serde_json::json!({
        "root_url": base_url,
        "course_url": COURSE,
        "cookie_path": "cookie.json",
        "redownload_existing_subtitles": redownload,
    });
    std::fs::write(dir.join("config.json"), config.to_string()).expect("write config.json");
}

pub fn write_cookies(dir: &Path, cookies: serde_json::Value) {
    std::fs::write(dir.join("cookie.json"), cookies.to_string()).expect("write cookie.json");
}
