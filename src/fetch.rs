use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Read, Write as _};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use flate2::read::MultiGzDecoder;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::ACCEPT_ENCODING;

use crate::formats::{Config, Outcome, Subsection, Summary};

const CHUNK_SIZE: usize = 4096;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

static TRANSCRIPT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/course.*transcript/download").expect("transcript pattern is a valid regex")
});

/// `<dir>/<title>.txt`, with path separators in the title replaced.
pub fn target_path(dir: &Path, title: &str) -> PathBuf {
    let file_name = title
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | '\0' => '_',
            ch => ch,
        })
        .collect::<String>();
    dir.join(format!("{file_name}.txt"))
}

/// First `/course...transcript/download` path in a subsection page.
pub fn find_transcript_path(html: &str) -> Option<&str> {
    TRANSCRIPT_PATH.find(html).map(|m| m.as_str())
}

pub fn download_all(
    client: &reqwest::blocking::Client,
    config: &Config,
    dir: &Path,
    subsections: &[Subsection],
) -> anyhow::Result<Summary> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create download dir: {}", dir.display()))?;

    let mut summary = Summary::default();
    for subsection in subsections {
        println!("{}", subsection.title);

        let outcome = download_subtitle(client, config, dir, subsection)
            .with_context(|| format!("download subtitle for {:?}", subsection.title))?;
        match &outcome {
            Outcome::SkippedExisting => {
                tracing::debug!(title = %subsection.title, "subtitle already downloaded");
            }
            Outcome::NoTranscript => {
                tracing::info!(title = %subsection.title, "no transcript available");
            }
            Outcome::Written { path, bytes } => {
                tracing::info!(path = %path.display(), bytes, "wrote subtitle");
            }
        }
        summary.record(&outcome);
    }

    tracing::info!(
        written = summary.written,
        skipped_existing = summary.skipped_existing,
        no_transcript = summary.no_transcript,
        "download finished"
    );
    Ok(summary)
}

pub fn download_subtitle(
    client: &reqwest::blocking::Client,
    config: &Config,
    dir: &Path,
    subsection: &Subsection,
) -> anyhow::Result<Outcome> {
    let path = target_path(dir, &subsection.title);
    if path.exists() && !config.redownload_existing_subtitles {
        return Ok(Outcome::SkippedExisting);
    }

    let page_url = format!("{}{}", config.root_url, subsection.url);
    let response = client
        .get(&page_url)
        .send()
        .with_context(|| format!("GET {page_url}"))?
        .error_for_status()
        .with_context(|| format!("GET {page_url}"))?;
    let page = crate::session::read_text(response)
        .with_context(|| format!("read subsection page: {page_url}"))?;

    let Some(transcript_path) = find_transcript_path(&page) else {
        return Ok(Outcome::NoTranscript);
    };
    let transcript_url = format!("{}{transcript_path}", config.root_url);
    tracing::debug!(url = %transcript_url, "fetching transcript");

    // Only the transcript download asks for compression.
    let response = client
        .get(&transcript_url)
        .header(ACCEPT_ENCODING, "gzip")
        .send()
        .with_context(|| format!("GET {transcript_url}"))?;
    if response.status() != StatusCode::OK {
        anyhow::bail!(
            "GET {transcript_url}: unexpected status {}",
            response.status()
        );
    }

    let bytes = write_transcript(response, &path)?;
    Ok(Outcome::Written { path, bytes })
}

fn write_transcript(response: reqwest::blocking::Response, path: &Path) -> anyhow::Result<u64> {
    if crate::session::is_gzip_encoded(response.headers()) {
        let mut decoder = MultiGzDecoder::new(response);
        let mut writer = create_target(path)?;
        let written = copy_in_chunks(&mut decoder, &mut writer)
            .with_context(|| format!("write gzip-encoded transcript: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flush transcript: {}", path.display()))?;
        return Ok(written);
    }

    let body = response.bytes().context("read transcript body")?;
    let plain = decode_body(&body)?;
    let mut writer = create_target(path)?;
    writer
        .write_all(&plain)
        .with_context(|| format!("write transcript: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush transcript: {}", path.display()))?;
    Ok(plain.len() as u64)
}

/// Gzip payloads that the transport did not decode are unpacked in memory;
/// anything else is already plain text.
pub fn decode_body(body: &[u8]) -> anyhow::Result<Cow<'_, [u8]>> {
    if !body.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(body));
    }

    let mut plain = Vec::new();
    MultiGzDecoder::new(body)
        .read_to_end(&mut plain)
        .context("decompress gzip transcript")?;
    Ok(Cow::Owned(plain))
}

fn create_target(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("create transcript: {}", path.display()))?;
    Ok(BufWriter::with_capacity(CHUNK_SIZE, file))
}

fn copy_in_chunks(
    reader: &mut impl Read,
    writer: &mut impl std::io::Write,
) -> std::io::Result<u64> {
    let mut chunk = [0_u8; CHUNK_SIZE];
    let mut total = 0_u64;
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        writer.write_all(&chunk[..read])?;
        total += read as u64;
    }
}
