use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use course_subtitles::config::StartupError;

fn main() -> ExitCode {
    let cli = course_subtitles::cli::Cli::parse();

    if let Err(err) = try_main(cli) {
        if let Some(startup) = err.downcast_ref::<StartupError>() {
            eprintln!("error: {startup}");
            return ExitCode::from(2);
        }
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main(cli: course_subtitles::cli::Cli) -> anyhow::Result<()> {
    course_subtitles::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    let config_path = PathBuf::from(&cli.config);
    let mut config = course_subtitles::config::load(&config_path)?;
    config.redownload_existing_subtitles |= cli.redownload;

    let cookie_path =
        course_subtitles::config::resolve_cookie_path(&config_path, &config.cookie_path);
    let cookies = course_subtitles::config::load_cookies(&cookie_path)?;

    let client = course_subtitles::session::build_client(&cookies).context("build session")?;
    let subsections =
        course_subtitles::enumerate::fetch_subsections(&client, &config).context("enumerate")?;

    if cli.list {
        for subsection in &subsections {
            println!("{}\t{}", subsection.title, subsection.url);
        }
        return Ok(());
    }

    let out_dir = PathBuf::from(&cli.out);
    course_subtitles::fetch::download_all(&client, &config, &out_dir, &subsections)
        .context("download subtitles")?;
    Ok(())
}
