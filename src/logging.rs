use anyhow::Context as _;

pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default_directives = if verbose {
        "course_subtitles=debug,info"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_directives))
        .context("build log filter")?;

    // stdout carries the progress lines; keep diagnostics on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
