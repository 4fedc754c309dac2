use anyhow::Context;
use bitar::areas::repository::Repository;
use bitar::artifacts::branch::branch_name::BranchName;
use bitar::artifacts::objects::commit::parse_timezone;
use bitar::artifacts::objects::encoding::TextEncoding;
use bitar::artifacts::revision::identity::Identity;
use bitar::artifacts::revision::revision_builder::{DEFAULT_MESSAGE, RevisionMetadata};
use bitar::artifacts::sources::source_spec::SourceSpec;
use bitar::commands::porcelain::import::ImportOptions;
use bitar::errors::ImportError;
use bitar::logging::init_logging;
use chrono::{DateTime, FixedOffset, Local, TimeZone};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status of a run that lost the race for the branch (`EX_TEMPFAIL`)
const EXIT_REF_CONFLICT: u8 = 75;

#[derive(Parser)]
#[command(
    name = "bitar",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Commit files, zip and tar archives onto a git branch",
    long_about = "This is the inverse of git archive: the given sources are snapshotted into \
    a single tree, which is committed onto a branch without touching any working tree. \
    Running it again against the same branch chains the new commit onto the previous one.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[arg(
        required = true,
        value_name = "SCHEME:PATH[:KEY=VALUE...]",
        value_parser = SourceSpec::try_parse,
        help = "Sources to add. Valid schemes are file:, tar: and zip:; \
        include=, exclude= (globs) and rinclude=, rexclude= (regular expressions) filter paths"
    )]
    sources: Vec<SourceSpec>,
    #[arg(short, long, default_value = ".", help = "The path to the git repository")]
    repo: PathBuf,
    #[arg(
        short,
        long,
        value_parser = parse_branch,
        help = "The branch to commit to, created if missing. Defaults to the branch of HEAD"
    )]
    branch: Option<BranchName>,
    #[arg(
        long,
        value_parser = Identity::try_parse,
        help = "Author as 'Name <email>'. Defaults to the git configuration"
    )]
    author: Option<Identity>,
    #[arg(long, help = "Author time as a UNIX timestamp. Defaults to now")]
    author_time: Option<i64>,
    #[arg(
        long,
        value_parser = parse_timezone,
        allow_hyphen_values = true,
        help = "Author timezone as +HHMM or -HHMM. Defaults to the local timezone"
    )]
    author_timezone: Option<FixedOffset>,
    #[arg(
        long,
        value_parser = Identity::try_parse,
        help = "Committer as 'Name <email>'. Defaults to the git configuration"
    )]
    committer: Option<Identity>,
    #[arg(long, help = "Commit time as a UNIX timestamp. Defaults to now")]
    commit_time: Option<i64>,
    #[arg(
        long,
        value_parser = parse_timezone,
        allow_hyphen_values = true,
        help = "Committer timezone as +HHMM or -HHMM. Defaults to the local timezone"
    )]
    commit_timezone: Option<FixedOffset>,
    #[arg(short, long, default_value = DEFAULT_MESSAGE, help = "The commit message")]
    message: String,
    #[arg(
        long,
        default_value = "UTF-8",
        value_parser = TextEncoding::try_parse,
        help = "Encoding of the commit message, identities and file names"
    )]
    encoding: TextEncoding,
}

fn parse_branch(name: &str) -> anyhow::Result<BranchName> {
    BranchName::try_parse(name.to_string())
}

fn timestamp(
    seconds: Option<i64>,
    offset: Option<FixedOffset>,
    now: DateTime<Local>,
) -> anyhow::Result<DateTime<FixedOffset>> {
    let offset = offset.unwrap_or_else(|| *now.offset());
    let seconds = seconds.unwrap_or_else(|| now.timestamp());

    offset
        .timestamp_opt(seconds, 0)
        .single()
        .with_context(|| format!("timestamp {seconds} is out of range"))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let now = Local::now();
    let metadata = RevisionMetadata::new(
        cli.author,
        timestamp(cli.author_time, cli.author_timezone, now)?,
        cli.committer,
        timestamp(cli.commit_time, cli.commit_timezone, now)?,
        cli.message,
        cli.encoding,
    );

    let repository = Repository::open(&cli.repo, Box::new(std::io::stdout()))?;
    repository.import(ImportOptions::new(cli.sources, cli.branch, metadata))?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging() {
        eprintln!("warning: logging disabled: {err:#}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");

            let is_conflict = err
                .downcast_ref::<ImportError>()
                .is_some_and(ImportError::is_ref_conflict);
            if is_conflict {
                ExitCode::from(EXIT_REF_CONFLICT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
