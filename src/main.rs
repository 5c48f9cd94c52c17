mod error;

use crate::error::{ErrorKind, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use ctrlrepo_config::Config;
use ctrlrepo_library::{Overrides, Session};
use ctrlrepo_models::Version;
use ctrlrepo_package::ParsedPackage;
use ctrlrepo_repository::Repository;
use exn::{OptionExt, ResultExt};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ctrlrepo", version, about = "Ingest controller packages into a controller repository")]
struct Cli {
    /// Repository root; overrides the configuration.
    #[arg(long, global = true)]
    repo: Option<PathBuf>,
    /// Configuration file to use instead of the default one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase logging (-vvv reaches trace)")]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a package and describe it without touching the repository.
    Inspect { archive: PathBuf },
    /// Decode a package and merge it into the repository.
    Apply {
        archive: PathBuf,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Show a controller's version record and latest layout.
    Show { id: String },
    /// List the index in display order.
    List,
    /// List the categories.
    Categories {
        /// Label locale; defaults to the configured locale.
        #[arg(long)]
        locale: Option<String>,
    },
}

#[derive(Args, Debug)]
struct OverrideArgs {
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long = "intro")]
    introduction: Option<String>,
    /// Replace the package's categories; repeatable.
    #[arg(long = "category")]
    categories: Vec<i64>,
}
impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            categories: (!args.categories.is_empty()).then(|| args.categories.into_iter().collect::<BTreeSet<_>>()),
            author: args.author.unwrap_or_default(),
            description: args.description.unwrap_or_default(),
            name: args.name.unwrap_or_default(),
            introduction: args.introduction.unwrap_or_default(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber =
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut figment = Config::figment(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(repo) = &cli.repo {
        figment = figment.merge(("repository", repo));
    }
    Config::from_figment(&figment).or_raise(|| ErrorKind::Config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!(?config, "loaded configuration");
    match cli.command {
        Command::Inspect { archive } => inspect(&config, &archive),
        Command::Apply { archive, overrides } => apply(&config, &archive, overrides.into()),
        Command::Show { id } => show(&open_repository(&config)?, &id),
        Command::List => list(&open_repository(&config)?),
        Command::Categories { locale } => {
            let locale = locale.unwrap_or_else(|| config.locale.clone());
            for category in open_repository(&config)?.categories() {
                println!("{}\t{}", category.id, category.label(&locale).unwrap_or("-"));
            }
            Ok(())
        },
    }
}

fn repository_root(config: &Config) -> Result<&Path> {
    config.repository.as_deref().ok_or_raise(|| ErrorKind::NoRepository)
}

fn open_repository(config: &Config) -> Result<Repository> {
    Repository::open(repository_root(config)?).or_raise(|| ErrorKind::Repository)
}

fn session(config: &Config) -> Session {
    match &config.scratch_dir {
        Some(dir) => Session::new().with_scratch_parent(dir),
        None => Session::new(),
    }
}

fn inspect(config: &Config, archive: &Path) -> Result<()> {
    let mut session = session(config);
    // Update status is only known against a repository.
    if let Some(root) = &config.repository {
        session.open_repository(root).or_raise(|| ErrorKind::Repository)?;
    }
    let package = session.select_package(archive).or_raise(|| ErrorKind::Package)?;
    print_package(package, config.repository.is_some());
    session.close().or_raise(|| ErrorKind::Package)
}

fn apply(config: &Config, archive: &Path, overrides: Overrides) -> Result<()> {
    let mut session = session(config);
    session.open_repository(repository_root(config)?).or_raise(|| ErrorKind::Repository)?;
    session.select_package(archive).or_raise(|| ErrorKind::Package)?;
    let applied = session.apply_update(&overrides).or_raise(|| ErrorKind::Apply)?;
    println!("applied {} at {}", applied.controller_id, applied.version.latest);
    if let Some(index) = applied.index {
        println!("index entry: {index}");
    }
    println!("screenshots: {}", applied.version.screenshot);
    session.close().or_raise(|| ErrorKind::Package)
}

fn list(repository: &Repository) -> Result<()> {
    for entry in repository.index() {
        let categories: Vec<_> = entry.categories.iter().map(i64::to_string).collect();
        println!("{}\t{}\t[{}]", entry.id, entry.name, categories.join(", "));
    }
    for id in repository.controller_ids_on_disk().or_raise(|| ErrorKind::Repository)? {
        if repository.find(&id).is_none() {
            println!("{id}\t(not indexed)");
        }
    }
    Ok(())
}

fn show(repository: &Repository, id: &str) -> Result<()> {
    let details = repository.load_controller_details(id).or_raise(|| ErrorKind::Repository)?;
    println!("id:          {}", details.id);
    if let Some(entry) = &details.entry {
        println!("name:        {}", entry.name);
    }
    println!("latest:      {}", details.version.latest);
    println!("history:     {}", join_versions(&details.version.history));
    println!("author:      {}", details.version.author);
    println!("screenshots: {}", details.screenshots.len());
    match &details.layout {
        Some(layout) => {
            println!("layout:      {} {} ({} controls)", layout.name, layout.version, layout.control_count());
        },
        None => println!("layout:      -"),
    }
    Ok(())
}

fn print_package(package: &ParsedPackage, with_repository: bool) {
    println!("id:           {}", package.controller_id);
    println!("version code: {}", package.resolved_version_code());
    if let Some(version) = &package.version_info {
        println!("latest:       {}", version.latest);
        println!("history:      {}", join_versions(&version.history));
    }
    if let Some(layout) = &package.layout {
        println!("layout:       {} {} ({} controls)", layout.name, layout.version, layout.control_count());
    }
    if let Some(entry) = &package.index_entry {
        println!("name:         {}", entry.name);
    }
    println!("icon:         {}", if package.icon.is_some() { "yes" } else { "no" });
    println!("screenshots:  {}", package.screenshots.len());
    if let Some(digest) = &package.digest {
        println!("digest:       {digest}");
    }
    for skipped in &package.skipped {
        println!("skipped:      {}", skipped.display());
    }
    if with_repository {
        println!("update:       {}", if package.is_update { "yes" } else { "no" });
    }
}

fn join_versions(versions: &[Version]) -> String {
    match versions.is_empty() {
        true => "-".into(),
        false => versions.iter().map(Version::to_string).collect::<Vec<_>>().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    /// Empty environment, with the platform configuration directory inside
    /// the jail.
    fn isolate(jail: &mut Jail) -> PathBuf {
        let dir = jail.directory().to_path_buf();
        jail.clear_env();
        jail.set_env("HOME", dir.display());
        jail.set_env("XDG_CONFIG_HOME", dir.join("cfg").display());
        dir
    }

    #[test]
    fn test_repo_flag_without_config_file() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let cli = Cli::parse_from(["ctrlrepo", "list", "--repo", "/srv/controllers"]);
            let config = load_config(&cli).unwrap();
            assert_eq!(config.repository, Some(PathBuf::from("/srv/controllers")));
            assert_eq!(config.locale, "en");
            Ok(())
        });
    }

    #[test]
    fn test_repo_flag_overrides_config_file() {
        Jail::expect_with(|jail| {
            let dir = isolate(jail);
            jail.create_file("ctrlrepo.toml", "repository = \"/srv/from-file\"\nlocale = \"de\"")?;
            let file = dir.join("ctrlrepo.toml").display().to_string();

            let config = load_config(&Cli::parse_from(["ctrlrepo", "--config", &file, "categories"])).unwrap();
            assert_eq!(config.repository, Some(PathBuf::from("/srv/from-file")));
            assert_eq!(config.locale, "de");

            let cli = Cli::parse_from(["ctrlrepo", "--config", &file, "--repo", "/srv/from-flag", "list"]);
            assert_eq!(load_config(&cli).unwrap().repository, Some(PathBuf::from("/srv/from-flag")));
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let err = load_config(&Cli::parse_from(["ctrlrepo", "--config", "nope.toml", "list"])).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Config));
            Ok(())
        });
    }

    #[test]
    fn test_commands_need_a_repository() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let err = run(Cli::parse_from(["ctrlrepo", "list"])).unwrap_err();
            assert!(matches!(&*err, ErrorKind::NoRepository));
            Ok(())
        });
    }

    #[test]
    fn test_override_flags() {
        let cli = Cli::parse_from([
            "ctrlrepo", "apply", "pkg.zip", "--category", "3", "--category", "1", "--intro", "Hello", "--author", "me",
        ]);
        let Command::Apply { archive, overrides } = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(archive, PathBuf::from("pkg.zip"));
        let overrides = Overrides::from(overrides);
        assert_eq!(overrides.categories, Some(BTreeSet::from([1, 3])));
        assert_eq!(overrides.introduction, "Hello");
        assert_eq!(overrides.author, "me");
        assert!(overrides.name.is_empty());

        let Command::Apply { overrides, .. } = Cli::parse_from(["ctrlrepo", "apply", "pkg.zip"]).command else {
            panic!("expected apply");
        };
        assert!(Overrides::from(overrides).categories.is_none());
    }
}
