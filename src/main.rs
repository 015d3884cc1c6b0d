use anyhow::Result;
use clap::Parser;
use pkgsource::commands;
use pkgsource::config::ROOT_ENV;
use pkgsource::package::LATEST_VERSION;
use std::path::PathBuf;

/// pkgsource - install packages from package indexes
///
/// Load a JSON package index as a source, then install packages from it
/// together with their dependencies into the project's Packages directory.
///
/// If the PKGSOURCE_TOKEN environment variable is set, it is sent as a bearer
/// token with every HTTP request.
///
/// Examples:
///   pkgsource load ./index.json              # Load and persist a source
///   pkgsource install ./index.json Foo       # Install the latest Foo
///   pkgsource install ./index.json Foo 1.0.0 # Install a specific version
#[derive(Parser, Debug)]
#[command(author, version = env!("PKGSOURCE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory (defaults to the current directory; also via PKGSOURCE_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = ROOT_ENV,
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Load a package index and persist it as a source
    Load(LoadArgs),

    /// Install a package and its dependencies from a package index
    Install(InstallArgs),

    /// List loaded sources by source group
    Sources,

    /// List installed packages
    List,
}

#[derive(clap::Args, Debug)]
pub struct LoadArgs {
    /// Path or http(s) URL of the index
    #[arg(value_name = "INDEX")]
    pub index: String,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Path or http(s) URL of the index
    #[arg(value_name = "INDEX")]
    pub index: String,

    /// Package name or dependency id
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    /// Version to install
    #[arg(value_name = "VERSION", default_value = LATEST_VERSION)]
    pub version: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = pkgsource::runtime::RealRuntime;

    match cli.command {
        Commands::Load(args) => commands::load(runtime, &args.index, cli.root).await?,
        Commands::Install(args) => {
            commands::install(runtime, &args.index, &args.package, &args.version, cli.root)
                .await?
        }
        Commands::Sources => commands::sources(runtime, cli.root)?,
        Commands::List => commands::list(runtime, cli.root)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_install_parsing() {
        let cli = Cli::try_parse_from(["pkgsource", "install", "index.json", "Foo"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.index, "index.json");
                assert_eq!(args.package, "Foo");
                assert_eq!(args.version, "latest");
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_install_version_parsing() {
        let cli =
            Cli::try_parse_from(["pkgsource", "install", "index.json", "Foo", "1.0.0"]).unwrap();
        match cli.command {
            Commands::Install(args) => assert_eq!(args.version, "1.0.0"),
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_load_parsing() {
        let cli = Cli::try_parse_from(["pkgsource", "load", "https://example.com/index.json"])
            .unwrap();
        match cli.command {
            Commands::Load(args) => assert_eq!(args.index, "https://example.com/index.json"),
            _ => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_cli_global_root_parsing() {
        let cli = Cli::try_parse_from(["pkgsource", "--root", "/tmp", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
        assert_eq!(cli.root, Some(PathBuf::from("/tmp")));

        let cli = Cli::try_parse_from(["pkgsource", "sources", "-r", "/srv"]).unwrap();
        assert!(matches!(cli.command, Commands::Sources));
        assert_eq!(cli.root, Some(PathBuf::from("/srv")));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["pkgsource", "index.json"]).is_err());
        assert!(Cli::try_parse_from(["pkgsource", "install", "index.json"]).is_err());
    }
}
