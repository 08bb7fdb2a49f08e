use anyhow::Result;
use clap::Parser;
use pydist::archive::ArchiveFormat;
use pydist::commands::{self, BuildOptions};
use std::path::PathBuf;

/// pydist - package descriptor build tool
///
/// Resolve the package descriptor (pydist.json) of a project and build a
/// distributable source archive carrying the resolved metadata.
///
/// Examples:
///   pydist build             # Build dist/<name>-<version>.tar.gz
///   pydist -C path check     # Validate the descriptor of another project
#[derive(Parser, Debug)]
#[command(author, version = env!("PYDIST_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory containing pydist.json (defaults to the current directory)
    #[arg(long = "project-dir", short = 'C', value_name = "PATH", global = true)]
    pub project_dir: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Build a distributable archive from the package descriptor
    Build(BuildArgs),

    /// Resolve and validate the descriptor without building
    Check,

    /// Print the resolved package metadata as JSON
    Show,
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Output directory for the artifact (defaults to <project>/dist)
    #[arg(long = "out-dir", short = 'o', value_name = "PATH")]
    pub out_dir: Option<PathBuf>,

    /// Archive format
    #[arg(long, value_enum, default_value_t = ArchiveFormat::Sdist)]
    pub format: ArchiveFormat,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = pydist::runtime::RealRuntime;

    match cli.command {
        Commands::Build(args) => {
            let artifact = commands::build(
                &runtime,
                BuildOptions {
                    project_dir: cli.project_dir,
                    out_dir: args.out_dir,
                    format: args.format,
                },
            )?;
            println!("{}", artifact.display());
        }
        Commands::Check => {
            let resolved = commands::check(&runtime, cli.project_dir)?;
            println!(
                "ok: {} {} ({} package(s))",
                resolved.metadata.name,
                resolved.metadata.version,
                resolved.metadata.packages.len()
            );
        }
        Commands::Show => {
            println!("{}", commands::show(&runtime, cli.project_dir)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_build_parsing() {
        let cli = Cli::try_parse_from(["pydist", "build"]).unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.out_dir, None);
                assert_eq!(args.format, ArchiveFormat::Sdist);
            }
            _ => panic!("Expected Build command"),
        }
        assert_eq!(cli.project_dir, None);
    }

    #[test]
    fn test_cli_build_format_parsing() {
        let cli = Cli::try_parse_from(["pydist", "build", "--format", "zip"]).unwrap();
        match cli.command {
            Commands::Build(args) => assert_eq!(args.format, ArchiveFormat::Zip),
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_out_dir_parsing() {
        let cli = Cli::try_parse_from(["pydist", "build", "--out-dir", "/tmp/dist"]).unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.out_dir, Some(PathBuf::from("/tmp/dist")));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_global_project_dir_parsing() {
        let cli = Cli::try_parse_from(["pydist", "-C", "/proj", "check"]).unwrap();
        assert_eq!(cli.project_dir, Some(PathBuf::from("/proj")));

        let cli = Cli::try_parse_from(["pydist", "show", "--project-dir", "/proj"]).unwrap();
        assert_eq!(cli.project_dir, Some(PathBuf::from("/proj")));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["pydist"]).is_err());
    }

    #[test]
    fn test_cli_bad_format_fails() {
        assert!(Cli::try_parse_from(["pydist", "build", "--format", "tarball"]).is_err());
    }
}
