use anyhow::Context;
use clap::{Parser, Subcommand};
use fs_err as fs;
use std::process::Command as ProcessCommand;

const FIXTURES_DIR: &str = "tests/fixtures";

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the report schema and settings table version.
    PrintSchemas,
    /// Scaffold tests/fixtures/<name>/before/ for a new golden case.
    NewFixture {
        name: String,
        /// Descriptor to copy in as the `before` state.
        #[arg(long)]
        from: Option<String>,
    },
    /// Bless golden fixtures (overwrite expected outputs).
    BlessFixtures,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintSchemas => {
            println!("{}", pbxpatch_types::schema::PBXPATCH_REPORT_V1);
            println!(
                "settings-table v{}",
                pbxpatch_domain::SETTINGS_TABLE_VERSION
            );
        }
        Command::NewFixture { name, from } => {
            let before = format!("{FIXTURES_DIR}/{name}/before");
            fs::create_dir_all(&before).with_context(|| format!("create {before}"))?;
            if let Some(src) = from {
                fs::copy(&src, format!("{before}/project.pbxproj"))
                    .with_context(|| format!("copy {src}"))?;
            }
            println!("initialized {before}; run `cargo xtask bless-fixtures` to record expected output");
        }
        Command::BlessFixtures => {
            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "pbxpatch-domain", "--test", "golden_fixtures"])
                .env("PBXPATCH_BLESS", "1")
                .status()
                .context("run golden fixture blessing")?;
            if !status.success() {
                anyhow::bail!("bless-fixtures failed");
            }
        }
    }
    Ok(())
}
