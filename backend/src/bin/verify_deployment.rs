//! Check that a checkout carries everything a Railway deployment needs.
//!
//! Exits non-zero when any check fails.

use std::path::PathBuf;
use std::process::ExitCode;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use clap::Parser;

/// Files the container build and the platform configuration rely on.
const REQUIRED_FILES: &[&str] = &[
    "Cargo.toml",
    "Dockerfile",
    "Procfile",
    "railway.json",
    ".railwayignore",
    "env.example",
    "src/main.rs",
    "src/bin/migrate.rs",
];

/// Variables `env.example` must document.
const REQUIRED_VARIABLES: &[&str] = &[
    "DATABASE_URL",
    "REDIS_URL",
    "JWT_SECRET_KEY",
    "DEBUG",
    "BACKEND_CORS_ORIGINS",
];

#[derive(Debug, Parser)]
#[command(name = "verify-deployment", about = "Check deployment files are present")]
struct Cli {
    /// Backend directory to inspect.
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Check {
    name: String,
    passed: bool,
    detail: Option<String>,
}

impl Check {
    fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: None,
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

fn check_files(root: &Dir) -> Vec<Check> {
    REQUIRED_FILES
        .iter()
        .map(|file| {
            if root.is_file(file) {
                Check::pass(format!("{file} exists"))
            } else {
                Check::fail(format!("{file} exists"), "missing")
            }
        })
        .collect()
}

/// A variable counts as documented when a line assigns it, commented or not.
fn documents(contents: &str, variable: &str) -> bool {
    contents.lines().any(|line| {
        let line = line.trim_start().trim_start_matches('#').trim_start();
        line.strip_prefix(variable)
            .is_some_and(|rest| rest.trim_start().starts_with('='))
    })
}

fn check_env_example(root: &Dir) -> Vec<Check> {
    let Ok(contents) = root.read_to_string("env.example") else {
        return vec![Check::fail("env.example readable", "cannot read env.example")];
    };
    REQUIRED_VARIABLES
        .iter()
        .map(|variable| {
            let name = format!("env.example documents {variable}");
            if documents(&contents, variable) {
                Check::pass(name)
            } else {
                Check::fail(name, "not listed")
            }
        })
        .collect()
}

fn run_checks(root: &Dir) -> Vec<Check> {
    let mut checks = check_files(root);
    checks.extend(check_env_example(root));
    checks
}

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let root = Dir::open_ambient_dir(&cli.root, ambient_authority())?;

    let checks = run_checks(&root);
    for check in &checks {
        match (check.passed, &check.detail) {
            (true, _) => println!("ok    {}", check.name),
            (false, Some(detail)) => println!("FAIL  {} ({detail})", check.name),
            (false, None) => println!("FAIL  {}", check.name),
        }
    }
    let passed = checks.iter().filter(|check| check.passed).count();
    println!("{passed}/{} checks passed", checks.len());

    if passed == checks.len() {
        println!("Deployment configuration looks complete.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Fix the failing checks before deploying.");
        Ok(ExitCode::FAILURE)
    }
}
