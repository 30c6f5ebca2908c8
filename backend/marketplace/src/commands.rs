//! `aptos move run` invocations for manual contract interaction.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::Result;
use crate::listing::Project;
use crate::payload::MarketFunction;

pub const MAX_GAS: u64 = 5000;

/// Typed positional argument as the Aptos CLI expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliArg {
    Str(String),
    U64(u64),
}

impl CliArg {
    pub fn str(value: &str) -> Self {
        Self::Str(value.to_string())
    }

    fn render(&self) -> String {
        match self {
            Self::Str(s) => shell_quote(&format!("string:{s}")),
            Self::U64(n) => format!("u64:{n}"),
        }
    }
}

/// Single-quote `s` for bash. Nothing inside is expanded; an embedded `'`
/// closes the quote, emits an escaped quote and reopens.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Render one `aptos move run` command, continuation-broken like a shell script.
pub fn move_run(address: &str, function: MarketFunction, args: &[CliArg]) -> String {
    let mut cmd = format!(
        "aptos move run \\\n  --function-id {}",
        function.function_id(address)
    );
    if !args.is_empty() {
        let rendered: Vec<String> = args.iter().map(CliArg::render).collect();
        let _ = write!(cmd, " \\\n  --args {}", rendered.join(" "));
    }
    let _ = write!(cmd, " \\\n  --max-gas={MAX_GAS}");
    cmd
}

pub fn initialize_marketplace(address: &str) -> String {
    move_run(address, MarketFunction::Initialize, &[])
}

pub fn create_project(address: &str, project: &Project) -> String {
    move_run(
        address,
        MarketFunction::CreateProject,
        &[
            CliArg::str(&project.id),
            CliArg::str(&project.title),
            CliArg::str(&project.location),
            CliArg::str(&project.description),
            CliArg::str(project.category.as_str()),
            CliArg::U64(project.credits_available),
            CliArg::U64(project.price),
        ],
    )
}

/// `purchase_credits` / `retire_credits` for `credits` units at `price`.
pub fn trade_credits(
    address: &str,
    function: MarketFunction,
    project_id: &str,
    credits: u64,
    price: u64,
) -> String {
    move_run(
        address,
        function,
        &[
            CliArg::str(project_id),
            CliArg::U64(credits),
            CliArg::U64(price),
        ],
    )
}

/// `RF-2023-089` → `RF_2023_089`, as used in script file names.
pub fn script_stem(project_id: &str) -> String {
    project_id.replace('-', "_")
}

/// Write the marketplace bootstrap scripts into `dir`:
/// `init_marketplace.sh`, one `create_<ID>.sh` per project and an
/// `initialize_all.sh` runner. Returns the paths written.
pub fn write_init_scripts(dir: &Path, projects: &[Project], address: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(projects.len() + 2);

    let init = dir.join("init_marketplace.sh");
    write_script(&init, &initialize_marketplace(address))?;
    written.push(init);

    let mut runner = String::from("#!/bin/bash\n\n# Initialize marketplace\n./init_marketplace.sh\n");
    for project in projects {
        let name = format!("create_{}.sh", script_stem(&project.id));
        let path = dir.join(&name);
        write_script(&path, &create_project(address, project))?;
        info!("Generated command to create project: {} ({})", project.title, project.id);
        let _ = writeln!(runner, "./{name}");
        written.push(path);
    }

    let all = dir.join("initialize_all.sh");
    fs::write(&all, runner)?;
    make_executable(&all)?;
    written.push(all);

    Ok(written)
}

fn write_script(path: &Path, command: &str) -> Result<()> {
    fs::write(path, format!("#!/bin/bash\n\n{command}\n"))?;
    make_executable(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::fixture_projects;

    const ADDR: &str = "0xda14";

    #[test]
    fn initialize_has_no_args() {
        assert_eq!(
            initialize_marketplace(ADDR),
            "aptos move run \\\n  --function-id 0xda14::marketplace::initialize \\\n  --max-gas=5000"
        );
    }

    #[test]
    fn purchase_command() {
        let cmd = trade_credits(ADDR, MarketFunction::PurchaseCredits, "RF-2023-089", 1, 1845);
        assert!(cmd.contains("--function-id 0xda14::marketplace::purchase_credits"));
        assert!(cmd.contains("--args 'string:RF-2023-089' u64:1 u64:1845"));
        assert!(cmd.ends_with("--max-gas=5000"));
    }

    #[test]
    fn create_project_quotes_text_fields() {
        let mut project = fixture_projects().remove(0);
        project.title = "Farmer's \"Big\" Forest".to_string();
        let cmd = create_project(ADDR, &project);
        assert!(cmd.contains("0xda14::verification::create_project"));
        assert!(cmd.contains(r#"'string:Farmer'\''s "Big" Forest'"#));
        assert!(cmd.contains("'string:reforestation' u64:12450 u64:1845"));
    }

    #[cfg(unix)]
    #[test]
    fn generated_script_passes_text_verbatim() {
        use std::process::Command;

        let title = "Cost $HOME `echo injected` $(id) it's \"done\" \\n";
        let mut project = fixture_projects().remove(0);
        project.title = title.to_string();

        let dir = tempfile::tempdir().unwrap();
        write_init_scripts(dir.path(), &[project], ADDR).unwrap();
        let script = dir.path().join("create_RF_2023_089.sh");

        // Stand-in for the Aptos CLI that prints one argument per line.
        let output = Command::new("bash")
            .arg("-c")
            .arg("aptos() { printf '%s\\n' \"$@\"; }; source \"$1\"")
            .arg("bash")
            .arg(&script)
            .output()
            .unwrap();
        assert!(output.status.success());

        let argv: Vec<String> = String::from_utf8(output.stdout)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(argv[0], "move");
        assert_eq!(argv[1], "run");
        assert_eq!(argv[3], "0xda14::verification::create_project");
        assert_eq!(argv[5], "string:RF-2023-089");
        assert_eq!(argv[6], format!("string:{title}"));
        assert_eq!(argv.last().unwrap(), "--max-gas=5000");
    }

    #[test]
    fn writes_scripts_and_runner() {
        let dir = tempfile::tempdir().unwrap();
        let projects = fixture_projects();
        let written = write_init_scripts(dir.path(), &projects, ADDR).unwrap();
        assert_eq!(written.len(), projects.len() + 2);

        let runner = fs::read_to_string(dir.path().join("initialize_all.sh")).unwrap();
        assert!(runner.starts_with("#!/bin/bash"));
        assert!(runner.contains("./init_marketplace.sh\n./create_RF_2023_089.sh\n"));
        assert!(runner.trim_end().ends_with("./create_WE_2023_092.sh"));

        let create = fs::read_to_string(dir.path().join("create_SE_2023_142.sh")).unwrap();
        assert!(create.contains("'string:SE-2023-142'"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.path().join("initialize_all.sh"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }
}
