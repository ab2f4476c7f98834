//! Main CLI application

use crate::cli::init_tracing;
use crate::config::{build_tasks, load_env_file, parse_config_auto, parse_config_file, Config};
use crate::error::{ConfigError, TerraskError};
use crate::runner::{Context, LocalFilesystem, PlanTask, TaskRunner, TerraformCli, Verbosity};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Parsed configuration
    config: Config,
    /// Task file path
    config_path: PathBuf,
    /// Validated task definitions
    tasks: BTreeMap<String, PlanTask>,
}

impl App {
    /// Create a new app from the discovered task file
    pub fn new() -> Result<Self, TerraskError> {
        let (config, config_path) = parse_config_auto()?;
        Self::from_config(config, config_path)
    }

    /// Create app with a specific task file
    pub fn with_config_file(path: PathBuf) -> Result<Self, TerraskError> {
        let config = parse_config_file(&path)?;
        Self::from_config(config, path)
    }

    fn from_config(config: Config, config_path: PathBuf) -> Result<Self, TerraskError> {
        let tasks = build_tasks(&config)?;
        let command = build_command(&config, &tasks);

        Ok(App {
            command,
            config,
            config_path,
            tasks,
        })
    }

    /// Validated task definitions by name
    pub fn tasks(&self) -> &BTreeMap<String, PlanTask> {
        &self.tasks
    }

    /// Run the application with the process arguments
    pub fn run(self) -> Result<(), TerraskError> {
        self.run_from(std::env::args_os())
    }

    /// Run the application with explicit command line arguments
    pub fn run_from<I, T>(mut self, args: I) -> Result<(), TerraskError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().get_matches_from(args);

        let verbosity = get_verbosity(&matches);
        init_tracing(verbosity);

        if let Some(shell) = matches.get_one::<Shell>("completions").copied() {
            let bin_name = self.command.get_name().to_string();
            clap_complete::generate(shell, &mut self.command, bin_name, &mut io::stdout());
            return Ok(());
        }

        let (task_name, task_matches) = match matches.subcommand() {
            Some((name, sub_matches)) => (name.to_string(), sub_matches),
            None => {
                // No task specified, show help
                self.command.print_help()?;
                println!();
                return Ok(());
            }
        };

        let task = self
            .tasks
            .get(&task_name)
            .ok_or_else(|| ConfigError::TaskNotFound(task_name.clone()))?;
        let values = parse_task_args(task, task_matches);

        load_env_file(&self.config_path)?;

        // Relative task paths are taken from the task file's directory
        let mut ctx = Context::new()
            .with_config_path(self.config_path.clone())
            .with_verbosity(verbosity);
        ctx.working_dir = ctx.config_dir();

        let fs = LocalFilesystem::new(ctx.working_dir.clone());
        let tool = self
            .config
            .terraform
            .as_deref()
            .map(TerraformCli::new)
            .unwrap_or_default();

        let mut runner = TaskRunner::new(&self.tasks, &fs, &tool);
        runner.run(&task_name, &values, &mut ctx)?;

        Ok(())
    }
}

/// Build the clap command from configuration
fn build_command(config: &Config, tasks: &BTreeMap<String, PlanTask>) -> Command {
    let mut cmd = Command::new(config.name.clone().unwrap_or_else(|| "terrask".to_string()))
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            config
                .usage
                .clone()
                .unwrap_or_else(|| "Declarative terraform plan tasks".to_string()),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to terrask.yml task file")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print terraform output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .help("Print a shell completion script")
                .value_parser(value_parser!(Shell)),
        );

    for (task_name, task) in tasks {
        let private = config
            .tasks
            .get(task_name)
            .map(|t| t.private)
            .unwrap_or(false);
        if private {
            continue;
        }

        let mut task_cmd = Command::new(task_name.clone()).about(task.description().to_string());

        for arg_name in task.argument_names() {
            task_cmd = task_cmd.arg(
                Arg::new(arg_name.clone())
                    .value_name(arg_name.to_uppercase())
                    .help(format!("Value for {}", arg_name)),
            );
        }

        cmd = cmd.subcommand(task_cmd);
    }

    cmd
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Positional argument values, in declaration order
fn parse_task_args(task: &PlanTask, matches: &ArgMatches) -> Vec<String> {
    task.argument_names()
        .iter()
        .map_while(|name| matches.get_one::<String>(name).cloned())
        .collect()
}

/// Run the CLI application with provided arguments
pub fn run() -> Result<(), TerraskError> {
    // Check if --file flag is provided first
    let args: Vec<String> = std::env::args().collect();
    let file_path = extract_file_arg(&args);

    let app = if let Some(path) = file_path {
        App::with_config_file(path)?
    } else {
        App::new()?
    };

    app.run()
}

/// Extract --file argument before clap parsing
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    args.windows(2)
        .find(|pair| pair[0] == "--file" || pair[0] == "-f")
        .map(|pair| PathBuf::from(&pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const CONFIG: &str = r#"
name: infra
tasks:
  network:plan:
    argument_names: [bucket_name, deployment_identifier]
    configuration_name: network
    source_directory: infra/network
    work_directory: build
  hidden:plan:
    private: true
    configuration_name: hidden
    source_directory: infra/hidden
    work_directory: build
"#;

    fn command() -> (Command, BTreeMap<String, PlanTask>) {
        let config = parse_config(CONFIG).unwrap();
        let tasks = build_tasks(&config).unwrap();
        (build_command(&config, &tasks), tasks)
    }

    #[test]
    fn test_get_verbosity_normal() {
        let (cmd, _) = command();
        let matches = cmd.get_matches_from(vec!["infra"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Normal);
    }

    #[test]
    fn test_get_verbosity_flags() {
        let (cmd, _) = command();
        let matches = cmd.clone().get_matches_from(vec!["infra", "-v"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Verbose);

        let matches = cmd.get_matches_from(vec!["infra", "--silent", "--quiet"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Silent);
    }

    #[test]
    fn test_task_subcommands() {
        let (cmd, _) = command();
        let names: Vec<_> = cmd.get_subcommands().map(|c| c.get_name().to_string()).collect();
        assert_eq!(names, vec!["network:plan"]);

        let network = cmd.find_subcommand("network:plan").unwrap();
        assert_eq!(
            network.get_about().map(|a| a.to_string()),
            Some("Plan network using terraform".to_string())
        );
    }

    #[test]
    fn test_parse_task_args_in_order() {
        let (cmd, tasks) = command();
        let matches = cmd.get_matches_from(vec!["infra", "network:plan", "my-bucket", "staging"]);
        let (_, sub) = matches.subcommand().unwrap();

        let values = parse_task_args(&tasks["network:plan"], sub);
        assert_eq!(values, vec!["my-bucket", "staging"]);
    }

    #[test]
    fn test_parse_task_args_partial() {
        let (cmd, tasks) = command();
        let matches = cmd.get_matches_from(vec!["infra", "network:plan", "my-bucket"]);
        let (_, sub) = matches.subcommand().unwrap();

        let values = parse_task_args(&tasks["network:plan"], sub);
        assert_eq!(values, vec!["my-bucket"]);
    }

    #[test]
    fn test_extract_file_arg() {
        let args = vec![
            "terrask".to_string(),
            "--file".to_string(),
            "infra.yml".to_string(),
        ];
        assert_eq!(extract_file_arg(&args), Some(PathBuf::from("infra.yml")));
    }

    #[test]
    fn test_extract_file_arg_short() {
        let args = vec!["terrask".to_string(), "-f".to_string(), "infra.yml".to_string()];
        assert_eq!(extract_file_arg(&args), Some(PathBuf::from("infra.yml")));
    }

    #[test]
    fn test_extract_file_arg_missing_value() {
        let args = vec!["terrask".to_string(), "--file".to_string()];
        assert_eq!(extract_file_arg(&args), None);
    }
}
