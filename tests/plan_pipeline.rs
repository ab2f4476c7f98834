//! Integration tests for the plan pipeline: resolve, stage, init, plan

mod common;

use common::{write_file, Call, Recorder};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use terrask::config::{build_tasks, parse_config};
use terrask::error::{ResolutionError, StagingError, TerraskError, ToolError};
use terrask::runner::{
    resolve, Context, LocalFilesystem, Param, Parameter, PlanParameters, PlanTask,
    PlanTaskOptions, RuntimeArgs, TaskRunner, Vars, Verbosity,
};

fn ctx() -> Context {
    Context::new()
        .with_working_dir(PathBuf::from("/project"))
        .with_verbosity(Verbosity::Silent)
}

fn network() -> PlanTaskOptions {
    PlanTaskOptions {
        configuration_name: "network".into(),
        source_directory: "infra/network".into(),
        work_directory: "build".into(),
        ..Default::default()
    }
}

fn vars(pairs: &[(&str, &str)]) -> Vars {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_path_composition() {
    let recorder = Recorder::new();
    let mut ctx = ctx();

    PlanTask::define(network())
        .unwrap()
        .invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder)
        .unwrap();

    let staged = PathBuf::from("/project/build/infra/network");
    let calls = recorder.calls();
    assert_eq!(calls[0], Call::Clean(PathBuf::from("build/infra/network")));
    assert_eq!(calls[1], Call::MakeDirectories(PathBuf::from("build/infra")));
    assert_eq!(
        calls[2],
        Call::Copy(
            PathBuf::from("infra/network"),
            PathBuf::from("build/infra/network")
        )
    );
    assert!(matches!(&calls[3], Call::Init(dir, _) if *dir == staged));
    assert!(matches!(&calls[4], Call::Plan(dir, _) if *dir == staged));
    assert_eq!(calls.len(), 5);
}

#[test]
fn test_flag_omission() {
    let recorder = Recorder::new();
    let mut ctx = ctx();

    PlanTask::define(network())
        .unwrap()
        .invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder)
        .unwrap();

    let init = recorder.init_flags().unwrap();
    assert_eq!(init.backend_config, None);
    assert_eq!(init.args(), vec!["init"]);

    let plan = recorder.plan_flags().unwrap();
    assert_eq!(plan.var_file, None);
    assert_eq!(plan.state, None);
    assert_eq!(plan.plan, None);
    assert!(plan.vars.is_empty());
    assert_eq!(plan.args(), vec!["plan"]);
}

#[test]
fn test_destroy_is_a_plan_flag() {
    let recorder = Recorder::new();
    let mut ctx = ctx();

    let task = PlanTask::define(PlanTaskOptions {
        destroy: true.into(),
        ..network()
    })
    .unwrap();
    task.invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder)
        .unwrap();

    let plan = recorder.plan_flags().unwrap();
    assert!(plan.destroy);
    assert_eq!(plan.args(), vec!["plan", "-destroy"]);
    assert_eq!(
        recorder
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Plan(..)))
            .count(),
        1
    );
}

#[test]
fn test_no_color_default_and_set() {
    let recorder = Recorder::new();
    let mut ctx = ctx();
    PlanTask::define(network())
        .unwrap()
        .invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder)
        .unwrap();
    assert!(!recorder.init_flags().unwrap().no_color);
    assert!(!recorder.plan_flags().unwrap().no_color);

    let recorder = Recorder::new();
    let task = PlanTask::define(PlanTaskOptions {
        no_color: true.into(),
        ..network()
    })
    .unwrap();
    task.invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder)
        .unwrap();
    assert!(recorder.init_flags().unwrap().no_color);
    assert!(recorder.plan_flags().unwrap().no_color);
}

#[test]
fn test_factory_ordering_with_closures() {
    let task = PlanTask::configure(|t| {
        t.argument_names = vec![
            "bucket_name".to_string(),
            "deployment_identifier".to_string(),
        ];
        t.configuration_name = "network".into();
        t.source_directory = "infra/network".into();
        t.work_directory = "build".into();
        t.backend_config = Param::factory(|args, resolved| {
            let mut backend = Vars::new();
            backend.insert("bucket".to_string(), args.require("bucket_name")?.to_string());
            backend.insert(
                "key".to_string(),
                format!("{}.tfstate", resolved.configuration_name().unwrap_or_default()),
            );
            backend.insert("region".to_string(), "eu-west-2".to_string());
            Ok(backend)
        });
        t.vars = Param::factory(|args, resolved| {
            let mut vars = Vars::new();
            vars.insert(
                "deployment_identifier".to_string(),
                args.require("deployment_identifier")?.to_string(),
            );
            vars.insert(
                "configuration_name".to_string(),
                resolved.configuration_name().unwrap_or_default().to_string(),
            );
            vars.insert(
                "state_bucket".to_string(),
                resolved.lookup("backend_config.bucket").unwrap_or_default(),
            );
            Ok(vars)
        });
    })
    .unwrap();

    let args = task.bind_args(&["bucket-from-args", "staging"]);
    let invocation = task.resolve(&args).unwrap();

    assert_eq!(
        invocation.backend_config,
        Some(vars(&[
            ("bucket", "bucket-from-args"),
            ("key", "network.tfstate"),
            ("region", "eu-west-2"),
        ]))
    );
    assert_eq!(
        invocation.vars,
        vars(&[
            ("configuration_name", "network"),
            ("deployment_identifier", "staging"),
            ("state_bucket", "bucket-from-args"),
        ])
    );
}

#[test]
fn test_factory_ordering_from_task_file() {
    let yaml = r#"
tasks:
  network:plan:
    argument_names: [bucket_name, deployment_identifier]
    configuration_name: network
    source_directory: infra/network
    work_directory: build
    backend_config:
      bucket: "${args.bucket_name}"
      key: "${configuration_name}.tfstate"
      region: eu-west-2
    vars:
      deployment_identifier: "${args.deployment_identifier}"
      configuration_name: "${configuration_name}"
      state_bucket: "${backend_config.bucket}"
"#;
    let tasks = build_tasks(&parse_config(yaml).unwrap()).unwrap();
    let task = &tasks["network:plan"];

    let recorder = Recorder::new();
    let mut ctx = ctx();
    let args = task.bind_args(&["bucket-from-args", "staging"]);
    task.invoke(&args, &mut ctx, &recorder, &recorder).unwrap();

    let init = recorder.init_flags().unwrap();
    assert_eq!(
        init.args(),
        vec![
            "init",
            "-backend-config=bucket=bucket-from-args",
            "-backend-config=key=network.tfstate",
            "-backend-config=region=eu-west-2",
        ]
    );

    let plan = recorder.plan_flags().unwrap();
    assert_eq!(
        plan.vars,
        vars(&[
            ("configuration_name", "network"),
            ("deployment_identifier", "staging"),
            ("state_bucket", "bucket-from-args"),
        ])
    );
}

#[test]
fn test_missing_required_field_before_any_side_effect() {
    let mut parameters = PlanParameters::schema();
    parameters.configuration_name =
        Parameter::<String>::required("configuration_name").assign("network".into());
    parameters.work_directory =
        Parameter::<PathBuf>::required("work_directory").assign("build".into());

    let result = resolve(&parameters, &RuntimeArgs::new());
    assert!(matches!(
        result,
        Err(ResolutionError::MissingRequiredParameter(ref name)) if name == "source_directory"
    ));
}

#[test]
fn test_resolution_failure_touches_nothing() {
    let task = PlanTask::define(PlanTaskOptions {
        argument_names: vec!["component".to_string()],
        source_directory: Param::factory(|args, _| {
            Ok(PathBuf::from("infra").join(args.require("component")?))
        }),
        ..network()
    })
    .unwrap();

    let recorder = Recorder::new();
    let mut ctx = ctx();
    let result = task.invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder);

    assert!(matches!(result, Err(TerraskError::Resolution(_))));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_staging_failure_short_circuits() {
    let recorder = Recorder {
        fail_copy: true,
        ..Default::default()
    };
    let mut ctx = ctx();

    let result = PlanTask::define(network())
        .unwrap()
        .invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder);

    assert!(matches!(result, Err(TerraskError::Staging(_))));
    assert!(recorder.touched_filesystem());
    assert!(!recorder.ran_terraform());
    assert_eq!(ctx.working_dir, PathBuf::from("/project"));
}

#[test]
fn test_context_restored_after_failed_init() {
    let recorder = Recorder {
        fail_init: true,
        ..Default::default()
    };
    let mut ctx = ctx();

    let result = PlanTask::define(network())
        .unwrap()
        .invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder);

    assert!(matches!(
        result,
        Err(TerraskError::Tool(ToolError::Failed { .. }))
    ));
    assert!(recorder.plan_flags().is_none());
    assert_eq!(ctx.working_dir, PathBuf::from("/project"));
}

#[test]
fn test_definition_reusable_across_invocations() {
    let task = PlanTask::define(PlanTaskOptions {
        argument_names: vec!["deployment_identifier".to_string()],
        vars: Param::factory(|args, _| {
            let mut vars = Vars::new();
            vars.insert(
                "deployment_identifier".to_string(),
                args.require("deployment_identifier")?.to_string(),
            );
            Ok(vars)
        }),
        ..network()
    })
    .unwrap();

    let staging = task.resolve(&task.bind_args(&["staging"])).unwrap();
    let production = task.resolve(&task.bind_args(&["production"])).unwrap();

    assert_eq!(staging.vars["deployment_identifier"], "staging");
    assert_eq!(production.vars["deployment_identifier"], "production");
}

#[test]
fn test_staging_on_disk_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "infra/network/main.tf", "resource \"null_resource\" \"a\" {}\n");
    write_file(root, "infra/network/modules/vpc.tf", "# vpc\n");

    let fs_impl = LocalFilesystem::new(root);
    let recorder = Recorder::new();
    let task = PlanTask::define(network()).unwrap();

    let mut ctx = Context::new()
        .with_working_dir(root.to_path_buf())
        .with_verbosity(Verbosity::Silent);
    task.invoke(&RuntimeArgs::new(), &mut ctx, &fs_impl, &recorder)
        .unwrap();

    // Leftovers from an earlier, differently shaped tree must go
    write_file(root, "build/infra/network/stale.tf", "# stale\n");
    task.invoke(&RuntimeArgs::new(), &mut ctx, &fs_impl, &recorder)
        .unwrap();

    let staged = root.join("build/infra/network");
    assert!(staged.join("main.tf").is_file());
    assert!(staged.join("modules/vpc.tf").is_file());
    assert!(!staged.join("stale.tf").exists());
    assert_eq!(
        fs::read_to_string(staged.join("modules/vpc.tf")).unwrap(),
        "# vpc\n"
    );

    let init_dirs: Vec<_> = recorder
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Init(dir, _) => Some(dir),
            _ => None,
        })
        .collect();
    assert_eq!(init_dirs, vec![staged.clone(), staged]);
    assert_eq!(ctx.working_dir, root.to_path_buf());
}

#[test]
fn test_runner_runs_prerequisites_in_order() {
    let yaml = r#"
tasks:
  network:plan:
    configuration_name: network
    source_directory: infra/network
    work_directory: build
  database:plan:
    prerequisites: [terraform:ensure, network:plan]
    configuration_name: database
    source_directory: infra/database
    work_directory: build
"#;
    let tasks: BTreeMap<String, PlanTask> = build_tasks(&parse_config(yaml).unwrap()).unwrap();

    let recorder = Recorder::new();
    let mut ctx = ctx();
    let mut runner = TaskRunner::new(&tasks, &recorder, &recorder);
    runner.run::<&str>("database:plan", &[], &mut ctx).unwrap();

    let plans: Vec<_> = recorder
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Ensure => Some(PathBuf::from("ensure")),
            Call::Plan(dir, _) => Some(dir),
            _ => None,
        })
        .collect();
    assert_eq!(
        plans,
        vec![
            PathBuf::from("ensure"),
            Path::new("/project/build/infra/network").to_path_buf(),
            Path::new("/project/build/infra/database").to_path_buf(),
        ]
    );
}

#[test]
fn test_work_directory_inside_source_rejected() {
    let task = PlanTask::define(PlanTaskOptions {
        source_directory: "infra".into(),
        work_directory: "infra/build".into(),
        ..network()
    })
    .unwrap();

    let recorder = Recorder::new();
    let mut ctx = ctx();
    let result = task.invoke(&RuntimeArgs::new(), &mut ctx, &recorder, &recorder);

    assert!(matches!(
        result,
        Err(TerraskError::Staging(StagingError::CopyIntoItself { .. }))
    ));
    assert!(recorder.calls().is_empty());
    assert_eq!(ctx.working_dir, PathBuf::from("/project"));
}

#[test]
fn test_work_directory_inside_source_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "infra/network/main.tf", "# network\n");

    let task = PlanTask::define(PlanTaskOptions {
        source_directory: "infra".into(),
        work_directory: "infra/build".into(),
        ..network()
    })
    .unwrap();

    let fs_impl = LocalFilesystem::new(root);
    let recorder = Recorder::new();
    let mut ctx = Context::new()
        .with_working_dir(root.to_path_buf())
        .with_verbosity(Verbosity::Silent);
    let result = task.invoke(&RuntimeArgs::new(), &mut ctx, &fs_impl, &recorder);

    assert!(matches!(result, Err(TerraskError::Staging(_))));
    assert!(!root.join("infra/build").exists());
    assert!(!recorder.ran_terraform());
}

#[test]
fn test_private_task_runs_as_prerequisite() {
    let yaml = r#"
tasks:
  shared:plan:
    private: true
    configuration_name: shared
    source_directory: infra/shared
    work_directory: build
  network:plan:
    prerequisites: [shared:plan]
    configuration_name: network
    source_directory: infra/network
    work_directory: build
"#;
    let tasks: BTreeMap<String, PlanTask> = build_tasks(&parse_config(yaml).unwrap()).unwrap();

    let recorder = Recorder::new();
    let mut ctx = ctx();
    let mut runner = TaskRunner::new(&tasks, &recorder, &recorder);
    runner.run::<&str>("network:plan", &[], &mut ctx).unwrap();

    let plans: Vec<_> = recorder
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Plan(dir, _) => Some(dir),
            _ => None,
        })
        .collect();
    assert_eq!(
        plans,
        vec![
            PathBuf::from("/project/build/infra/shared"),
            PathBuf::from("/project/build/infra/network"),
        ]
    );
}
