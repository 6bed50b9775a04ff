use clap::Parser;
use jointq::{
    adapters::{MsgPackRepository, TextRepository},
    cli::commands::{
        inspect::{self, InspectArgs},
        train::{TrainArgs, execute, execute_until},
    },
    pipeline::{StopSignal, read_episode_log},
    ports::QTableRepository,
};
use tempfile::tempdir;

fn parse_args<I, T>(args: I) -> TrainArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    TrainArgs::parse_from(args)
}

#[test]
fn fixed_action_run_writes_summary_log_and_table() {
    let tmp = tempdir().unwrap();
    let summary = tmp.path().join("run_overview");
    let log = tmp.path().join("logs").join("episodes.csv");
    let qtable = tmp.path().join("qtable.msgpack");

    let args = parse_args([
        "jointq-train",
        "--episodes",
        "100",
        "--actions",
        "5",
        "--step",
        "0.07853981633974483",
        "--fixed-action",
        "4",
        "--seed",
        "1",
        "--qtable",
        qtable.to_str().unwrap(),
        "--log",
        log.to_str().unwrap(),
        "--summary",
        summary.to_str().unwrap(),
    ]);

    execute(args).expect("training with summary should succeed");

    let expected_path = summary.with_extension("json");
    let contents = std::fs::read_to_string(&expected_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["report"]["outcome"]["kind"], "converged");
    assert_eq!(parsed["report"]["outcome"]["episode"], 5);
    assert_eq!(parsed["metrics"]["episodes"], 5);
    assert_eq!(parsed["config"]["n_actions"], 5);
    assert_eq!(parsed["metadata"]["policy"], "fixed(4)");
    assert_eq!(parsed["metadata"]["backend"], "joint");

    assert_eq!(read_episode_log(&log).unwrap().len(), 5);

    let saved = MsgPackRepository::new().load(&qtable).unwrap();
    assert_eq!((saved.n_states, saved.n_actions), (10, 5));
    assert_eq!(saved.metadata.episodes_trained, Some(5));

    let inspect_args = InspectArgs::parse_from(["jointq-inspect", qtable.to_str().unwrap()]);
    inspect::execute(inspect_args).expect("inspecting a saved table should succeed");

    let out_of_range = InspectArgs::parse_from([
        "jointq-inspect",
        qtable.to_str().unwrap(),
        "--state",
        "10",
    ]);
    assert!(inspect::execute(out_of_range).is_err());
}

#[test]
fn summary_directory_argument_creates_default_file() {
    let tmp = tempdir().unwrap();
    let summary_dir = tmp.path().join("summaries");
    let summary_arg = format!("{}/", summary_dir.display());
    let qtable = tmp.path().join("q_table.txt");

    let args = parse_args([
        "jointq-train",
        "--episodes",
        "3",
        "--target",
        "80",
        "--backend",
        "humanoid",
        "--hold",
        "controlled-only",
        "--qtable",
        qtable.to_str().unwrap(),
        "--summary",
        &summary_arg,
    ]);

    execute(args).expect("training with directory summary should succeed");

    let expected_path = summary_dir.join("training_summary.json");
    let contents = std::fs::read_to_string(&expected_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["report"]["episodes_run"], 3);
    assert_eq!(parsed["metadata"]["hold"], "controlled-only");

    let saved = TextRepository::new().load(&qtable).unwrap();
    assert_eq!(saved.metadata.episodes_trained, Some(3));
}

#[test]
fn config_file_is_used_and_overridden() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("config.json");
    std::fs::write(
        &config_path,
        r#"{ "n_states": 20, "num_episodes": 50, "target_degrees": 85.0 }"#,
    )
    .unwrap();
    let summary = tmp.path().join("summary.json");

    let args = parse_args([
        "jointq-train",
        "--config",
        config_path.to_str().unwrap(),
        "--episodes",
        "2",
        "--summary",
        summary.to_str().unwrap(),
    ]);
    execute(args).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(parsed["config"]["n_states"], 20);
    assert_eq!(parsed["config"]["num_episodes"], 2);
    assert_eq!(parsed["report"]["outcome"]["kind"], "exhausted");
}

#[test]
fn out_of_range_fixed_action_is_rejected() {
    let args = parse_args(["jointq-train", "--fixed-action", "3"]);
    assert!(execute(args).is_err());
}

#[test]
fn raised_stop_signal_ends_training_cleanly() {
    let tmp = tempdir().unwrap();
    let summary = tmp.path().join("stopped.json");
    let log = tmp.path().join("episodes.csv");

    let args = parse_args([
        "jointq-train",
        "--episodes",
        "50",
        "--seed",
        "4",
        "--log",
        log.to_str().unwrap(),
        "--summary",
        summary.to_str().unwrap(),
    ]);

    let stop = StopSignal::new();
    stop.raise();
    execute_until(args, stop).expect("a stopped run still succeeds");

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(parsed["report"]["outcome"]["kind"], "stopped");
    assert_eq!(parsed["report"]["outcome"]["episodes"], 0);
    assert!(read_episode_log(&log).unwrap().is_empty());
}
