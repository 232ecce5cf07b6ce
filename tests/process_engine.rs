use globalist_sweep::{
    config::Config,
    engine::{
        Evaluator, ImproveRequest, LocalSearchSolver, SolverStatus,
        process::{ProcessEvaluator, ProcessSolver, parse_dislikes, solver_args},
    },
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

fn sh(script: &str) -> Vec<String> {
    vec!["sh".into(), "-c".into(), script.into(), "sh".into()]
}

fn request(dir: &Path, globalist: Vec<u32>) -> ImproveRequest {
    ImproveRequest {
        glucose_path: PathBuf::from("/opt/glucose"),
        problem_path: PathBuf::from("problems/42.json"),
        solution_path: PathBuf::from("best_solutions/42_7.json"),
        work_dir: dir.join("rsapg").join("42_7"),
        max_neighbor: 15,
        globalist,
    }
}

#[test]
fn dislikes_is_read_from_evaluator_json() {
    assert_eq!(
        parse_dislikes(br#"{"dislikes": 30, "bonuses": [], "valid": true}"#).unwrap(),
        30
    );
    assert!(parse_dislikes(b"thread 'main' panicked").is_err());
    assert!(parse_dislikes(br#"{"score": 3}"#).is_err());
}

#[test]
fn solver_flags_match_the_hill_climber_cli() {
    let dir = tempfile::tempdir().unwrap();
    let args = solver_args(&request(dir.path(), vec![7, 12]));
    let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();

    assert_eq!(args[pos("--max-neighbor") + 1], OsString::from("15"));
    assert_eq!(args[pos("--globalist") + 1], OsString::from("7,12"));
    assert_eq!(
        args[pos("--output-path") + 1],
        OsString::from("best_solutions/42_7.json")
    );

    let empty = solver_args(&request(dir.path(), vec![]));
    assert!(!empty.iter().any(|a| a == "--globalist"));
}

#[cfg(unix)]
#[test]
fn evaluator_process_reports_dislikes_and_failures() {
    let mut cfg = Config::default();
    cfg.solver.evaluate_cmd = sh(r#"test -n "$2" && echo '{"dislikes": 12}'"#);
    let ok = ProcessEvaluator::new(&cfg).unwrap();
    assert_eq!(
        ok.evaluate(Path::new("problems/1.json"), Path::new("sol.json"))
            .unwrap(),
        12
    );

    cfg.solver.evaluate_cmd = sh("echo boom >&2; exit 3");
    let failing = ProcessEvaluator::new(&cfg).unwrap();
    let err = failing
        .evaluate(Path::new("problems/1.json"), Path::new("sol.json"))
        .unwrap_err();
    assert!(format!("{err:#}").contains("boom"));
}

#[cfg(unix)]
#[test]
fn solver_exit_code_maps_to_status() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();

    cfg.solver.hillclimber_cmd = sh("exit 0");
    let req = request(dir.path(), vec![7]);
    let status = ProcessSolver::new(&cfg).unwrap().improve(&req).unwrap();
    assert_eq!(status, SolverStatus::Succeeded);
    assert!(req.work_dir.is_dir());

    cfg.solver.hillclimber_cmd = sh("exit 4");
    let status = ProcessSolver::new(&cfg).unwrap().improve(&req).unwrap();
    assert_eq!(status, SolverStatus::Failed { code: Some(4) });
}

#[test]
fn empty_command_lines_are_rejected() {
    let mut cfg = Config::default();
    cfg.solver.evaluate_cmd = Vec::new();
    assert!(ProcessEvaluator::new(&cfg).is_err());

    cfg = Config::default();
    cfg.solver.hillclimber_cmd = vec!["  ".into()];
    assert!(ProcessSolver::new(&cfg).is_err());
}
