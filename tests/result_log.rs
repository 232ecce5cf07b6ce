use globalist_sweep::{
    report::{Outcome, OutcomeKind, RunSummary, Stage},
    sink::{ResultLog, ResultSink},
};

fn outcome(problem_id: u32, source_ids: Vec<u32>, kind: OutcomeKind) -> Outcome {
    Outcome {
        problem_id,
        source_ids,
        kind,
    }
}

#[test]
fn log_lines_follow_the_tab_separated_format() {
    let cases = [
        (outcome(42, vec![7], OutcomeKind::NoInput), "42\t7\tNO INPUT"),
        (
            outcome(42, vec![7, 9], OutcomeKind::Fail { baseline: 30 }),
            "42\t7,9\t30\tFAIL",
        ),
        (
            outcome(
                42,
                vec![],
                OutcomeKind::Improved {
                    baseline: 30,
                    improved: 18,
                },
            ),
            "42\t\t30\t18",
        ),
        (
            outcome(
                1,
                vec![2],
                OutcomeKind::Error {
                    stage: Stage::Fetch,
                    baseline: None,
                    improved: None,
                },
            ),
            "1\t2\tFETCH ERROR",
        ),
        (
            outcome(
                1,
                vec![2],
                OutcomeKind::Error {
                    stage: Stage::EvaluateImproved,
                    baseline: Some(40),
                    improved: None,
                },
            ),
            "1\t2\t40\tEVAL IMPROVED ERROR",
        ),
    ];
    for (o, line) in cases {
        assert_eq!(o.to_string(), line);
    }
}

#[test]
fn results_are_appended_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("results.log");

    {
        let mut log = ResultLog::open(&path).unwrap();
        log.banner("run").unwrap();
        log.record(&outcome(1, vec![], OutcomeKind::NoInput)).unwrap();
        log.record(&outcome(1, vec![5], OutcomeKind::Fail { baseline: 3 }))
            .unwrap();

        // Readable line by line before the log is closed.
        let partial = std::fs::read_to_string(&path).unwrap();
        assert!(partial.ends_with("1\t5\t3\tFAIL\n"));
    }
    {
        let mut log = ResultLog::open(&path).unwrap();
        log.banner("dryrun").unwrap();
        log.record(&outcome(
            2,
            vec![1],
            OutcomeKind::Improved {
                baseline: 9,
                improved: 4,
            },
        ))
        .unwrap();
    }

    let raw = std::fs::read_to_string(&path).unwrap();
    let results: Vec<&str> = raw.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(results, vec!["1\t\tNO INPUT", "1\t5\t3\tFAIL", "2\t1\t9\t4"]);
    assert_eq!(raw.lines().filter(|l| l.contains("START")).count(), 2);
}

#[test]
fn summary_tallies_each_tag() {
    let mut summary = RunSummary::default();
    summary.tally(&outcome(1, vec![], OutcomeKind::NoInput));
    summary.tally(&outcome(1, vec![], OutcomeKind::Fail { baseline: 1 }));
    summary.tally(&outcome(
        1,
        vec![],
        OutcomeKind::Improved {
            baseline: 5,
            improved: 5,
        },
    ));
    summary.tally(&outcome(
        1,
        vec![],
        OutcomeKind::Improved {
            baseline: 5,
            improved: 2,
        },
    ));
    summary.tally(&outcome(
        1,
        vec![],
        OutcomeKind::Error {
            stage: Stage::Submit,
            baseline: Some(5),
            improved: Some(2),
        },
    ));

    assert_eq!(summary.total, 5);
    assert_eq!(
        (summary.no_input, summary.failed, summary.improved, summary.errors),
        (1, 1, 2, 1)
    );
    assert_eq!(summary.strictly_better, 1);
}
