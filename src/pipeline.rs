//! Pipeline controller — steps a fixed list of stages one at a time.
//!
//! Each stage's output becomes the next stage's input. Only the latest
//! buffer is kept. Between steps the controller waits for the user through
//! the [`ViewPort`], so a run looks like:
//!
//! ```text
//! AwaitingStart(i) ──ack──▶ Running(i) ──ok──▶ AwaitingAck(i) ──ack──▶ Advancing(i)
//!        ▲                      │                                         │
//!        └──────────── i+1 < N ─┼─────────────────────────────────────────┤
//!                               └──err──▶ Done ◀──────────── i+1 == N ────┘
//! ```
//!
//! A failed stage is shown, acknowledged once, and ends the run. Nothing is
//! retried and later stages are never attempted.

use tracing::{debug, info, warn};

use pipeview_config::PipelineConfig;

use crate::buffer::Buffer;
use crate::executor::{ExecutionError, StageExecutor};
use crate::lines::{self, AllocationError, LineSet};
use crate::stage::Stage;
use crate::view::{ViewError, ViewPort};

/// Why a step could not complete. Fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage ran. `final_output` is the last stage's output.
    Completed { stages: usize, final_output: Buffer },
    /// Stopped at `step` (1-based).
    Halted {
        step: usize,
        label: String,
        error: StepError,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Process exit code: 0 when every stage ran, 1 when the run halted.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed { .. } => 0,
            RunOutcome::Halted { .. } => 1,
        }
    }

    /// One-line description for the terminal after the TUI closes.
    pub fn summary(&self) -> String {
        match self {
            RunOutcome::Completed { stages, .. } => {
                format!("pipeline completed: {stages} of {stages} stages ran")
            }
            RunOutcome::Halted { step, label, error } => {
                format!("pipeline halted at stage {step} ({label}): {error}")
            }
        }
    }
}

/// Controller phases. `usize` is the 0-based stage index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingStart(usize),
    Running(usize),
    AwaitingAck(usize),
    Advancing(usize),
    Done,
}

/// Mutable run state, owned by the controller for one run.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub current_stage_index: usize,
    pub last_output: Buffer,
}

impl PipelineState {
    fn new(seed: Buffer) -> Self {
        Self {
            current_stage_index: 0,
            last_output: seed,
        }
    }
}

/// An immutable, ordered stage list.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, starting from `seed`.
    ///
    /// Returns `Err` only when the view itself fails; a failing stage is a
    /// normal [`RunOutcome::Halted`].
    pub async fn run<E, V>(
        &self,
        seed: Buffer,
        executor: &mut E,
        view: &mut V,
    ) -> Result<RunOutcome, ViewError>
    where
        E: StageExecutor + ?Sized,
        V: ViewPort + ?Sized,
    {
        let total = self.stages.len();
        let mut state = PipelineState::new(seed);
        let mut phase = Phase::AwaitingStart(0);
        let mut halted: Option<(usize, StepError)> = None;

        info!(stages = total, seed_bytes = state.last_output.len(), "pipeline started");

        loop {
            debug!(?phase, "pipeline phase");
            phase = match phase {
                Phase::AwaitingStart(i) if i >= total => Phase::Done,
                Phase::AwaitingStart(i) => {
                    let stage = &self.stages[i];
                    view.show_stage(i + 1, total, &stage.label, &stage.command)?;
                    view.await_ack().await?;
                    Phase::Running(i)
                }
                Phase::Running(i) => {
                    let stage = &self.stages[i];
                    match step(stage, &mut state, executor).await {
                        Ok(lines) => {
                            view.show_output(i + 1, &lines)?;
                            Phase::AwaitingAck(i)
                        }
                        Err(error) => {
                            warn!(step = i + 1, stage = %stage.label, %error, "stage failed, halting");
                            view.show_error(&format!(
                                "Stage {} ({}) failed: {error}",
                                i + 1,
                                stage.label
                            ))?;
                            view.await_ack().await?;
                            halted = Some((i, error));
                            Phase::Done
                        }
                    }
                }
                Phase::AwaitingAck(i) => {
                    view.await_ack().await?;
                    Phase::Advancing(i)
                }
                Phase::Advancing(i) => {
                    state.current_stage_index = i + 1;
                    if i + 1 < total {
                        Phase::AwaitingStart(i + 1)
                    } else {
                        Phase::Done
                    }
                }
                Phase::Done => break,
            };
        }

        let outcome = match halted {
            Some((i, error)) => RunOutcome::Halted {
                step: i + 1,
                label: self.stages[i].label.clone(),
                error,
            },
            None => RunOutcome::Completed {
                stages: state.current_stage_index,
                final_output: state.last_output,
            },
        };
        info!(completed = outcome.is_completed(), "pipeline finished");
        Ok(outcome)
    }
}

/// Execute one stage on the current buffer and split its output.
async fn step<E>(
    stage: &Stage,
    state: &mut PipelineState,
    executor: &mut E,
) -> Result<LineSet, StepError>
where
    E: StageExecutor + ?Sized,
{
    info!(step = stage.index + 1, stage = %stage.label, command = %stage.command, "running stage");
    let input = std::mem::take(&mut state.last_output);
    let output = executor.execute(stage, input).await?;
    let lines = lines::split(&output)?;
    info!(
        step = stage.index + 1,
        bytes = output.len(),
        lines = lines.len(),
        "stage finished"
    );
    state.last_output = output;
    Ok(lines)
}

/// Builder for [`Pipeline`]. Stage order is insertion order.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from every stage in a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            stages: Stage::all_from(config),
        }
    }

    /// Append a stage.
    pub fn stage(mut self, label: &str, command: &str) -> Self {
        let index = self.stages.len();
        self.stages.push(Stage::new(index, label, command));
        self
    }

    /// Build the pipeline. A pipeline needs at least one stage.
    pub fn build(self) -> Result<Pipeline, String> {
        if self.stages.is_empty() {
            return Err("pipeline needs at least one stage".into());
        }
        Ok(Pipeline {
            stages: self.stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::executor::ShellExecutor;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Stage {
            step: usize,
            total: usize,
            label: String,
            command: String,
        },
        Output {
            step: usize,
            lines: Vec<String>,
        },
        Error(String),
        Ack,
    }

    #[derive(Default)]
    struct RecordingView {
        events: Vec<Event>,
    }

    impl RecordingView {
        fn outputs(&self) -> Vec<(usize, Vec<String>)> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Output { step, lines } => Some((*step, lines.clone())),
                    _ => None,
                })
                .collect()
        }

        fn acks(&self) -> usize {
            self.events.iter().filter(|e| **e == Event::Ack).count()
        }
    }

    #[async_trait]
    impl ViewPort for RecordingView {
        fn show_stage(
            &mut self,
            step: usize,
            total: usize,
            label: &str,
            command: &str,
        ) -> Result<(), ViewError> {
            self.events.push(Event::Stage {
                step,
                total,
                label: label.into(),
                command: command.into(),
            });
            Ok(())
        }

        fn show_output(&mut self, step: usize, lines: &LineSet) -> Result<(), ViewError> {
            self.events.push(Event::Output {
                step,
                lines: lines.as_slice().to_vec(),
            });
            Ok(())
        }

        fn show_error(&mut self, message: &str) -> Result<(), ViewError> {
            self.events.push(Event::Error(message.into()));
            Ok(())
        }

        async fn await_ack(&mut self) -> Result<(), ViewError> {
            self.events.push(Event::Ack);
            Ok(())
        }
    }

    /// Wraps a real executor and records every input it is handed.
    struct Recording<E> {
        inner: E,
        inputs: Vec<(usize, Vec<u8>)>,
        outputs: Vec<Vec<u8>>,
    }

    impl<E> Recording<E> {
        fn new(inner: E) -> Self {
            Self {
                inner,
                inputs: Vec::new(),
                outputs: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl<E: StageExecutor> StageExecutor for Recording<E> {
        async fn execute(
            &mut self,
            stage: &Stage,
            input: Buffer,
        ) -> Result<Buffer, ExecutionError> {
            self.inputs.push((stage.index, input.as_bytes().to_vec()));
            let out = self.inner.execute(stage, input).await?;
            self.outputs.push(out.as_bytes().to_vec());
            Ok(out)
        }
    }

    /// Fails every stage with a fixed error.
    struct Failing(ExecutionError);

    #[async_trait]
    impl StageExecutor for Failing {
        async fn execute(&mut self, _: &Stage, _: Buffer) -> Result<Buffer, ExecutionError> {
            Err(self.0)
        }
    }

    fn seed(text: &str) -> Buffer {
        Buffer::seed(text, 1024)
    }

    #[tokio::test]
    async fn output_feeds_next_stage() {
        let pipeline = PipelineBuilder::new()
            .stage("first", "cat")
            .stage("second", "cat")
            .build()
            .unwrap();
        let mut exec = Recording::new(ShellExecutor::new(1024));
        let mut view = RecordingView::default();

        let outcome = pipeline.run(seed("x\n"), &mut exec, &mut view).await.unwrap();

        assert_eq!(exec.inputs[0], (0, b"x\n".to_vec()));
        assert_eq!(exec.inputs[1].1, exec.outputs[0]);
        assert_eq!(
            outcome,
            RunOutcome::Completed {
                stages: 2,
                final_output: seed("x\n"),
            }
        );
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn view_sees_stage_then_output_with_acks_between() {
        let pipeline = PipelineBuilder::new()
            .stage("Sort", "sort")
            .build()
            .unwrap();
        let mut exec = ShellExecutor::new(1024);
        let mut view = RecordingView::default();

        pipeline.run(seed("b\na\n"), &mut exec, &mut view).await.unwrap();

        assert_eq!(
            view.events,
            vec![
                Event::Stage {
                    step: 1,
                    total: 1,
                    label: "Sort".into(),
                    command: "sort".into(),
                },
                Event::Ack,
                Event::Output {
                    step: 1,
                    lines: vec!["a".into(), "b".into()],
                },
                Event::Ack,
            ]
        );
    }

    #[tokio::test]
    async fn spawn_failure_halts_before_later_stages() {
        let pipeline = PipelineBuilder::new()
            .stage("ok", "cat")
            .stage("broken", "pipeview-no-such-program")
            .stage("never", "sort")
            .build()
            .unwrap();
        let mut exec = Recording::new(ShellExecutor::new(1024));
        let mut view = RecordingView::default();

        let outcome = pipeline.run(seed("x\n"), &mut exec, &mut view).await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Halted {
                step: 2,
                label: "broken".into(),
                error: StepError::Execution(ExecutionError::Spawn),
            }
        );
        assert_eq!(outcome.exit_code(), 1);
        let attempted: Vec<usize> = exec.inputs.iter().map(|(i, _)| *i).collect();
        assert_eq!(attempted, [0, 1]);

        let stages_shown = view
            .events
            .iter()
            .filter(|e| matches!(e, Event::Stage { .. }))
            .count();
        assert_eq!(stages_shown, 2);
        assert_eq!(
            view.events[view.events.len() - 2],
            Event::Error("Stage 2 (broken) failed: Error executing command".into())
        );
        assert_eq!(view.events.last(), Some(&Event::Ack));
    }

    #[tokio::test]
    async fn staging_failure_halts_at_first_stage() {
        let pipeline = PipelineBuilder::new()
            .stage("one", "cat")
            .stage("two", "cat")
            .build()
            .unwrap();
        let mut exec = Failing(ExecutionError::StagingWrite);
        let mut view = RecordingView::default();

        let outcome = pipeline.run(seed("x\n"), &mut exec, &mut view).await.unwrap();

        assert!(!outcome.is_completed());
        assert_eq!(
            outcome.summary(),
            "pipeline halted at stage 1 (one): Error writing stage input"
        );
        assert!(view.outputs().is_empty());
        assert_eq!(view.acks(), 2);
    }

    #[tokio::test]
    async fn empty_output_is_not_a_failure() {
        let pipeline = PipelineBuilder::new()
            .stage("filter", "grep zzz")
            .stage("pass", "cat")
            .build()
            .unwrap();
        let mut exec = ShellExecutor::new(1024);
        let mut view = RecordingView::default();

        let outcome = pipeline.run(seed("a\nb\n"), &mut exec, &mut view).await.unwrap();

        assert!(outcome.is_completed());
        assert_eq!(view.outputs(), vec![(1, vec![]), (2, vec![])]);
        assert_eq!(view.acks(), 4);
    }

    /// filter → sort → count, done directly in Rust.
    fn expected_counts(seed: &str, needle: &str) -> Vec<(usize, String)> {
        let mut kept: Vec<&str> = seed.lines().filter(|l| l.contains(needle)).collect();
        kept.sort_unstable();
        let mut counts: Vec<(usize, String)> = Vec::new();
        for line in kept {
            match counts.last_mut() {
                Some((n, last)) if last == line => *n += 1,
                _ => counts.push((1, line.to_string())),
            }
        }
        counts
    }

    fn parse_counts(lines: &[String]) -> Vec<(usize, String)> {
        lines
            .iter()
            .map(|l| {
                let (n, rest) = l.trim_start().split_once(' ').unwrap();
                (n.parse().unwrap(), rest.to_string())
            })
            .collect()
    }

    async fn run_triage(seed_text: &str) -> (RunOutcome, RecordingView) {
        let pipeline = PipelineBuilder::new()
            .stage("identity", "cat")
            .stage("errors", "grep error")
            .stage("sort", "sort")
            .stage("count", "uniq -c")
            .build()
            .unwrap();
        let mut exec = ShellExecutor::new(1024);
        let mut view = RecordingView::default();
        let outcome = pipeline
            .run(seed(seed_text), &mut exec, &mut view)
            .await
            .unwrap();
        (outcome, view)
    }

    #[tokio::test]
    async fn log_triage_end_to_end() {
        let seed_text = "info: ok\nerror: bad\ninfo: done\nerror: disk full\nwarning: low\n";
        let (outcome, view) = run_triage(seed_text).await;

        assert!(outcome.is_completed());
        let outputs = view.outputs();
        assert_eq!(outputs.len(), 4);
        assert_eq!(outputs[1].1, ["error: bad", "error: disk full"]);
        assert_eq!(
            parse_counts(&outputs[3].1),
            expected_counts(seed_text, "error")
        );
    }

    #[tokio::test]
    async fn log_triage_counts_duplicates() {
        let seed_text = "error: disk full\ninfo: ok\nerror: bad\nerror: disk full\n";
        let (_, view) = run_triage(seed_text).await;

        let last = &view.outputs()[3].1;
        assert_eq!(
            parse_counts(last),
            vec![(1, "error: bad".into()), (2, "error: disk full".into())]
        );
    }

    #[tokio::test]
    async fn staging_file_pipeline_runs_and_cleans_up() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sample.txt");
        let pipeline = PipelineBuilder::from_config(&PipelineConfig::default())
            .build()
            .unwrap();
        {
            let mut exec = ShellExecutor::with_staging_file(1024, &path);
            let mut view = RecordingView::default();
            let outcome = pipeline
                .run(
                    seed(pipeview_config::DEFAULT_SEED),
                    &mut exec,
                    &mut view,
                )
                .await
                .unwrap();
            assert!(outcome.is_completed());
            assert!(path.exists());
            assert_eq!(view.outputs()[3].1.len(), 2);
        }
        assert!(!path.exists());
    }

    #[test]
    fn builder_rejects_empty_pipeline() {
        assert!(PipelineBuilder::new().build().is_err());
    }

    #[test]
    fn builder_from_config_keeps_order() {
        let pipeline = PipelineBuilder::from_config(&PipelineConfig::default())
            .stage("Top", "head -n 1")
            .build()
            .unwrap();
        let labels: Vec<&str> = pipeline.stages().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Read input", "Keep errors", "Sort lines", "Count duplicates", "Top"]
        );
        assert_eq!(pipeline.stages()[4].index, 4);
        assert_eq!(pipeline.len(), 5);
        assert!(!pipeline.is_empty());
    }

    #[test]
    fn completed_summary() {
        let outcome = RunOutcome::Completed {
            stages: 3,
            final_output: Buffer::new(),
        };
        assert_eq!(outcome.summary(), "pipeline completed: 3 of 3 stages ran");
    }
}
