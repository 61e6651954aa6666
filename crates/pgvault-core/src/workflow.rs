//! The workflow-stage contract and pipeline driver.
//!
//! Backup post-processing is extended through an ordered chain of stages.
//! Each stage exposes a setup, an execute, and a teardown phase, and
//! operates on a shared [`JobContext`] carrying the job's server name and
//! backup label. Stages are constructed once at startup and reused across jobs; all
//! per-job state lives in the context.
//!
//! # Phase ordering
//!
//! For each stage, in chain order, the pipeline runs setup, then execute,
//! then teardown. Teardown runs whenever the stage's setup succeeded,
//! regardless of the execute outcome, so partially-created resources are
//! always released. The first setup or execute failure stops the chain:
//! later stages never run, because they must not act on data an earlier
//! stage failed to produce.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::{PgVaultError, PgVaultResult};

/// A typed value stored in the job context.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// A string value.
    String(String),
    /// An integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
}

/// Shared, mutable per-job state passed by reference through one pipeline run.
///
/// Stages never own the context; they borrow it for the duration of a single
/// phase call. Required keys are read through the `require_*` accessors,
/// which fail fast when a key is absent.
#[derive(Debug, Default)]
pub struct JobContext {
    values: HashMap<String, ContextValue>,
}

impl JobContext {
    /// Context key holding the server name.
    pub const SERVER: &'static str = "server";
    /// Context key holding the backup label.
    pub const LABEL: &'static str = "label";

    /// Create a context for one (server, label) job.
    #[must_use]
    pub fn new(server: impl Into<String>, label: impl Into<String>) -> Self {
        let mut ctx = Self::default();
        ctx.insert(Self::SERVER, ContextValue::String(server.into()));
        ctx.insert(Self::LABEL, ContextValue::String(label.into()));
        ctx
    }

    /// Set a value, replacing any previous entry for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) {
        self.values.insert(key.into(), value);
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Whether a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Fetch a required string value, failing fast when absent.
    pub fn require_str(&self, key: &str) -> PgVaultResult<&str> {
        match self.values.get(key) {
            Some(ContextValue::String(s)) => Ok(s),
            Some(_) => Err(PgVaultError::ContextTypeMismatch {
                key: key.to_owned(),
                wanted: "string",
            }),
            None => Err(PgVaultError::MissingContextKey(key.to_owned())),
        }
    }

    /// Fetch a boolean value, defaulting to `false` when absent.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(ContextValue::Bool(true)))
    }

    /// The server name for this job.
    pub fn server(&self) -> PgVaultResult<&str> {
        self.require_str(Self::SERVER)
    }

    /// The backup label for this job.
    pub fn label(&self) -> PgVaultResult<&str> {
        self.require_str(Self::LABEL)
    }
}

/// A unit of backup post-processing, composed into an ordered chain.
///
/// Implementations must be stateless between invocations: repeated execute
/// calls on the same context have the same effect apart from external side
/// effects. Returning an error from setup or execute is the only failure
/// signal that crosses the stage boundary.
#[async_trait]
pub trait WorkflowStage: Send + Sync {
    /// A short identifier used in log records.
    fn name(&self) -> &'static str;

    /// Validate preconditions. No network or disk activity.
    async fn setup(&self, ctx: &mut JobContext) -> PgVaultResult<()>;

    /// Perform the stage's work.
    async fn execute(&self, ctx: &mut JobContext) -> PgVaultResult<()>;

    /// Release resources. Runs whether or not execute succeeded.
    async fn teardown(&self, ctx: &mut JobContext) -> PgVaultResult<()>;
}

/// An ordered chain of workflow stages, driven fresh per job.
///
/// The pipeline holds no state between jobs; stage objects are shared
/// (`Arc`) and reused.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn WorkflowStage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the end of the chain.
    pub fn push(&mut self, stage: Arc<dyn WorkflowStage>) {
        self.stages.push(stage);
    }

    /// Number of stages in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Drive the chain over one job context.
    ///
    /// Runs setup, execute, teardown per stage in chain order. A teardown
    /// failure after a successful execute is propagated; a teardown failure
    /// after a failed execute is logged and the execute error wins.
    pub async fn run(&self, ctx: &mut JobContext) -> PgVaultResult<()> {
        for stage in &self.stages {
            let name = stage.name();

            debug!(stage = name, "stage setup");
            if let Err(e) = stage.setup(ctx).await {
                error!(stage = name, error = %e, "stage setup failed");
                return Err(PgVaultError::StageFailed {
                    stage: name,
                    phase: "setup",
                    source: e.into(),
                });
            }

            debug!(stage = name, "stage execute");
            let executed = stage.execute(ctx).await;
            if let Err(e) = &executed {
                error!(stage = name, error = %e, "stage execute failed");
            }

            // The stage has started, so its teardown always runs.
            debug!(stage = name, "stage teardown");
            let torn_down = stage.teardown(ctx).await;

            match (executed, torn_down) {
                (Ok(()), Ok(())) => {}
                (Ok(()), Err(e)) => {
                    error!(stage = name, error = %e, "stage teardown failed");
                    return Err(PgVaultError::StageFailed {
                        stage: name,
                        phase: "teardown",
                        source: e.into(),
                    });
                }
                (Err(e), torn_down) => {
                    if let Err(td) = torn_down {
                        warn!(stage = name, error = %td, "teardown failed after execute failure");
                    }
                    return Err(PgVaultError::StageFailed {
                        stage: name,
                        phase: "execute",
                        source: e.into(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records phase invocations and optionally fails one phase.
    struct RecordingStage {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_setup: bool,
        fail_execute: bool,
    }

    impl RecordingStage {
        fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                log,
                fail_setup: false,
                fail_execute: false,
            }
        }

        fn record(&self, phase: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{phase}", self.name));
        }
    }

    #[async_trait]
    impl WorkflowStage for RecordingStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn setup(&self, ctx: &mut JobContext) -> PgVaultResult<()> {
            ctx.server()?;
            ctx.label()?;
            self.record("setup");
            if self.fail_setup {
                return Err(anyhow::anyhow!("setup boom").into());
            }
            Ok(())
        }

        async fn execute(&self, _ctx: &mut JobContext) -> PgVaultResult<()> {
            self.record("execute");
            if self.fail_execute {
                return Err(anyhow::anyhow!("execute boom").into());
            }
            Ok(())
        }

        async fn teardown(&self, _ctx: &mut JobContext) -> PgVaultResult<()> {
            self.record("teardown");
            Ok(())
        }
    }

    fn pipeline_of(stages: Vec<RecordingStage>) -> Pipeline {
        let mut pipeline = Pipeline::new();
        for stage in stages {
            pipeline.push(Arc::new(stage));
        }
        pipeline
    }

    #[tokio::test]
    async fn test_should_run_phases_in_chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = pipeline_of(vec![
            RecordingStage::new("a", log.clone()),
            RecordingStage::new("b", log.clone()),
        ]);

        let mut ctx = JobContext::new("primary", "2025-01-01");
        pipeline.run(&mut ctx).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "a:setup",
                "a:execute",
                "a:teardown",
                "b:setup",
                "b:execute",
                "b:teardown"
            ]
        );
    }

    #[tokio::test]
    async fn test_should_run_teardown_when_execute_fails_and_skip_later_stages() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut failing = RecordingStage::new("a", log.clone());
        failing.fail_execute = true;
        let pipeline = pipeline_of(vec![failing, RecordingStage::new("b", log.clone())]);

        let mut ctx = JobContext::new("primary", "2025-01-01");
        let result = pipeline.run(&mut ctx).await;

        assert!(matches!(
            result,
            Err(PgVaultError::StageFailed {
                stage: "a",
                phase: "execute",
                ..
            })
        ));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:setup", "a:execute", "a:teardown"]
        );
    }

    #[tokio::test]
    async fn test_should_not_run_execute_or_teardown_when_setup_fails() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut failing = RecordingStage::new("a", log.clone());
        failing.fail_setup = true;
        let pipeline = pipeline_of(vec![failing]);

        let mut ctx = JobContext::new("primary", "2025-01-01");
        let result = pipeline.run(&mut ctx).await;

        assert!(matches!(
            result,
            Err(PgVaultError::StageFailed {
                phase: "setup",
                ..
            })
        ));
        assert_eq!(*log.lock().unwrap(), vec!["a:setup"]);
    }

    #[tokio::test]
    async fn test_should_fail_fast_on_missing_context_key() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = pipeline_of(vec![RecordingStage::new("a", log.clone())]);

        // Context without the required label key.
        let mut ctx = JobContext::default();
        ctx.insert(
            JobContext::SERVER,
            ContextValue::String("primary".to_owned()),
        );

        let result = pipeline.run(&mut ctx).await;
        assert!(result.is_err());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_should_report_type_mismatch_for_wrong_value_kind() {
        let mut ctx = JobContext::default();
        ctx.insert(JobContext::SERVER, ContextValue::Int(3));

        let result = ctx.server();
        assert!(matches!(
            result,
            Err(PgVaultError::ContextTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_should_default_missing_bool_to_false() {
        let ctx = JobContext::new("primary", "2025-01-01");
        assert!(!ctx.get_bool("s3_offload_complete"));
    }
}
