//! Suite runner that drives scenarios against a shared browser session

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use niffler_common::Settings;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::fixtures::{Fixtures, Session};
use crate::scenarios::{self, Scenario};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    /// Base seed of the data factories, when one was configured
    pub seed: Option<u64>,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<TestResult>, duration_ms: u64, seed: Option<u64>) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            seed,
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub settings: Settings,
    pub output_dir: PathBuf,
}

impl RunnerConfig {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs scenarios sequentially, one fresh tab each
pub struct TestRunner {
    settings: Settings,
    output_dir: PathBuf,
    session: Option<Arc<Session>>,
}

impl TestRunner {
    pub fn new(settings: Settings) -> Self {
        Self::with_config(RunnerConfig::new(settings))
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            settings: config.settings,
            output_dir: config.output_dir,
            session: None,
        }
    }

    /// Launch the browser unless already running
    pub async fn start_session(&mut self) -> E2eResult<Arc<Session>> {
        if let Some(session) = &self.session {
            return Ok(Arc::clone(session));
        }
        let session = Session::start(self.settings.clone()).await?;
        self.session = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Clean up the session user and close the browser
    pub async fn finish(&mut self) -> E2eResult<()> {
        match self.session.take() {
            Some(session) => session.finish().await,
            None => Ok(()),
        }
    }

    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        self.run_scenarios(&scenarios::registry()).await
    }

    /// Run scenarios carrying `tag`
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let selected: Vec<Scenario> = scenarios::registry()
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect();
        self.run_scenarios(&selected).await
    }

    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestResult> {
        let scenario =
            scenarios::find(name).ok_or_else(|| E2eError::UnknownScenario(name.to_string()))?;
        let session = self.start_session().await?;
        Ok(run_scenario(session, &scenario).await)
    }

    pub async fn run_scenarios(&mut self, selected: &[Scenario]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let session = self.start_session().await?;

        info!("Running {} scenario(s)...", selected.len());

        let mut results = Vec::with_capacity(selected.len());
        for scenario in selected {
            let result = run_scenario(Arc::clone(&session), scenario).await;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let suite = TestSuiteResult::from_results(
            results,
            start.elapsed().as_millis() as u64,
            session.seed(),
        );
        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            suite.passed, suite.failed, suite.duration_ms
        );
        Ok(suite)
    }

    /// Write results as `test-results.json` under the output directory
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Set up fixtures, run one scenario and tear down; never fails itself
pub async fn run_scenario(session: Arc<Session>, scenario: &Scenario) -> TestResult {
    let start = Instant::now();
    debug!("Running scenario: {}", scenario.name);

    let error = match Fixtures::new(session, scenario.name).await {
        Ok(mut fixtures) => {
            let outcome = (scenario.run)(&mut fixtures).await;
            let teardown = fixtures.teardown().await;
            match (outcome, teardown) {
                (Ok(()), Ok(())) => None,
                (Ok(()), Err(e)) => Some(format!("teardown: {}", e)),
                (Err(e), Ok(())) => Some(e.to_string()),
                (Err(e), Err(cleanup)) => {
                    warn!("Teardown after failed {} also failed: {}", scenario.name, cleanup);
                    Some(e.to_string())
                }
            }
        }
        Err(e) => Some(format!("setup: {}", e)),
    };

    TestResult {
        name: scenario.name.to_string(),
        success: error.is_none(),
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, success: bool) -> TestResult {
        TestResult {
            name: name.into(),
            success,
            duration_ms: 5,
            error: (!success).then(|| "Assertion failed: boom".to_string()),
        }
    }

    #[test]
    fn test_suite_counts() {
        let suite = TestSuiteResult::from_results(
            vec![result("a", true), result("b", false), result("c", true)],
            42,
            Some(7),
        );
        assert_eq!(suite.total, 3);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
        assert!(!suite.success());
    }

    #[test]
    fn test_empty_suite_succeeds() {
        let suite = TestSuiteResult::from_results(Vec::new(), 0, None);
        assert!(suite.success());
        assert_eq!(suite.total, 0);
    }

    #[test]
    fn test_results_json_shape() {
        let suite = TestSuiteResult::from_results(vec![result("login_success", true)], 10, None);
        let json = serde_json::to_value(&suite).unwrap();
        assert_eq!(json["results"][0]["name"], "login_success");
        assert_eq!(json["results"][0]["error"], serde_json::Value::Null);
        assert_eq!(json["passed"], 1);
    }

    #[test]
    fn test_write_results() {
        let dir = std::env::temp_dir().join(format!("niffler-e2e-{}", uuid::Uuid::new_v4()));
        let runner = TestRunner::with_config(RunnerConfig {
            settings: Settings::default(),
            output_dir: dir.clone(),
        });

        let suite = TestSuiteResult::from_results(vec![result("edit_spend", false)], 1, Some(3));
        let path = runner.write_results(&suite).unwrap();

        let written: TestSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.failed, 1);
        assert_eq!(written.seed, Some(3));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_unknown_scenario() {
        let mut runner = TestRunner::new(Settings::default());
        let err = runner.run_test("does_not_exist").await.unwrap_err();
        assert!(matches!(err, E2eError::UnknownScenario(ref n) if n == "does_not_exist"));
    }
}
