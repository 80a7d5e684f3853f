// src/executors/sandbox.rs
use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    CreateContainerOptions as BollardCreateContainerOptionsQuery,
    LogsOptions as BollardLogsOptionsQuery,
    RemoveContainerOptions as BollardRemoveContainerOptionsQuery,
    StartContainerOptions as BollardStartContainerOptionsQuery,
    StopContainerOptions as BollardStopContainerOptionsQuery,
    WaitContainerOptions as BollardWaitContainerOptionsQuery,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::default::Default;
use tempfile::Builder;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{CodeExecutor, ExecutionOutcome};
use crate::errors::SandboxError;

/// Executor that runs each code block in a fresh Docker container.
///
/// Containers are never reused: every call stages the program into a new
/// temp directory, starts a new container from the configured image, and
/// tears it down when the run ends, times out, or fails. Configured
/// dependencies are installed with pip before the program runs.
pub struct SandboxExecutor {
    docker: Docker,
    image: String,
    dependencies: Vec<String>,
    timeout_seconds: u64,
}

impl SandboxExecutor {
    pub async fn new(image: String, timeout_seconds: u64) -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            image,
            dependencies: Vec::new(),
            timeout_seconds,
        })
    }

    /// Packages to `pip install` in the container before the program runs.
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    fn build_command(dependencies: &[String], script_path_in_container: &str) -> Vec<String> {
        if dependencies.is_empty() {
            vec!["python".to_string(), script_path_in_container.to_string()]
        } else {
            vec![
                "sh".to_string(),
                "-c".to_string(),
                format!(
                    "pip install --quiet {} && python {}",
                    dependencies.join(" "),
                    script_path_in_container
                ),
            ]
        }
    }

    async fn run(&self, code: &str) -> Result<String, SandboxError> {
        let temp_dir = Builder::new().prefix("agentis-exec-").tempdir()?;
        let host_temp_dir_path = temp_dir
            .path()
            .to_str()
            .ok_or_else(|| SandboxError::TempFileError("Invalid temp path".to_string()))?
            .to_string();

        let script_filename = format!("script_{}.py", Uuid::new_v4());
        let host_script_path = temp_dir.path().join(&script_filename);

        let mut file = fs::File::create(&host_script_path).await?;
        file.write_all(code.as_bytes()).await?;
        file.flush().await?;

        let container_work_dir = "/app";
        let script_path_in_container = format!("{}/{}", container_work_dir, script_filename);
        let cmd = Self::build_command(&self.dependencies, &script_path_in_container);

        let options = Some(BollardCreateContainerOptionsQuery {
            name: Some(format!("agentis-exec-{}", Uuid::new_v4())),
            ..Default::default()
        });

        let config = ContainerCreateBody {
            image: Some(self.image.clone()),
            cmd: Some(cmd),
            working_dir: Some(container_work_dir.to_string()),
            host_config: Some(bollard::models::HostConfig {
                binds: Some(vec![format!(
                    "{}:{}",
                    host_temp_dir_path, container_work_dir
                )]),
                ..Default::default()
            }),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let container = self.docker.create_container(options, config).await?;
        self.docker
            .start_container(&container.id, None::<BollardStartContainerOptionsQuery>)
            .await?;

        // wait_container returns a stream; the first item carries the exit status.
        let mut wait_stream = self
            .docker
            .wait_container(&container.id, None::<BollardWaitContainerOptionsQuery>);
        let timeout_future =
            tokio::time::sleep(tokio::time::Duration::from_secs(self.timeout_seconds));

        let wait_outcome = tokio::select! {
            res = wait_stream.next() => res,
            _ = timeout_future => {
                log::warn!("Execution timed out for container {}", container.id);
                self.teardown(&container.id).await;
                return Err(SandboxError::Timeout(self.timeout_seconds));
            }
        };

        let wait_response = match wait_outcome {
            Some(Ok(response)) => response,
            Some(Err(e)) => {
                self.teardown(&container.id).await;
                return Err(SandboxError::BollardError(e));
            }
            None => {
                self.teardown(&container.id).await;
                return Err(SandboxError::ContainerFailed {
                    exit_code: None,
                    stdout: "Container wait stream ended unexpectedly".to_string(),
                    stderr: String::new(),
                });
            }
        };

        let mut log_stream = self.docker.logs(
            &container.id,
            Some(BollardLogsOptionsQuery {
                stdout: true,
                stderr: true,
                ..Default::default()
            }),
        );

        let mut stdout = String::new();
        let mut stderr = String::new();
        while let Some(log_result) = log_stream.next().await {
            match log_result {
                Ok(LogOutput::StdOut { message }) => {
                    stdout.push_str(std::str::from_utf8(&message)?)
                }
                Ok(LogOutput::StdErr { message }) => {
                    stderr.push_str(std::str::from_utf8(&message)?)
                }
                Ok(_) => {}
                Err(e) => {
                    self.teardown(&container.id).await;
                    return Err(SandboxError::BollardError(e));
                }
            }
        }

        self.teardown(&container.id).await;

        let exit_code = wait_response.status_code;
        if exit_code != 0 {
            return Err(SandboxError::ContainerFailed {
                exit_code: Some(exit_code),
                stdout,
                stderr,
            });
        }

        if stderr.is_empty() {
            Ok(stdout)
        } else {
            Ok(format!("{}{}", stdout, stderr))
        }
    }

    /// Best-effort removal, the only removal path. Runs after log collection
    /// on normal exits so the output cannot vanish with the container; the
    /// stop call is a no-op for containers that already exited, and the
    /// force remove covers ones still running after a timeout or wait
    /// failure.
    async fn teardown(&self, container_id: &str) {
        let _ = self
            .docker
            .stop_container(container_id, None::<BollardStopContainerOptionsQuery>)
            .await;
        let _ = self
            .docker
            .remove_container(
                container_id,
                Some(BollardRemoveContainerOptionsQuery {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;
    }
}

#[async_trait]
impl CodeExecutor for SandboxExecutor {
    async fn execute(&self, code: &str) -> ExecutionOutcome {
        match self.run(code).await {
            Ok(output) => ExecutionOutcome::Success(output),
            Err(e) => ExecutionOutcome::Error(format!("Error executing code: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // requires a running Docker daemon and the python:3.10-slim image
    async fn runs_python_in_container() {
        let executor = SandboxExecutor::new("python:3.10-slim".to_string(), 60)
            .await
            .unwrap();
        let outcome = executor.execute("print(2 + 2)").await;
        assert_eq!(outcome, ExecutionOutcome::Success("4\n".to_string()));
    }

    #[tokio::test]
    #[ignore] // requires a running Docker daemon and the python:3.10-slim image
    async fn fast_exiting_container_output_is_captured() {
        // Exits as soon as it prints; the output must still be collected
        // before the container is removed.
        let executor = SandboxExecutor::new("python:3.10-slim".to_string(), 60)
            .await
            .unwrap();
        for _ in 0..3 {
            let outcome = executor.execute("print('fast')").await;
            assert_eq!(outcome, ExecutionOutcome::Success("fast\n".to_string()));
        }
    }

    #[tokio::test]
    #[ignore] // requires a running Docker daemon and the python:3.10-slim image
    async fn nonzero_exit_becomes_error_outcome() {
        let executor = SandboxExecutor::new("python:3.10-slim".to_string(), 60)
            .await
            .unwrap();
        let outcome = executor.execute("import sys; sys.exit(3)").await;
        assert!(outcome.is_error());
        assert!(outcome.as_text().starts_with("Error executing code:"));
    }

    #[test]
    fn command_runs_script_directly_without_dependencies() {
        let cmd = SandboxExecutor::build_command(&[], "/app/script_x.py");
        assert_eq!(cmd, vec!["python".to_string(), "/app/script_x.py".to_string()]);
    }

    #[test]
    fn install_step_is_folded_into_the_command() {
        let deps = vec!["numpy".to_string(), "pandas".to_string()];
        let cmd = SandboxExecutor::build_command(&deps, "/app/script_x.py");
        assert_eq!(cmd[0], "sh");
        assert_eq!(cmd[1], "-c");
        assert_eq!(
            cmd[2],
            "pip install --quiet numpy pandas && python /app/script_x.py"
        );
    }
}
