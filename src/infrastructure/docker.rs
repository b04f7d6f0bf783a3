//! Docker engine
//!
//! Implements [`Engine`] on top of the Docker Engine API through bollard.

use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, RemoveContainerOptions, StartContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::{API_DEFAULT_VERSION, Docker};
use futures::StreamExt;
use url::Url;

use super::engine::{
    Engine, EngineError, ExecOutput, ExecSpec, OutputStream, PullProgress, PullStream,
    RemoveOptions,
};

/// Polls spent waiting for an exec to report its exit code
const INSPECT_ATTEMPTS: u32 = 50;
const INSPECT_INTERVAL: Duration = Duration::from_millis(100);

/// Engine backed by a Docker daemon
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connects to `host`, or to the platform default endpoint when `None`.
    ///
    /// Accepted schemes are `unix://`, `tcp://` and `http://`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Connection`] for malformed hosts, unsupported
    /// schemes, or client construction failures.
    pub fn connect(host: Option<&str>, timeout: Duration) -> Result<Self, EngineError> {
        let timeout_secs = timeout.as_secs();
        let docker = match host {
            None => Docker::connect_with_local_defaults(),
            Some(host) => {
                let url = Url::parse(host).map_err(|e| {
                    EngineError::Connection(format!("invalid engine host '{host}': {e}"))
                })?;
                match url.scheme() {
                    #[cfg(unix)]
                    "unix" => Docker::connect_with_unix(url.path(), timeout_secs, API_DEFAULT_VERSION),
                    "tcp" | "http" => {
                        Docker::connect_with_http(host, timeout_secs, API_DEFAULT_VERSION)
                    }
                    other => {
                        return Err(EngineError::Connection(format!(
                            "unsupported engine host scheme '{other}' in '{host}'"
                        )));
                    }
                }
            }
        }
        .map_err(|e| EngineError::Connection(e.to_string()))?;

        tracing::debug!(host = host.unwrap_or("<default>"), "Docker client configured");
        Ok(Self { docker })
    }
}

#[async_trait]
impl Engine for DockerEngine {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn ping(&self) -> Result<(), EngineError> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Connection(e.to_string()))
    }

    fn pull_image(&self, reference: &str) -> PullStream {
        let (from_image, tag) = image_and_tag(reference);
        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };
        let image = reference.to_string();

        self.docker
            .create_image(Some(options), None, None)
            .map(move |message| match message {
                Ok(info) => match info.error {
                    Some(reason) => Err(EngineError::Pull {
                        image: image.clone(),
                        reason,
                    }),
                    None => Ok(PullProgress {
                        id: info.id,
                        status: info.status.unwrap_or_default(),
                        progress: info.progress,
                    }),
                },
                Err(e) => Err(EngineError::Pull {
                    image: image.clone(),
                    reason: e.to_string(),
                }),
            })
            .boxed()
    }

    async fn create_context(
        &self,
        name: &str,
        image: &str,
        placeholder: &[String],
    ) -> Result<String, EngineError> {
        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };
        let config = Config {
            image: Some(image.to_string()),
            cmd: Some(placeholder.to_vec()),
            tty: Some(false),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| EngineError::Create(e.to_string()))?;

        for warning in &response.warnings {
            tracing::warn!(container = %name, warning = %warning, "Engine warning on create");
        }
        Ok(response.id)
    }

    async fn start_context(&self, id: &str) -> Result<(), EngineError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| EngineError::Start(e.to_string()))
    }

    async fn exec_in_context(&self, id: &str, spec: &ExecSpec) -> Result<String, EngineError> {
        let options = CreateExecOptions {
            cmd: Some(spec.cmd.clone()),
            env: Some(spec.env.clone()),
            tty: Some(spec.tty),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let created = self
            .docker
            .create_exec(id, options)
            .await
            .map_err(|e| EngineError::Exec(e.to_string()))?;
        Ok(created.id)
    }

    async fn attach(&self, exec_id: &str) -> Result<OutputStream, EngineError> {
        let started = self
            .docker
            .start_exec(
                exec_id,
                Some(StartExecOptions {
                    detach: false,
                    output_capacity: None,
                }),
            )
            .await
            .map_err(|e| EngineError::Attach(e.to_string()))?;

        match started {
            StartExecResults::Attached { output, .. } => Ok(output
                .map(|chunk| {
                    chunk
                        .map(into_exec_output)
                        .map_err(|e| EngineError::Attach(e.to_string()))
                })
                .boxed()),
            StartExecResults::Detached => Err(EngineError::Attach(
                "exec started detached, no output to attach to".to_string(),
            )),
        }
    }

    async fn inspect_exec(&self, exec_id: &str) -> Result<i64, EngineError> {
        for _ in 0..INSPECT_ATTEMPTS {
            let inspect = self
                .docker
                .inspect_exec(exec_id)
                .await
                .map_err(|e| EngineError::Inspect(e.to_string()))?;

            if inspect.running != Some(true) {
                return inspect.exit_code.ok_or_else(|| {
                    EngineError::Inspect(format!("exec {exec_id} reported no exit code"))
                });
            }
            tokio::time::sleep(INSPECT_INTERVAL).await;
        }
        Err(EngineError::Inspect(format!(
            "exec {exec_id} still running after output closed"
        )))
    }

    async fn remove_context(&self, id: &str, options: RemoveOptions) -> Result<(), EngineError> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    v: options.volumes,
                    force: options.force,
                    link: false,
                }),
            )
            .await
            .map_err(|e| EngineError::Remove(e.to_string()))
    }
}

fn into_exec_output(output: LogOutput) -> ExecOutput {
    match output {
        LogOutput::StdOut { message } => ExecOutput::Stdout(message.to_vec()),
        LogOutput::StdErr { message } => ExecOutput::Stderr(message.to_vec()),
        LogOutput::Console { message } | LogOutput::StdIn { message } => {
            ExecOutput::Console(message.to_vec())
        }
    }
}

/// Splits a reference into the `fromImage` and `tag` pull parameters.
///
/// An untagged reference pulls `latest`; the daemon would otherwise fetch
/// every tag. Digest references are passed through whole.
fn image_and_tag(reference: &str) -> (String, String) {
    if reference.contains('@') {
        return (reference.to_string(), String::new());
    }
    let name_start = reference.rfind('/').map_or(0, |i| i + 1);
    match reference[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            (
                reference[..split].to_string(),
                reference[split + 1..].to_string(),
            )
        }
        None => (reference.to_string(), "latest".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_and_tag() {
        assert_eq!(
            image_and_tag("docker.io/library/ubuntu:22.04"),
            ("docker.io/library/ubuntu".to_string(), "22.04".to_string())
        );
        assert_eq!(
            image_and_tag("docker.io/library/alpine"),
            ("docker.io/library/alpine".to_string(), "latest".to_string())
        );
        assert_eq!(
            image_and_tag("registry.local:5000/team/app"),
            ("registry.local:5000/team/app".to_string(), "latest".to_string())
        );
        assert_eq!(
            image_and_tag("example.com/container@sha256:abc"),
            ("example.com/container@sha256:abc".to_string(), String::new())
        );
    }

    #[test]
    fn test_connect_rejects_unknown_scheme() {
        let result = DockerEngine::connect(Some("ftp://engine"), Duration::from_secs(5));
        assert!(matches!(result, Err(EngineError::Connection(_))));
    }

    #[test]
    fn test_connect_rejects_malformed_host() {
        let result = DockerEngine::connect(Some("not a url"), Duration::from_secs(5));
        assert!(matches!(result, Err(EngineError::Connection(_))));
    }

    #[test]
    fn test_connect_over_tcp_is_lazy() {
        let engine = DockerEngine::connect(Some("tcp://127.0.0.1:2375"), Duration::from_secs(5));
        assert!(engine.is_ok());
        assert_eq!(engine.unwrap().name(), "docker");
    }
}
