//! Backend service manager
//!
//! Drives the dockerized platform services (mock API, market data,
//! portfolio manager) through docker compose. Every operation returns a
//! typed result object with a `success`/`available` discriminant instead of
//! failing; callers branch on the field, nothing here panics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

/// Result of probing for the docker binary and daemon
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerCheck {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of probing for docker compose (standalone or plugin)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeCheck {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Health of a single composed service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub name: String,
    pub running: bool,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate backend status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub docker_available: bool,
    pub compose_available: bool,
    pub services_running: bool,
    pub services: BTreeMap<String, ServiceHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendStatus {
    fn unavailable(docker_available: bool, compose_available: bool, error: impl Into<String>) -> Self {
        Self {
            docker_available,
            compose_available,
            services_running: false,
            services: BTreeMap::new(),
            error: Some(error.into()),
        }
    }
}

/// Outcome of a start/stop action
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// One row of `docker compose ps --format json`
#[derive(Debug, Deserialize)]
struct PsRow {
    #[serde(rename = "Service")]
    service: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Health", default)]
    health: String,
}

/// Lifecycle manager for the composed backend services
pub struct ComposeManager {
    compose_file: PathBuf,
}

impl ComposeManager {
    pub fn new(compose_file: PathBuf) -> Self {
        Self { compose_file }
    }

    /// Check that docker is installed and its daemon is running
    pub fn check_docker(&self) -> DockerCheck {
        let version = match Command::new("docker").arg("--version").output() {
            Ok(out) if out.status.success() => {
                String::from_utf8_lossy(&out.stdout).trim().to_string()
            }
            _ => {
                return DockerCheck {
                    available: false,
                    version: None,
                    error: Some("Docker is not installed. Install Docker Desktop from docker.com".into()),
                };
            }
        };

        // The binary being present does not mean the daemon is up
        match Command::new("docker").arg("ps").output() {
            Ok(out) if out.status.success() => DockerCheck {
                available: true,
                version: Some(version),
                error: None,
            },
            _ => DockerCheck {
                available: false,
                version: Some(version),
                error: Some("Docker is installed but not running. Start Docker Desktop first.".into()),
            },
        }
    }

    /// Check for docker compose, trying the standalone binary first and the
    /// plugin second
    pub fn check_compose(&self) -> ComposeCheck {
        if let Ok(out) = Command::new("docker-compose").arg("--version").output() {
            if out.status.success() {
                return ComposeCheck {
                    available: true,
                    version: Some(String::from_utf8_lossy(&out.stdout).trim().to_string()),
                };
            }
        }

        match Command::new("docker").args(["compose", "version"]).output() {
            Ok(out) if out.status.success() => ComposeCheck {
                available: true,
                version: Some(String::from_utf8_lossy(&out.stdout).trim().to_string()),
            },
            _ => ComposeCheck {
                available: false,
                version: None,
            },
        }
    }

    /// Full backend status: docker, compose, and per-service health
    pub fn status(&self) -> BackendStatus {
        let docker = self.check_docker();
        if !docker.available {
            return BackendStatus::unavailable(
                false,
                false,
                docker.error.unwrap_or_else(|| "Docker not available".into()),
            );
        }

        let compose = self.check_compose();
        if !compose.available {
            return BackendStatus::unavailable(true, false, "Docker Compose not found");
        }

        match self.compose_command(&["ps", "--format", "json"]) {
            Ok(out) if out.status.success() => {
                let services = parse_ps_output(&String::from_utf8_lossy(&out.stdout));
                let services_running = services.values().any(|s| s.running);
                BackendStatus {
                    docker_available: true,
                    compose_available: true,
                    services_running,
                    services,
                    error: None,
                }
            }
            Ok(out) => BackendStatus::unavailable(
                true,
                true,
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ),
            Err(e) => BackendStatus::unavailable(true, true, format!("Failed to run compose: {}", e)),
        }
    }

    /// Bring all backend services up (detached)
    pub fn start(&self) -> ActionResult {
        let docker = self.check_docker();
        if !docker.available {
            return ActionResult::fail(
                docker.error.unwrap_or_else(|| "Docker not available".into()),
            );
        }
        if !self.check_compose().available {
            return ActionResult::fail("Docker Compose not found");
        }

        tracing::info!("Starting backend services from {:?}", self.compose_file);
        match self.compose_command(&["up", "-d"]) {
            Ok(out) if out.status.success() => ActionResult::ok(),
            Ok(out) => ActionResult::fail(String::from_utf8_lossy(&out.stderr).trim().to_string()),
            Err(e) => ActionResult::fail(format!("Failed to run compose: {}", e)),
        }
    }

    /// Take all backend services down
    pub fn stop(&self) -> ActionResult {
        if !self.check_compose().available {
            return ActionResult::fail("Docker Compose not found");
        }

        tracing::info!("Stopping backend services from {:?}", self.compose_file);
        match self.compose_command(&["down"]) {
            Ok(out) if out.status.success() => ActionResult::ok(),
            Ok(out) => ActionResult::fail(String::from_utf8_lossy(&out.stderr).trim().to_string()),
            Err(e) => ActionResult::fail(format!("Failed to run compose: {}", e)),
        }
    }

    /// Run a compose subcommand against the managed compose file
    fn compose_command(&self, args: &[&str]) -> std::io::Result<std::process::Output> {
        let standalone = Command::new("docker-compose")
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false);

        let mut cmd = if standalone {
            Command::new("docker-compose")
        } else {
            let mut cmd = Command::new("docker");
            cmd.arg("compose");
            cmd
        };

        cmd.arg("-f").arg(&self.compose_file).args(args).output()
    }
}

/// Parse `docker compose ps --format json` output into service health rows.
///
/// Compose emits one JSON object per line; older releases emitted a single
/// JSON array. Both shapes are accepted, unparseable lines are skipped.
fn parse_ps_output(stdout: &str) -> BTreeMap<String, ServiceHealth> {
    let mut services = BTreeMap::new();

    let rows: Vec<PsRow> = if stdout.trim_start().starts_with('[') {
        serde_json::from_str(stdout).unwrap_or_default()
    } else {
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    };

    for row in rows {
        let running = row.state == "running";
        // A service without a healthcheck reports no health; count it as
        // healthy while it is running
        let healthy = row.health == "healthy" || (running && row.health.is_empty());
        services.insert(
            row.service.clone(),
            ServiceHealth {
                name: row.service,
                running,
                healthy,
                error: None,
            },
        );
    }

    services
}
