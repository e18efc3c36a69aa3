// src/config/validate.rs

use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RemoteTaskError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RemoteTaskError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_listen_address(&raw)?;
        validate_agent_address(&raw)?;

        let mut tasks = BTreeMap::new();
        for (name, task) in raw.task.iter() {
            if name.trim().is_empty() {
                return Err(RemoteTaskError::ConfigError(
                    "task names must not be empty".to_string(),
                ));
            }
            let descriptor = task.to_descriptor().map_err(|e| {
                RemoteTaskError::ConfigError(format!("task '{}': {}", name, e))
            })?;
            tasks.insert(name.clone(), descriptor);
        }

        Ok(ConfigFile::new_unchecked(raw.coordinator, raw.agent, tasks))
    }
}

fn validate_listen_address(cfg: &RawConfigFile) -> Result<()> {
    cfg.agent.listen.parse::<SocketAddr>().map_err(|e| {
        RemoteTaskError::ConfigError(format!(
            "[agent].listen must be an IP socket address like 0.0.0.0:7878 (got '{}': {})",
            cfg.agent.listen, e
        ))
    })?;
    Ok(())
}

fn validate_agent_address(cfg: &RawConfigFile) -> Result<()> {
    let Some(agent) = cfg.coordinator.agent.as_deref() else {
        return Ok(());
    };

    // The host may be a name resolved at connect time; only the port is
    // checked here.
    let port_ok = agent
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
        .unwrap_or(false);

    if !port_ok {
        return Err(RemoteTaskError::ConfigError(format!(
            "[coordinator].agent must be host:port (got '{}')",
            agent
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::TaskConfig;

    fn task(command: &[&str]) -> TaskConfig {
        TaskConfig {
            command: command.iter().map(|s| s.to_string()).collect(),
            return_stdout: false,
            return_status: false,
            encoding: None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.agent.listen, "0.0.0.0:7878");
        assert!(cfg.coordinator.agent.is_none());
        assert_eq!(cfg.tasks().count(), 0);
    }

    #[test]
    fn empty_task_command_names_the_task() {
        let mut raw = RawConfigFile::default();
        raw.task.insert("broken".to_string(), task(&[]));

        match ConfigFile::try_from(raw) {
            Err(RemoteTaskError::ConfigError(msg)) => {
                assert!(msg.contains("broken"));
                assert!(msg.contains("at least one token"));
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn agent_without_port_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.coordinator.agent = Some("build-host".to_string());
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(RemoteTaskError::ConfigError(_))
        ));
    }

    #[test]
    fn agent_host_name_is_accepted() {
        let mut raw = RawConfigFile::default();
        raw.coordinator.agent = Some("build-host.internal:7878".to_string());
        assert!(ConfigFile::try_from(raw).is_ok());
    }

    #[test]
    fn bad_listen_address_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.agent.listen = "localhost".to_string();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(RemoteTaskError::ConfigError(_))
        ));
    }
}
