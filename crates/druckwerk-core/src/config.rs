// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration, loaded from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DruckwerkError, Result};

/// Default IPP port, used when `CUPS_ADDRESS` names no port.
pub const DEFAULT_CUPS_PORT: u16 = 631;

/// Connection settings for the CUPS backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CupsConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Printer used when a submission names none. Overridden by the
    /// backend's own default when one is advertised.
    pub default_printer: Option<String>,
}

impl Default for CupsConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_CUPS_PORT,
            username: None,
            password: None,
            default_printer: None,
        }
    }
}

/// Full service configuration.
///
/// Absent optional sections disable the corresponding feature:
/// no `storage_path` disables `file_path` document sources, no `render_url`
/// disables HTML/office conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub cups: CupsConfig,
    /// Sandboxed root for `file_path` sources and URL download scratch space.
    pub storage_path: Option<PathBuf>,
    /// Base URL of the document rendering service.
    pub render_url: Option<String>,
    /// Base URL of the long-running-operation service.
    pub operations_url: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// `CUPS_ADDRESS` (default `localhost:631`), `CUPS_USER`,
    /// `CUPS_PASSWORD`, `DEFAULT_PRINTER`, `STORAGE_PATH`, `RENDER_URL`,
    /// `OPERATIONS_URL`.
    pub fn from_env() -> Result<Self> {
        let address = env_opt("CUPS_ADDRESS").unwrap_or_else(|| "localhost:631".into());
        let (host, port) = parse_address(&address)?;

        Ok(Self {
            cups: CupsConfig {
                host,
                port,
                username: env_opt("CUPS_USER"),
                password: env_opt("CUPS_PASSWORD"),
                default_printer: env_opt("DEFAULT_PRINTER"),
            },
            storage_path: env_opt("STORAGE_PATH").map(PathBuf::from),
            render_url: env_opt("RENDER_URL"),
            operations_url: env_opt("OPERATIONS_URL"),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Split a `host[:port]` address, defaulting the port to 631.
pub fn parse_address(address: &str) -> Result<(String, u16)> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port: u16 = port
                .parse()
                .map_err(|e| DruckwerkError::Config(format!("invalid port in {address:?}: {e}")))?;
            Ok((host.to_string(), port))
        }
        Some(_) => Err(DruckwerkError::Config(format!(
            "invalid CUPS address {address:?}"
        ))),
        None if !address.is_empty() => Ok((address.to_string(), DEFAULT_CUPS_PORT)),
        None => Err(DruckwerkError::Config("empty CUPS address".into())),
    }
}
