// src/types.rs

//! Per-vertex configuration handed verbatim to a vertex's executor.
//!
//! The scheduler never looks inside a [`VertexConfig`]; it only stores it at
//! registration time and forwards it at dispatch.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

/// A named parameter exported to the executor (e.g. as an environment variable).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Optional inline content attached to a vertex (typically a script).
///
/// When `compressed` is set, `content` holds base64-encoded zstd data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Payload {
    pub content: String,
    #[serde(default)]
    pub compressed: bool,
}

impl Payload {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            compressed: false,
        }
    }

    /// Build a compressed payload from raw bytes.
    pub fn compress(raw: &[u8]) -> Result<Self> {
        let packed = zstd::encode_all(raw, 0).context("compressing payload with zstd")?;
        Ok(Self {
            content: STANDARD.encode(packed),
            compressed: true,
        })
    }

    /// Return the raw payload bytes, decompressing if needed.
    pub fn decode(&self) -> Result<Vec<u8>> {
        if !self.compressed {
            return Ok(self.content.as_bytes().to_vec());
        }

        let packed = STANDARD
            .decode(self.content.trim())
            .context("payload is marked compressed but is not valid base64")?;

        let mut raw = Vec::new();
        zstd::Decoder::new(packed.as_slice())
            .context("opening zstd payload")?
            .read_to_end(&mut raw)
            .context("decompressing zstd payload")?;
        Ok(raw)
    }
}

/// Structured, executor-specific configuration for one vertex.
///
/// Scheduling hints (`width`, `timeout`, `language`) are advisory: the runner
/// forwards them untouched and it is up to the executor to honour them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexConfig {
    /// Command line; by convention the first token is the program.
    pub command: Vec<String>,
    /// Named parameters, exported as environment by the shell executor.
    pub params: Vec<Param>,
    pub payload: Option<Payload>,
    /// Advisory concurrency width.
    pub width: Option<usize>,
    pub timeout: Option<Duration>,
    pub language: Option<String>,
}

impl VertexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config whose command line is the given tokens.
    pub fn command<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Param::new(name, value));
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_payload_decodes_to_its_content() {
        let payload = Payload::plain("echo hello");
        assert_eq!(payload.decode().unwrap(), b"echo hello");
    }

    #[test]
    fn compressed_payload_decodes_back_to_original() {
        let payload = Payload::compress(b"#!/bin/sh\necho compressed\n").unwrap();
        assert!(payload.compressed);
        assert_ne!(payload.content, "#!/bin/sh\necho compressed\n");
        assert_eq!(payload.decode().unwrap(), b"#!/bin/sh\necho compressed\n");
    }

    #[test]
    fn compressed_flag_with_garbage_content_is_an_error() {
        let payload = Payload {
            content: "not base64 at all!".into(),
            compressed: true,
        };
        assert!(payload.decode().is_err());
    }
}
