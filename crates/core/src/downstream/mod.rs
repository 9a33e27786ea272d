//! Connects to every configured downstream server concurrently and keeps
//! the resulting sessions, recording but not failing on individual
//! connection failures. Grounded on the teacher's `Downstream::new`
//! fan-out, generalized from a single sorted `Vec` to a pool that also
//! tracks per-server failures for the aggregation engine's initialization
//! log.

mod client;

pub use client::DownstreamClient;

use config::ServerSpec;
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::DownstreamError;

/// The set of downstream sessions resulting from one connection fan-out,
/// plus a record of which servers failed to connect.
pub struct DownstreamPool {
    sessions: Vec<DownstreamClient>,
    failures: Vec<(String, DownstreamError)>,
}

impl DownstreamPool {
    /// Connects to every server in `specs` concurrently. A failure for one
    /// server never prevents the others from connecting.
    pub async fn connect_all(specs: &[ServerSpec]) -> Self {
        let mut attempts: FuturesUnordered<_> = specs
            .iter()
            .map(|spec| async move { (spec.name.clone(), DownstreamClient::connect(spec).await) })
            .collect();

        let mut sessions = Vec::new();
        let mut failures = Vec::new();

        while let Some((name, result)) = attempts.next().await {
            match result {
                Ok(session) => sessions.push(session),
                Err(err) => {
                    log::error!("downstream server '{name}' failed to connect: {err}");
                    failures.push((name, err));
                }
            }
        }

        sessions.sort_by(|a, b| a.name().cmp(b.name()));

        Self { sessions, failures }
    }

    /// Iterates over every session that connected successfully.
    pub fn sessions(&self) -> impl Iterator<Item = &DownstreamClient> {
        self.sessions.iter()
    }

    /// Looks up a connected session by server name.
    pub fn find(&self, server_name: &str) -> Option<&DownstreamClient> {
        self.sessions
            .binary_search_by(|session| session.name().cmp(server_name))
            .ok()
            .map(|index| &self.sessions[index])
    }

    /// Servers that failed to connect, alongside the error recorded for
    /// each.
    pub fn failures(&self) -> &[(String, DownstreamError)] {
        &self.failures
    }
}
