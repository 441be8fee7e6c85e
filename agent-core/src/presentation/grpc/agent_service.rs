// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent RPC Server (component E): the `PulsaarAgent` service
//! implementation. Every operation runs policy admission, rate
//! governance, and audit emission, in that order, before any filesystem
//! syscall.

use std::path::Path;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

use crate::domain::audit::OperationKind;
use crate::domain::file_entry::FileEntry;
use crate::domain::path_policy;
use crate::domain::rate_governor::{self, RateGovernor};
use crate::domain::{EffectivePolicy, PulsaarError};
use crate::infrastructure::fs_reader;
use crate::infrastructure::AuditEmitter;
use crate::proto;
use crate::proto::pulsaar_agent_server::PulsaarAgent;

const STREAM_CHANNEL_DEPTH: usize = 4;

pub struct AgentService {
    policy: EffectivePolicy,
    governor: RateGovernor,
    audit: AuditEmitter,
    health: HealthInfo,
}

#[derive(Clone)]
pub struct HealthInfo {
    pub version: String,
    pub commit: String,
    pub date: String,
}

impl AgentService {
    pub fn new(policy: EffectivePolicy, governor: RateGovernor, audit: AuditEmitter, health: HealthInfo) -> Self {
        Self {
            policy,
            governor,
            audit,
            health,
        }
    }

    fn effective_roots(&self, override_roots: &[String]) -> Vec<String> {
        if override_roots.is_empty() {
            self.policy.roots().to_vec()
        } else {
            override_roots.to_vec()
        }
    }

    fn peer_of<T>(request: &Request<T>) -> Option<String> {
        request
            .remote_addr()
            .map(|addr| rate_governor::peer_key(&addr.to_string()))
    }

    fn check_rate(&self, peer: Option<&str>) -> Result<(), Status> {
        if self.governor.allow(peer) {
            Ok(())
        } else {
            Err(PulsaarError::ResourceExhausted("rate limit exceeded".to_string()).into())
        }
    }

    fn check_admission(&self, path: &str, roots: &[String]) -> Result<(), Status> {
        if path_policy::admit(path, roots) {
            Ok(())
        } else {
            Err(PulsaarError::PermissionDenied(format!("{path} is not within the allowed roots")).into())
        }
    }
}

impl From<FileEntry> for proto::FileInfo {
    fn from(entry: FileEntry) -> Self {
        proto::FileInfo {
            name: entry.name,
            is_dir: entry.is_directory,
            size_bytes: entry.size_bytes,
            mode: entry.mode,
            mtime: Some(prost_types::Timestamp {
                seconds: entry.modified.timestamp(),
                nanos: entry.modified.timestamp_subsec_nanos() as i32,
            }),
        }
    }
}

#[tonic::async_trait]
impl PulsaarAgent for AgentService {
    async fn list(&self, request: Request<proto::ListRequest>) -> Result<Response<proto::ListResponse>, Status> {
        let peer = Self::peer_of(&request);
        self.check_rate(peer.as_deref())?;

        let req = request.into_inner();
        self.audit.record(OperationKind::List, &req.path);

        let roots = self.effective_roots(&req.allowed_roots);
        self.check_admission(&req.path, &roots)?;

        let entries = fs_reader::list_dir(Path::new(&req.path))
            .await
            .map_err(Status::from)?;
        Ok(Response::new(proto::ListResponse {
            entries: entries.into_iter().map(Into::into).collect(),
        }))
    }

    async fn stat(&self, request: Request<proto::StatRequest>) -> Result<Response<proto::StatResponse>, Status> {
        let peer = Self::peer_of(&request);
        self.check_rate(peer.as_deref())?;

        let req = request.into_inner();
        self.audit.record(OperationKind::Stat, &req.path);

        let roots = self.effective_roots(&req.allowed_roots);
        self.check_admission(&req.path, &roots)?;

        let info = fs_reader::stat(Path::new(&req.path)).await.map_err(Status::from)?;
        Ok(Response::new(proto::StatResponse {
            info: Some(info.into()),
        }))
    }

    async fn read(&self, request: Request<proto::ReadRequest>) -> Result<Response<proto::ReadResponse>, Status> {
        let peer = Self::peer_of(&request);
        self.check_rate(peer.as_deref())?;

        let req = request.into_inner();
        self.audit.record(OperationKind::Read, &req.path);

        let roots = self.effective_roots(&req.allowed_roots);
        self.check_admission(&req.path, &roots)?;

        let chunk = fs_reader::read_range(Path::new(&req.path), req.offset, req.length)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(proto::ReadResponse {
            data: chunk.data.into(),
            eof: chunk.eof,
        }))
    }

    type StreamStream = ReceiverStream<Result<proto::ReadResponse, Status>>;

    async fn stream(&self, request: Request<proto::StreamRequest>) -> Result<Response<Self::StreamStream>, Status> {
        let peer = Self::peer_of(&request);
        self.check_rate(peer.as_deref())?;

        let req = request.into_inner();
        self.audit.record(OperationKind::Stream, &req.path);

        let roots = self.effective_roots(&req.allowed_roots);
        self.check_admission(&req.path, &roots)?;

        let path = req.path.clone();
        let chunk_size = req.chunk_size;
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_DEPTH);

        tokio::spawn(async move {
            let mut reader = match fs_reader::ChunkedReader::open(Path::new(&path), chunk_size).await {
                Ok(reader) => reader,
                Err(err) => {
                    let _ = tx.send(Err(Status::from(err))).await;
                    return;
                }
            };

            loop {
                match reader.next_chunk().await {
                    Ok(Some(chunk)) => {
                        let eof = chunk.eof;
                        if tx
                            .send(Ok(proto::ReadResponse {
                                data: chunk.data.into(),
                                eof,
                            }))
                            .await
                            .is_err()
                        {
                            // Receiver dropped: caller cancelled. `reader`
                            // drops here and releases the file handle.
                            return;
                        }
                        if eof {
                            return;
                        }
                    }
                    Ok(None) => return,
                    Err(err) => {
                        let _ = tx.send(Err(Status::from(err))).await;
                        return;
                    }
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn health(&self, _request: Request<proto::HealthRequest>) -> Result<Response<proto::HealthResponse>, Status> {
        Ok(Response::new(proto::HealthResponse {
            ready: true,
            version: self.health.version.clone(),
            status_message: "serving".to_string(),
            commit: self.health.commit.clone(),
            date: self.health.date.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy_source::EffectivePolicy;
    use std::io::Write;

    fn service_with_roots(roots: Vec<String>) -> AgentService {
        AgentService::new(
            EffectivePolicy(roots),
            RateGovernor::new(1000, 1000),
            AuditEmitter::new("test-agent"),
            HealthInfo {
                version: "0.0.0-test".to_string(),
                commit: "unknown".to_string(),
                date: "unknown".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn list_denies_path_outside_allow_set() {
        let service = service_with_roots(vec!["/app".to_string()]);
        let request = Request::new(proto::ListRequest {
            path: "/etc".to_string(),
            allowed_roots: vec![],
        });
        let err = service.list(request).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::PermissionDenied);
    }

    #[tokio::test]
    async fn read_rejects_length_above_one_mebibyte() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("big.bin");
        std::fs::File::create(&file_path).unwrap();

        let service = service_with_roots(vec![dir.path().to_string_lossy().into_owned()]);
        let request = Request::new(proto::ReadRequest {
            path: file_path.to_string_lossy().into_owned(),
            offset: 0,
            length: 2 * 1024 * 1024,
            allowed_roots: vec![],
        });
        let err = service.read(request).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn read_whole_small_file_sets_eof() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(b"Hello, this is test content for reading.").unwrap();

        let service = service_with_roots(vec![dir.path().to_string_lossy().into_owned()]);
        let request = Request::new(proto::ReadRequest {
            path: file_path.to_string_lossy().into_owned(),
            offset: 0,
            length: 0,
            allowed_roots: vec![],
        });
        let response = service.read(request).await.unwrap().into_inner();
        assert!(response.eof);
        assert_eq!(response.data, b"Hello, this is test content for reading.".to_vec());
    }

    #[tokio::test]
    async fn health_does_not_consult_policy_or_rate() {
        let service = service_with_roots(vec![]);
        let response = service
            .health(Request::new(proto::HealthRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert!(response.ready);
    }
}
