#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;
use storycards_core::sync::{decode_content, PutFileRequest, SyncStage};
use storycards_core::{RemoteFile, RemoteFileStore, SyncError};

/// In-memory stand-in for the remote contents API.
#[derive(Default)]
pub struct FakeRemote {
    file: Mutex<Option<RemoteFile>>,
    puts: Mutex<Vec<PutFileRequest>>,
    fetch_failure: Mutex<Option<u16>>,
    put_failure: Mutex<Option<u16>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Option<Gate>,
}

struct Gate {
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

/// Test-side handles for a gated `FakeRemote`.
pub struct GateControl {
    pub started: Receiver<()>,
    pub release: Sender<()>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote already holding `json` at version `sha`.
    pub fn with_document(sha: &str, json: &str) -> Self {
        let remote = Self::new();
        *remote.file.lock().unwrap() = Some(RemoteFile {
            sha: sha.to_string(),
            content: storycards_core::sync::encode_content(json),
        });
        remote
    }

    /// Remote whose puts block until the test releases them.
    pub fn gated() -> (Self, GateControl) {
        let (started_tx, started_rx) = channel();
        let (release_tx, release_rx) = channel();
        let remote = Self {
            gate: Some(Gate {
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
            }),
            ..Self::default()
        };
        (
            remote,
            GateControl {
                started: started_rx,
                release: release_tx,
            },
        )
    }

    pub fn fail_fetch_with(&self, status: u16) {
        *self.fetch_failure.lock().unwrap() = Some(status);
    }

    pub fn fail_put_with(&self, status: u16) {
        *self.put_failure.lock().unwrap() = Some(status);
    }

    pub fn clear_failures(&self) {
        *self.fetch_failure.lock().unwrap() = None;
        *self.put_failure.lock().unwrap() = None;
    }

    pub fn puts(&self) -> Vec<PutFileRequest> {
        self.puts.lock().unwrap().clone()
    }

    /// Decoded JSON bodies of every put, in order.
    pub fn pushed_documents(&self) -> Vec<String> {
        self.puts()
            .iter()
            .map(|put| decode_content(&put.content).unwrap())
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RemoteFileStore for FakeRemote {
    fn branch(&self) -> &str {
        "main"
    }

    fn fetch(&self) -> Result<Option<RemoteFile>, SyncError> {
        self.enter();
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = match *self.fetch_failure.lock().unwrap() {
            Some(status) => Err(SyncError::Status {
                stage: SyncStage::Fetch,
                status,
            }),
            None => Ok(self.file.lock().unwrap().clone()),
        };
        self.leave();
        result
    }

    fn put(&self, request: &PutFileRequest) -> Result<(), SyncError> {
        self.enter();
        if let Some(gate) = &self.gate {
            gate.started.lock().unwrap().send(()).unwrap();
            gate.release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(10))
                .unwrap();
        }
        let result = match *self.put_failure.lock().unwrap() {
            Some(status) => Err(SyncError::Status {
                stage: SyncStage::Put,
                status,
            }),
            None => {
                let mut puts = self.puts.lock().unwrap();
                puts.push(request.clone());
                *self.file.lock().unwrap() = Some(RemoteFile {
                    sha: format!("sha-{}", puts.len()),
                    content: request.content.clone(),
                });
                Ok(())
            }
        };
        self.leave();
        result
    }
}
