//! Flat-file checkpoint store.
//!
//! One pair of append-only text files per host, kept in a single directory.
//! Writers for a host share one guard per file, so concurrent `record` calls
//! never interleave partial lines.

use super::{format_record, HostCheckpoint};
use crate::error::{CheckpointError, CheckpointResult};
use crate::types::{Port, PortState};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Durable per-host record of tested ports.
pub struct CheckpointStore {
    dir: PathBuf,
    hosts: StdMutex<HashMap<Ipv4Addr, Arc<HostFiles>>>,
}

/// Write side of one host's pair of files.
struct HostFiles {
    log: Mutex<HostLog>,
    open: Mutex<Option<File>>,
}

struct HostLog {
    file: Option<File>,
    /// Ports already present on disk or written by this process.
    recorded: HashSet<Port>,
}

impl CheckpointStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> CheckpointResult<Self> {
        let dir = dir.into();

        std::fs::create_dir_all(&dir).map_err(|source| CheckpointError::DirectoryError {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            hosts: StdMutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the full record for `host`.
    pub fn host_file(&self, host: Ipv4Addr) -> PathBuf {
        self.dir.join(format!("{}.txt", host))
    }

    /// Path of the open-port list for `host`.
    pub fn open_file(&self, host: Ipv4Addr) -> PathBuf {
        self.dir.join(format!("{}_Open.txt", host))
    }

    /// Read everything already recorded for `host`.
    ///
    /// A missing file yields an empty checkpoint. The loaded ports are also
    /// remembered so that later `record` calls cannot duplicate them.
    pub async fn load(&self, host: Ipv4Addr) -> CheckpointResult<HostCheckpoint> {
        let path = self.host_file(host);

        let checkpoint = match fs::read_to_string(&path).await {
            Ok(content) => HostCheckpoint::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => HostCheckpoint::new(),
            Err(source) => return Err(CheckpointError::ReadFailed { path, source }),
        };

        let files = self.files(host);
        let mut log = files.log.lock().await;
        log.recorded.extend(checkpoint.iter().map(|(port, _)| port));

        tracing::debug!(%host, known = checkpoint.len(), "loaded checkpoint");
        Ok(checkpoint)
    }

    /// Read back the open-port list for `host`, in file order.
    pub async fn load_open(&self, host: Ipv4Addr) -> CheckpointResult<Vec<Port>> {
        let path = self.open_file(host);

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content
                .lines()
                .filter_map(|line| line.trim().parse().ok())
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(CheckpointError::ReadFailed { path, source }),
        }
    }

    /// Append the verdict for one port.
    ///
    /// Open ports are written to the host file first and to the open list
    /// second, so the open list never names a port the host file lacks.
    /// Returns `false` without writing if the port is already recorded.
    pub async fn record(&self, host: Ipv4Addr, port: Port, state: PortState) -> CheckpointResult<bool> {
        let files = self.files(host);

        {
            let mut log = files.log.lock().await;
            if log.recorded.contains(&port) {
                tracing::debug!(%host, %port, "port already recorded, not rewriting");
                return Ok(false);
            }

            let path = self.host_file(host);
            if log.file.is_none() {
                log.file = Some(open_append(&path).await?);
            }
            if let Some(file) = log.file.as_mut() {
                append_line(file, &path, &format_record(port, state)).await?;
            }
            log.recorded.insert(port);
        }

        if state.is_open() {
            let path = self.open_file(host);
            let mut open = files.open.lock().await;
            if open.is_none() {
                *open = Some(open_append(&path).await?);
            }
            if let Some(file) = open.as_mut() {
                append_line(file, &path, &port.to_string()).await?;
            }
        }

        Ok(true)
    }

    fn files(&self, host: Ipv4Addr) -> Arc<HostFiles> {
        let mut hosts = self
            .hosts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(hosts.entry(host).or_insert_with(|| {
            Arc::new(HostFiles {
                log: Mutex::new(HostLog {
                    file: None,
                    recorded: HashSet::new(),
                }),
                open: Mutex::new(None),
            })
        }))
    }
}

async fn open_append(path: &Path) -> CheckpointResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|source| CheckpointError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })
}

async fn append_line(file: &mut File, path: &Path, line: &str) -> CheckpointResult<()> {
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');

    let write = async {
        file.write_all(buf.as_bytes()).await?;
        file.flush().await
    };
    write.await.map_err(|source| CheckpointError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}
