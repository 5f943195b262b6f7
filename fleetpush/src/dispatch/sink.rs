//! Per-device output files.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::device::DeviceRecord;
use crate::error::{Error, Result};

/// Output file for one device in one run.
///
/// Created truncated, so a run never sees output from an earlier one.
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    file: File,
}

impl OutputSink {
    /// `<dir>/output_<host>_<port>.log`. Host bytes outside `[A-Za-z0-9.-]`
    /// are written as `%XX`, so distinct hosts never share a file.
    pub fn path_for(dir: &Path, device: &DeviceRecord) -> PathBuf {
        let mut host = String::with_capacity(device.host().len());
        for byte in device.host().bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
                host.push(char::from(byte));
            } else {
                host.push_str(&format!("%{byte:02X}"));
            }
        }
        dir.join(format!("output_{}_{}.log", host, device.port()))
    }

    /// Create (or truncate) the sink for `device` under `dir`.
    pub async fn create(dir: &Path, device: &DeviceRecord) -> Result<Self> {
        let path = Self::path_for(dir, device);
        fs::create_dir_all(dir).await.map_err(|source| Error::Sink {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = File::create(&path).await.map_err(|source| Error::Sink {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data).await.map_err(|source| self.error(source))
    }

    /// A handle for a child process's stdout or stderr. Handles share the
    /// file offset, so output from both streams interleaves in order.
    pub async fn stdio(&self) -> Result<Stdio> {
        let clone = self.file.try_clone().await.map_err(|source| self.error(source))?;
        Ok(Stdio::from(clone.into_std().await))
    }

    /// Flush and close the file, returning its path.
    pub async fn finish(mut self) -> Result<PathBuf> {
        if let Err(source) = self.file.flush().await {
            return Err(self.error(source));
        }
        Ok(self.path)
    }

    fn error(&self, source: std::io::Error) -> Error {
        Error::Sink {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceType;

    fn device(host: &str) -> DeviceRecord {
        DeviceRecord::new(host, 2222, "admin", "pw", DeviceType::raw()).unwrap()
    }

    #[test]
    fn test_path_for_escapes_host() {
        let dir = Path::new("log/sshpass");
        assert_eq!(
            OutputSink::path_for(dir, &device("10.0.0.1")),
            dir.join("output_10.0.0.1_2222.log")
        );
        assert_eq!(
            OutputSink::path_for(dir, &device("fe80::1/../x")),
            dir.join("output_fe80%3A%3A1%2F..%2Fx_2222.log")
        );
    }

    #[test]
    fn test_path_for_distinct_hosts_distinct_files() {
        let dir = Path::new("out");
        let hosts = ["a:b", "a_b", "a%5Fb", "a/b", "a b"];
        let mut paths: Vec<PathBuf> = hosts
            .iter()
            .map(|h| OutputSink::path_for(dir, &device(h)))
            .collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), hosts.len());
    }

    #[tokio::test]
    async fn test_create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let device = device("olt1");

        let mut sink = OutputSink::create(&nested, &device).await.unwrap();
        sink.write_all(b"first run, long output\n").await.unwrap();
        sink.finish().await.unwrap();

        let mut sink = OutputSink::create(&nested, &device).await.unwrap();
        sink.write_all(b"second\n").await.unwrap();
        let path = sink.finish().await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "second\n");
    }
}
