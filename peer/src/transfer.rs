use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use peersync_protocol::{
    CHUNK_SIZE, MAX_DATAGRAM_SIZE, MIN_TRANSFER_BACKLOG, is_valid_filename,
};
use tokio::{
    fs::{self, File},
    io::{self, AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpSocket, TcpStream},
};

use crate::Result;

/// The directory a peer serves files from. Read-only.
#[derive(Clone, Debug)]
pub struct SharedDirectory {
    root: PathBuf,
}

impl SharedDirectory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a requested name to a path inside the directory. Names that
    /// could step outside of it are refused.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        is_valid_filename(name).then(|| self.root.join(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|path| path.is_file())
    }
}

/// Accepts transfer connections and streams requested files back.
pub struct TransferServer {
    listener: TcpListener,
    shared: Arc<SharedDirectory>,
    chunk_size: usize,
}

impl TransferServer {
    /// Binds `addr` with a listen backlog of at least
    /// [`MIN_TRANSFER_BACKLOG`].
    pub fn bind(
        addr: SocketAddr,
        backlog: u32,
        shared: SharedDirectory,
    ) -> Result<Self> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.bind(addr)?;
        let listener = socket.listen(backlog.max(MIN_TRANSFER_BACKLOG))?;
        log::info!(
            "Serving {} on {}",
            shared.root().display(),
            listener.local_addr()?
        );
        Ok(Self {
            listener,
            shared: Arc::new(shared),
            chunk_size: CHUNK_SIZE,
        })
    }

    /// Caps every write to at most `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, CHUNK_SIZE);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the task is dropped, one spawned task per
    /// connection.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    log::warn!("Failed to accept transfer connection: {err}");
                    continue;
                }
            };
            let shared = self.shared.clone();
            let chunk_size = self.chunk_size;
            tokio::spawn(async move {
                match upload(stream, &shared, chunk_size).await {
                    Ok(Some((name, sent))) => {
                        log::info!("Sent {name} ({sent} bytes) to {peer}")
                    }
                    Ok(None) => {}
                    Err(err) => log::warn!("Upload to {peer} failed: {err}"),
                }
            });
        }
    }
}

/// Serves one connection: a single read for the filename, then the file in
/// chunks, then close. Unknown names close the connection with no data.
async fn upload(
    mut stream: TcpStream,
    shared: &SharedDirectory,
    chunk_size: usize,
) -> io::Result<Option<(String, u64)>> {
    let mut request = [0u8; MAX_DATAGRAM_SIZE];
    let len = stream.read(&mut request).await?;
    let Ok(name) = std::str::from_utf8(&request[..len]) else {
        log::warn!("Transfer request is not valid UTF-8");
        return Ok(None);
    };
    let name = name.trim_end_matches(['\r', '\n']);

    let Some(path) = shared.resolve(name) else {
        log::warn!("Refusing transfer of {name:?}");
        return Ok(None);
    };
    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            log::warn!("File {name} not available: {err}");
            return Ok(None);
        }
    };
    if !file.metadata().await?.is_file() {
        log::warn!("Refusing transfer of non-file {name:?}");
        return Ok(None);
    }

    let mut chunk = vec![0u8; chunk_size];
    let mut sent = 0u64;
    loop {
        let read = file.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        stream.write_all(&chunk[..read]).await?;
        sent += read as u64;
    }
    stream.shutdown().await?;
    Ok(Some((name.to_owned(), sent)))
}

/// Fetches `filename` from the peer at `endpoint` into `dest`, reading until
/// the peer closes. Returns the number of bytes received.
///
/// A connection error removes the partial file. A publisher that closes
/// without sending anything yields an empty file.
pub async fn download(
    endpoint: SocketAddr,
    filename: &str,
    dest: &Path,
) -> Result<u64> {
    let mut stream = TcpStream::connect(endpoint).await?;
    stream.write_all(filename.as_bytes()).await?;

    let mut file = File::create(dest).await?;
    let copied = async {
        let received = io::copy(&mut stream, &mut file).await?;
        file.flush().await?;
        Ok::<u64, io::Error>(received)
    }
    .await;

    match copied {
        Ok(received) => {
            log::debug!("Received {received} bytes of {filename}");
            Ok(received)
        }
        Err(err) => {
            drop(file);
            if let Err(cleanup) = fs::remove_file(dest).await {
                log::warn!("Could not remove {}: {cleanup}", dest.display());
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_directory_refuses_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedDirectory::new(dir.path());

        assert_eq!(shared.resolve("a.txt"), Some(dir.path().join("a.txt")));
        assert!(shared.resolve("../a.txt").is_none());
        assert!(shared.resolve("..").is_none());
        assert!(shared.resolve("").is_none());
    }

    #[test]
    fn contains_only_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"data").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let shared = SharedDirectory::new(dir.path());

        assert!(shared.contains("a.txt"));
        assert!(!shared.contains("sub"));
        assert!(!shared.contains("b.txt"));
    }
}
