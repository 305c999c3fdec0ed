//! In-process RESP server for pool and sentinel tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

pub enum Reply {
    Send(String),
    /// Answer, then hang up on the client.
    SendAndClose(String),
}

type Responder = dyn Fn(usize, &[String]) -> Reply + Send + Sync;

pub struct StubServer {
    address: String,
    accepted: Arc<AtomicUsize>,
}

impl StubServer {
    /// Serves every accepted socket with `respond(connection_index, command)`.
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(usize, &[String]) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let accepted = Arc::new(AtomicUsize::new(0));
        let respond: Arc<Responder> = Arc::new(respond);

        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let index = counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(socket, index, Arc::clone(&respond)));
            }
        });

        Self { address, accepted }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> &str {
        self.address.rsplit_once(':').map_or("", |(_, port)| port)
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

pub fn is(command: &[String], name: &str) -> bool {
    command
        .first()
        .is_some_and(|c| c.eq_ignore_ascii_case(name))
}

pub fn ok() -> Reply {
    Reply::Send(simple("OK"))
}

pub fn simple(value: &str) -> String {
    format!("+{value}\r\n")
}

pub fn bulk_array(items: &[&str]) -> String {
    let mut out = format!("*{}\r\n", items.len());
    for item in items {
        out.push_str(&format!("${}\r\n{item}\r\n", item.len()));
    }
    out
}

async fn serve(socket: TcpStream, index: usize, respond: Arc<Responder>) {
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);

    while let Some(command) = read_command(&mut reader).await {
        let (reply, close) = match respond(index, &command) {
            Reply::Send(reply) => (reply, false),
            Reply::SendAndClose(reply) => (reply, true),
        };
        if write.write_all(reply.as_bytes()).await.is_err() || close {
            return;
        }
    }
}

async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Vec<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Some(args)
}
