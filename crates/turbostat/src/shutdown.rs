use std::io::{self, Read};

use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
    StdinClosed,
}

/// Resolves once the process is asked to stop: Ctrl-C, SIGTERM, or (when
/// `watch_stdin` is set) the host closing our stdin.
pub async fn wait_for_shutdown(watch_stdin: bool) -> io::Result<ShutdownReason> {
    let stdin_closed = async move {
        if watch_stdin {
            stdin_closed().await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        res = wait_for_signal() => res,
        _ = stdin_closed => Ok(ShutdownReason::StdinClosed),
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<ShutdownReason> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|()| ShutdownReason::Interrupt),
        _ = term.recv() => Ok(ShutdownReason::Terminate),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<ShutdownReason> {
    tokio::signal::ctrl_c()
        .await
        .map(|()| ShutdownReason::Interrupt)
}

// A plain thread so a blocked read never holds up runtime shutdown.
async fn stdin_closed() {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        let _ = tx.send(());
    });
    let _ = rx.await;
}
