use ocula_core::{FilterState, Frame, FrameOutput, FrameProcessor, IrisSession, ProcessError, SessionOptions};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("frame rejected")]
    Process(#[from] ProcessError),
    #[error("failed to spawn session thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("session thread exited")]
    ChannelClosed,
}

/// Messages sent from the stream driver to the session thread.
enum EngineRequest {
    Process {
        frame: Frame,
        reply: oneshot::Sender<Result<Option<FrameOutput>, ProcessError>>,
    },
    Snapshot {
        reply: oneshot::Sender<FilterState>,
    },
}

/// Clone-safe handle to a session thread.
///
/// The session lives as long as any handle does; dropping the last one
/// ends the session and discards its filter state.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    session_id: Uuid,
}

impl EngineHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run one frame through the session.
    pub async fn process(&self, frame: Frame) -> Result<Option<FrameOutput>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Process {
                frame,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        let result = reply_rx.await.map_err(|_| EngineError::ChannelClosed)?;
        Ok(result?)
    }

    /// Copy of the session's current filter state.
    pub async fn snapshot(&self) -> Result<FilterState, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn a session on a dedicated OS thread.
///
/// The thread owns the [`IrisSession`] outright, so frames are processed one
/// at a time in the order they are sent.
pub fn spawn_engine(options: SessionOptions, channel_capacity: usize) -> Result<EngineHandle, EngineError> {
    let session_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(channel_capacity.max(1));
    let mut session = IrisSession::new(options);

    std::thread::Builder::new()
        .name("ocula-session".into())
        .spawn(move || {
            let span = tracing::info_span!("session", id = %session_id);
            let _enter = span.enter();
            tracing::info!("session started");

            let mut frames = 0u64;
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Process { frame, reply } => {
                        frames += 1;
                        let result = session.process(&frame);
                        if let Err(e) = &result {
                            tracing::error!(error = %e, ts = frame.timestamp_us, "frame rejected");
                        }
                        let _ = reply.send(result);
                    }
                    EngineRequest::Snapshot { reply } => {
                        let _ = reply.send(session.state().clone());
                    }
                }
            }
            tracing::info!(
                frames,
                warnings = session.state().warnings.total(),
                "session ended"
            );
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx, session_id })
}
